use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound for `JWT_EXPIRATION_HOURS` (one year).
pub const MAX_TOKEN_HOURS: i64 = 8760;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// JWT signing settings shared by the auth service and middleware.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_hours: i64,
}

/// Pricing rules applied at checkout.
#[derive(Debug, Clone)]
pub struct PricingSettings {
    pub shipping_cost: Decimal,
    pub tax_rate: Decimal,
}

/// Where product images are stored and the public base URL used to link them.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub server_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtSettings,
    pub bcrypt_cost: u32,
    pub pricing: PricingSettings,
    pub payment_approval_rate: f64,
    pub uploads: UploadSettings,
    pub admin_email: String,
    pub admin_password: String,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                log::warn!("⚠️  JWT_SECRET not set, using development secret");
                "dev-secret-change-me".to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let approval_rate: f64 = parse_or(&lookup, "PAYMENT_APPROVAL_RATE", 0.8)?;
        if !approval_rate.is_finite() {
            return Err(ConfigError::Invalid {
                key: "PAYMENT_APPROVAL_RATE",
                value: approval_rate.to_string(),
            });
        }

        let expiration_hours: i64 = parse_or(&lookup, "JWT_EXPIRATION_HOURS", 24)?;
        if !(1..=MAX_TOKEN_HOURS).contains(&expiration_hours) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRATION_HOURS",
                value: expiration_hours.to_string(),
            });
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            jwt: JwtSettings {
                secret: jwt_secret,
                issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "shop-service".to_string()),
                audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "shop-api".to_string()),
                expiration_hours,
            },
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            pricing: PricingSettings {
                shipping_cost: parse_or(&lookup, "SHIPPING_COST", Decimal::new(600000, 2))?,
                tax_rate: parse_or(&lookup, "TAX_RATE", Decimal::ZERO)?,
            },
            payment_approval_rate: approval_rate.clamp(0.0, 1.0),
            uploads: UploadSettings {
                dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads/products".to_string())),
                server_url: lookup("SERVER_URL")
                    .unwrap_or_else(|| "http://localhost:8080".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            admin_email: lookup("ADMIN_EMAIL").unwrap_or_else(|| "admin@connectshop.com".to_string()),
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or_else(|| "adminpass123".to_string()),
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
