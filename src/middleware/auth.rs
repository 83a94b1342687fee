use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::ops::Deref;
use std::rc::Rc;

use crate::config::AppConfig;
use crate::database::Database;
use crate::services::auth_service::{self, Claims};
use crate::utils::{AppError, AppResult};

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))
}

fn verify_headers(headers: &HeaderMap, config: Option<&web::Data<AppConfig>>) -> AppResult<Claims> {
    let token = bearer_token(headers)?;
    let config = config.ok_or_else(|| AppError::Internal("JWT settings not configured".to_string()))?;
    auth_service::verify_token(&config.jwt, token)
}

/// Verifies the signature, then checks the account is still active and loads its current roles.
async fn authenticate(verified: AppResult<Claims>, db: Option<web::Data<Database>>) -> AppResult<Claims> {
    let claims = verified?;
    let db = db.ok_or_else(|| AppError::Internal("Database not configured".to_string()))?;
    auth_service::refresh_claims(&db, claims).await
}

/// Claims set by `AuthMiddleware`, or authenticated here when the route is not wrapped.
fn claims_for(req: &HttpRequest) -> LocalBoxFuture<'static, AppResult<Claims>> {
    if let Some(claims) = req.extensions().get::<Claims>().cloned() {
        return Box::pin(ready(Ok(claims)));
    }
    let verified = verify_headers(req.headers(), req.app_data::<web::Data<AppConfig>>());
    let db = req.app_data::<web::Data<Database>>().cloned();
    Box::pin(authenticate(verified, db))
}

/// Rejects requests without a valid bearer token for an active account and
/// stores the refreshed `Claims` in the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verified = verify_headers(req.headers(), req.app_data::<web::Data<AppConfig>>());
        let db = req.app_data::<web::Data<Database>>().cloned();

        Box::pin(async move {
            match authenticate(verified, db).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    log::warn!("🔒 {} {} rejected: {}", req.method(), req.path(), e);
                    let res = e.error_response().map_into_right_body();
                    Ok(req.into_response(res))
                }
            }
        })
    }
}

/// Any caller holding a valid token for an active account.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub claims: Claims,
}

impl Deref for AuthenticatedUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.claims
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = claims_for(req);
        Box::pin(async move {
            let claims = claims.await?;
            Ok(AuthenticatedUser {
                user_id: claims.user_id()?,
                claims,
            })
        })
    }
}

/// Caller whose account currently holds the `ADMIN` role. Other authenticated callers get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl Deref for AdminUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = claims_for(req);
        let route = format!("{} {}", req.method(), req.path());
        Box::pin(async move {
            let claims = claims.await?;
            if claims.is_admin() {
                Ok(AdminUser(claims))
            } else {
                log::warn!("⛔ {} denied for user {}", route, claims.sub);
                Err(AppError::Forbidden("Administrator role required".to_string()))
            }
        })
    }
}
