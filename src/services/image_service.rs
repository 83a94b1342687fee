use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::UploadSettings;
use crate::utils::{AppError, AppResult};

/// Largest accepted upload (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public path prefix the stored images are served under.
pub const IMAGE_ROUTE: &str = "/api/v1/images/products";

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StoredImage {
    /// Absolute URL to store in a product's `image_url`
    pub url: String,
    pub filename: String,
}

/// Extension for an accepted image content type. JPG, PNG and WebP only.
pub fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    match content_type?.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}

/// Names we generate are a UUID plus extension; anything else never reaches the filesystem.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

pub fn image_url(server_url: &str, filename: &str) -> String {
    format!("{}{}/{}", server_url, IMAGE_ROUTE, filename)
}

/// Appends an upload chunk, refusing to grow past `MAX_IMAGE_BYTES`.
pub fn push_chunk(buffer: &mut Vec<u8>, chunk: &[u8]) -> AppResult<()> {
    if buffer.len() + chunk.len() > MAX_IMAGE_BYTES {
        return Err(AppError::InvalidRequest("Image is too large, maximum 5MB".to_string()));
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

/// Writes the image under a fresh UUID name, creating the directory on first use.
pub async fn store_image(settings: &UploadSettings, extension: &str, bytes: &[u8]) -> AppResult<StoredImage> {
    if bytes.is_empty() {
        return Err(AppError::InvalidRequest("Image file is empty".to_string()));
    }

    tokio::fs::create_dir_all(&settings.dir)
        .await
        .map_err(|e| AppError::Internal(format!("Cannot create upload directory: {}", e)))?;

    let filename = format!("{}{}", Uuid::new_v4(), extension);
    tokio::fs::write(settings.dir.join(&filename), bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Cannot save image: {}", e)))?;

    log::info!("🖼️ Stored product image {} ({} bytes)", filename, bytes.len());
    Ok(StoredImage {
        url: image_url(&settings.server_url, &filename),
        filename,
    })
}

pub fn image_path(settings: &UploadSettings, filename: &str) -> AppResult<PathBuf> {
    if !is_safe_filename(filename) {
        return Err(AppError::NotFound(format!("Image {} not found", filename)));
    }
    Ok(settings.dir.join(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_support;

    fn settings() -> UploadSettings {
        UploadSettings {
            dir: std::env::temp_dir().join(test_support::unique("shop-images")),
            server_url: "http://localhost:8080".to_string(),
        }
    }

    #[test]
    fn test_only_jpg_png_and_webp_are_accepted() {
        assert_eq!(extension_for(Some("image/jpeg")), Some(".jpg"));
        assert_eq!(extension_for(Some("image/jpg")), Some(".jpg"));
        assert_eq!(extension_for(Some("IMAGE/PNG")), Some(".png"));
        assert_eq!(extension_for(Some("image/webp")), Some(".webp"));
        assert_eq!(extension_for(Some("image/gif")), None);
        assert_eq!(extension_for(Some("text/html")), None);
        assert_eq!(extension_for(None), None);
    }

    #[test]
    fn test_filename_safety() {
        assert!(is_safe_filename("0b6f3c5e-2d7a-4bde-9f50-1f0d4b0c9a11.png"));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename(".env"));
        assert!(!is_safe_filename("../secret.png"));
        assert!(!is_safe_filename("a/b.png"));
        assert!(!is_safe_filename("a\\b.png"));
        assert!(!is_safe_filename("a..png"));
    }

    #[test]
    fn test_size_limit() {
        let mut buffer = vec![0u8; MAX_IMAGE_BYTES - 10];
        push_chunk(&mut buffer, &[1u8; 10]).unwrap();
        assert_eq!(buffer.len(), MAX_IMAGE_BYTES);

        let err = push_chunk(&mut buffer, &[1u8]).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(buffer.len(), MAX_IMAGE_BYTES);
    }

    #[test]
    fn test_unsafe_name_is_not_found() {
        assert!(matches!(image_path(&settings(), "../Cargo.toml"), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_image_writes_under_uuid_name() {
        let settings = settings();
        let stored = store_image(&settings, ".png", b"\x89PNG fake").await.unwrap();

        assert!(stored.filename.ends_with(".png"));
        assert!(Uuid::parse_str(stored.filename.trim_end_matches(".png")).is_ok());
        assert_eq!(
            stored.url,
            format!("http://localhost:8080/api/v1/images/products/{}", stored.filename)
        );

        let written = tokio::fs::read(image_path(&settings, &stored.filename).unwrap()).await.unwrap();
        assert_eq!(written, b"\x89PNG fake");

        let _ = tokio::fs::remove_dir_all(&settings.dir).await;
    }

    #[tokio::test]
    async fn test_empty_image_is_rejected() {
        let settings = settings();
        let err = store_image(&settings, ".png", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(!settings.dir.exists());
    }
}
