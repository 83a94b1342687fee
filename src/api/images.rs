use actix_files::NamedFile;
use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpRequest, HttpResponse};
use futures::TryStreamExt;

use crate::api::fail;
use crate::config::AppConfig;
use crate::middleware::AdminUser;
use crate::services::image_service::{self, StoredImage};
use crate::utils::{AppError, AppResult};

fn invalid_body(e: MultipartError) -> AppError {
    AppError::InvalidRequest(format!("Invalid multipart body: {}", e))
}

/// Reads the `file` part, checking its type and size while streaming.
async fn read_image(mut payload: Multipart) -> AppResult<(&'static str, Vec<u8>)> {
    while let Some(mut field) = payload.try_next().await.map_err(invalid_body)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let extension = image_service::extension_for(content_type.as_deref()).ok_or_else(|| {
            AppError::InvalidRequest("Invalid file type, only JPG, PNG and WebP are allowed".to_string())
        })?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(invalid_body)? {
            image_service::push_chunk(&mut bytes, &chunk)?;
        }
        return Ok((extension, bytes));
    }

    Err(AppError::InvalidRequest("Missing 'file' field".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/v1/uploads/product-image",
    tag = "Products",
    request_body(content = String, content_type = "multipart/form-data", description = "Image in the `file` field (JPG, PNG or WebP, up to 5MB)"),
    responses(
        (status = 200, description = "Image stored, use `url` as the product's image_url", body = StoredImage),
        (status = 400, description = "Missing, empty, oversized or unsupported file"),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_product_image(config: web::Data<AppConfig>, admin: AdminUser, payload: Multipart) -> HttpResponse {
    log::info!("📤 POST /uploads/product-image - by user {}", admin.sub);

    let stored = match read_image(payload).await {
        Ok((extension, bytes)) => image_service::store_image(&config.uploads, extension, &bytes).await,
        Err(e) => Err(e),
    };

    match stored {
        Ok(image) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "url": image.url,
            "filename": image.filename
        })),
        Err(e) => fail("Upload product image", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/images/products/{filename}",
    tag = "Products",
    params(("filename" = String, Path, description = "Name returned by the upload")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn serve_product_image(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> HttpResponse {
    let filename = path.into_inner();

    let file = match image_service::image_path(&config.uploads, &filename) {
        Ok(path) => NamedFile::open_async(path)
            .await
            .map_err(|_| AppError::NotFound(format!("Image {} not found", filename))),
        Err(e) => Err(e),
    };

    match file {
        Ok(file) => file.into_response(&req),
        Err(e) => fail("Serve image", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};

    use crate::models::Role;
    use crate::test_support;

    const BOUNDARY: &str = "shop-boundary";

    fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"photo\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, field, content_type
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(uri: &str, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    async fn read_only(payload: Multipart) -> HttpResponse {
        match read_image(payload).await {
            Ok((extension, bytes)) => HttpResponse::Ok().body(format!("{}:{}", extension, bytes.len())),
            Err(e) => fail("Read image", e),
        }
    }

    fn config_with_dir() -> AppConfig {
        let mut config = test_support::config();
        config.uploads.dir = std::env::temp_dir().join(test_support::unique("shop-images"));
        config
    }

    #[actix_web::test]
    async fn test_reads_the_file_field() {
        let app = test::init_service(App::new().route("/read", web::post().to(read_only))).await;

        let req = multipart_request("/read", multipart_body("file", "image/webp", b"RIFFfakeWEBP")).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b".webp:12"));
    }

    #[actix_web::test]
    async fn test_rejects_unsupported_or_missing_files() {
        let app = test::init_service(App::new().route("/read", web::post().to(read_only))).await;

        let gif = multipart_request("/read", multipart_body("file", "image/gif", b"GIF89a")).to_request();
        assert_eq!(test::call_service(&app, gif).await.status(), StatusCode::BAD_REQUEST);

        let wrong_field = multipart_request("/read", multipart_body("photo", "image/png", b"png")).to_request();
        assert_eq!(test::call_service(&app, wrong_field).await.status(), StatusCode::BAD_REQUEST);

        let oversized = vec![0u8; image_service::MAX_IMAGE_BYTES + 1];
        let big = multipart_request("/read", multipart_body("file", "image/png", &oversized)).to_request();
        let res = test::call_service(&app, big).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_upload_requires_a_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config_with_dir()))
                .route("/upload", web::post().to(upload_product_image)),
        )
        .await;

        let req = multipart_request("/upload", multipart_body("file", "image/png", b"png")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_serves_stored_images_and_404s_the_rest() {
        let config = config_with_dir();
        let stored = image_service::store_image(&config.uploads, ".png", b"\x89PNG fake")
            .await
            .unwrap();
        let dir = config.uploads.dir.clone();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .route("/images/{filename}", web::get().to(serve_product_image)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/images/{}", stored.filename))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(test::read_body(res).await, web::Bytes::from_static(b"\x89PNG fake"));

        for uri in ["/images/missing.png", "/images/..%2FCargo.toml"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[actix_web::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_admin_upload_returns_a_servable_url() {
        let config = config_with_dir();
        let db = test_support::database().await;
        let admin = test_support::create_user(&db, Role::Admin).await;
        let customer = test_support::create_user(&db, Role::Customer).await;
        let admin_token =
            crate::services::auth_service::generate_jwt(&config.jwt, &admin, &["ADMIN".to_string()]).unwrap();
        let customer_token =
            crate::services::auth_service::generate_jwt(&config.jwt, &customer, &["CUSTOMER".to_string()]).unwrap();
        let dir = config.uploads.dir.clone();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(db))
                .route("/api/v1/uploads/product-image", web::post().to(upload_product_image))
                .route("/api/v1/images/products/{filename}", web::get().to(serve_product_image)),
        )
        .await;

        let req = multipart_request("/api/v1/uploads/product-image", multipart_body("file", "image/jpeg", b"jpeg"))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", customer_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = multipart_request("/api/v1/uploads/product-image", multipart_body("file", "image/jpeg", b"jpeg"))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", admin_token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.ends_with(".jpg"));
        assert_eq!(
            body["url"],
            format!("http://localhost:8080/api/v1/images/products/{}", filename)
        );

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/images/products/{}", filename))
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, web::Bytes::from_static(b"jpeg"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
