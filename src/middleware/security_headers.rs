use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
    Error,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::api::metrics;

/// Adds `nosniff` / `DENY` headers and feeds the request and error counters.
///
/// Inner middleware renders its own rejections (see `AuthMiddleware`), so every
/// response that reaches this layer is a `ServiceResponse`.
pub struct SecurityHeaders;

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware { service }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        metrics::increment_request_count();
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = match fut.await {
                Ok(res) => res,
                Err(err) => {
                    if err.as_response_error().status_code().is_server_error() {
                        metrics::increment_error_count();
                    }
                    return Err(err);
                }
            };

            if res.status().is_server_error() {
                metrics::increment_error_count();
            }

            let headers = res.headers_mut();
            headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    use crate::middleware::AuthMiddleware;
    use crate::test_support;
    use crate::utils::AppError;

    #[actix_web::test]
    async fn test_headers_are_added() {
        let app = test::init_service(
            App::new()
                .wrap(SecurityHeaders)
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(res.headers().get(X_FRAME_OPTIONS).unwrap(), "DENY");
    }

    #[actix_web::test]
    async fn test_server_errors_are_counted() {
        let app = test::init_service(App::new().wrap(SecurityHeaders).route(
            "/boom",
            web::get().to(|| async { Err::<HttpResponse, _>(AppError::Internal("boom".into())) }),
        ))
        .await;

        let before = metrics::MetricsResponse::snapshot();
        let res = test::call_service(&app, test::TestRequest::get().uri("/boom").to_request()).await;
        let after = metrics::MetricsResponse::snapshot();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(after.http_errors_total > before.http_errors_total);
        assert!(after.http_requests_total > before.http_requests_total);
    }

    #[actix_web::test]
    async fn test_auth_rejections_carry_headers() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::config()))
                .wrap(SecurityHeaders)
                .service(
                    web::scope("/private")
                        .wrap(AuthMiddleware)
                        .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/private/ping").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(res.headers().get(X_FRAME_OPTIONS).unwrap(), "DENY");
    }
}
