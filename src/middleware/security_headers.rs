use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

/// Sent on every response. The opener policy lets the Google Sign-In popup
/// post its credential back to the page that opened it.
const STATIC_HEADERS: [(&str, &str); 3] = [
    ("cross-origin-opener-policy", "same-origin-allow-popups"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
];

/// Responses under this prefix carry account data and must not be cached
const API_PREFIX: &str = "/api/v1";

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
        let no_store = req.path().starts_with(API_PREFIX);
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();

            for (name, value) in STATIC_HEADERS {
                headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
            }
            if no_store {
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_api_responses_are_not_cached() {
        let app = test::init_service(
            App::new()
                .wrap(SecurityHeaders)
                .route("/health", web::get().to(HttpResponse::Ok))
                .route("/api/v1/load", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let health = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(health.headers().get("x-content-type-options").unwrap(), "nosniff");
        assert!(health.headers().get(header::CACHE_CONTROL).is_none());

        let load = test::call_service(&app, test::TestRequest::get().uri("/api/v1/load").to_request()).await;
        assert_eq!(load.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(
            load.headers().get("cross-origin-opener-policy").unwrap(),
            "same-origin-allow-popups"
        );
    }
}
