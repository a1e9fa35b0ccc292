use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use super::auth::bearer_token;
use crate::models::ApiKeyOwner;
use crate::services::api_key_service;
use crate::state::AppState;
use crate::utils::AppError;

/// Guards `/ai/*`: requires `Authorization: Bearer <key_id>.<secret>` and
/// inserts the `ApiKeyOwner` into request extensions.
pub struct ApiKeyMiddleware;

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
}

async fn authorize(req: &ServiceRequest) -> Result<ApiKeyOwner, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state missing".to_string()))?;

    let presented = bearer_token(req.request())
        .ok_or_else(|| AppError::Unauthorized("Missing API key".to_string()))?;

    api_key_service::authenticate(state.store()?, &presented).await
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
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

        Box::pin(async move {
            match authorize(&req).await {
                Ok(owner) => {
                    log::debug!("🤖 API key {} accepted for {}", owner.key_id, owner.email);
                    req.extensions_mut().insert(owner);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(e) => {
                    log::warn!("🔒 API key rejected on {}: {}", req.path(), e);
                    Ok(req.into_response(e.error_response()).map_into_right_body())
                }
            }
        })
    }
}
