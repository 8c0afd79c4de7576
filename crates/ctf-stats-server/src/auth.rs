//! Bearer-token auth middleware guarding every `/api` route, ported from
//! `dashboard/app.py`'s `AuthMiddleware.dispatch` (`dashboard/app.py:84`).

use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    HttpResponse,
};
use sha2::{Digest, Sha256};

use ctf_stats_logic::config::Config;

fn verify_token(token: &str, expected_hash: &str) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let actual_hash = hex::encode(hasher.finalize());
    actual_hash.eq_ignore_ascii_case(expected_hash)
}

pub struct BearerAuth {
    pub config: std::sync::Arc<Config>,
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = BearerAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    config: std::sync::Arc<Config>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let Some(auth_header) = auth_header else {
                return Ok(req.into_response(
                    HttpResponse::Unauthorized()
                        .json(serde_json::json!({"detail": "Missing Authorization header"}))
                        .map_into_right_body(),
                ));
            };

            let Some(token) = auth_header.strip_prefix("Bearer ") else {
                return Ok(req.into_response(
                    HttpResponse::Unauthorized()
                        .json(serde_json::json!({"detail": "Invalid authorization header format"}))
                        .map_into_right_body(),
                ));
            };

            let expected_hash = config.current().api_token_hash.clone();
            let Some(expected_hash) = expected_hash else {
                return Ok(req.into_response(
                    HttpResponse::InternalServerError()
                        .json(serde_json::json!({"detail": "API token not configured"}))
                        .map_into_right_body(),
                ));
            };

            if !verify_token(token, &expected_hash) {
                return Ok(req.into_response(
                    HttpResponse::Unauthorized()
                        .json(serde_json::json!({"detail": "Invalid API token"}))
                        .map_into_right_body(),
                ));
            }

            service.call(req).await.map(|res| res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_sha256_hash() {
        let mut hasher = Sha256::new();
        hasher.update(b"secret-token");
        let hash = hex::encode(hasher.finalize());
        assert!(verify_token("secret-token", &hash));
        assert!(!verify_token("wrong-token", &hash));
    }
}
