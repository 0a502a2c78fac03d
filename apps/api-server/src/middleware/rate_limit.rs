//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::LocalBoxFuture;
use quill_shared::ErrorResponse;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use quill_core::ports::RateLimiter;

/// Per-client rate limiting, keyed by the peer IP address.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        // Peer address only; forwarded headers are client-controlled.
        let key = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    // Round up so clients never retry early.
                    let retry_after = result.reset_after.as_secs_f64().ceil().max(1.0) as u64;
                    tracing::warn!(client = %key, retry_after, "Rate limit exceeded");

                    let error = ErrorResponse::new(429, "Too Many Requests").with_detail(format!(
                        "Rate limit exceeded. Try again in {retry_after} seconds."
                    ));

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_after.to_string()))
                        .json(error);

                    return Ok(req.into_response(response).map_into_right_body());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};
    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};
    use std::time::Duration;

    #[actix_rt::test]
    async fn test_rejects_with_retry_after() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        })
        .unwrap();

        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(Arc::new(limiter)))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let peer = "10.1.2.3:4000".parse().unwrap();

        let first = test::call_service(&app, test::TestRequest::get().peer_addr(peer).to_request())
            .await;
        assert_eq!(first.status(), StatusCode::OK);

        let second =
            test::call_service(&app, test::TestRequest::get().peer_addr(peer).to_request()).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));
    }
}
