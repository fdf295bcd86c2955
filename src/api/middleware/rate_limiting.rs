use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::application::rate_limiter::RateLimiter;
use crate::domain::value_objects::ClientIdentity;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity of the caller: first `X-Forwarded-For` hop, else the peer address
pub fn client_identity(request: &Request) -> ClientIdentity {
    let forwarded = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    ClientIdentity::from_origin(forwarded, peer)
}

/// Admission check in front of the write routes
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identity(&request);

    match limiter.admit(&client).await {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BucketDecision, ManualClock, MockBucketStore};
    use crate::application::rate_limiter::ThrottlePolicy;
    use crate::domain::entities::{Admission, RateBucket, ThrottleLimits};
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::post, Router};
    use tower::ServiceExt;

    fn decision(admission: Admission) -> BucketDecision {
        BucketDecision {
            admission,
            bucket: RateBucket::fresh(&ThrottleLimits::default(), 0.0),
        }
    }

    fn app(store: MockBucketStore) -> Router {
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(store),
            ThrottlePolicy::Enforced(ThrottleLimits::default()),
            Arc::new(ManualClock::default()),
        ));

        Router::new()
            .route("/write", post(|| async { "ok" }))
            .route_layer(from_fn_with_state(limiter, rate_limit_middleware))
    }

    fn post_from(addr: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/write")
            .header(FORWARDED_FOR, addr)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_identity_prefers_forwarded_header() {
        let mut request = post_from("203.0.113.7, 10.0.0.1");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let expected = ClientIdentity::from_origin(Some("203.0.113.7"), None);
        assert_eq!(client_identity(&request).hashed(), expected.hashed());
    }

    #[test]
    fn test_identity_falls_back_to_peer() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        let peer = SocketAddr::from(([192, 0, 2, 1], 5000));
        request.extensions_mut().insert(ConnectInfo(peer));

        let expected = ClientIdentity::from_origin(None, Some(peer.ip()));
        assert_eq!(client_identity(&request).hashed(), expected.hashed());
    }

    #[tokio::test]
    async fn test_admitted_request_reaches_handler() {
        let mut store = MockBucketStore::new();
        store
            .expect_check()
            .times(1)
            .returning(|_, _, _| Ok(decision(Admission::Admitted)));

        let response = app(store).oneshot(post_from("198.51.100.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_denied_request_gets_429() {
        let mut store = MockBucketStore::new();
        store
            .expect_check()
            .times(1)
            .returning(|_, _, _| Ok(decision(Admission::Denied)));

        let response = app(store).oneshot(post_from("198.51.100.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "10");
    }
}
