//! HTTP router.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the application router.
///
/// Everything except `/health` sits behind [`middleware::auth::auth_middleware`].
pub fn build_router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Funds
        .route("/api/v1/funds", get(handlers::funds::get_funds))
        .route("/api/v1/funds/payout", post(handlers::funds::payout))
        // IPO
        .route("/api/v1/ipo", get(handlers::ipo::list_ipos))
        .route(
            "/api/v1/ipo/orders",
            get(handlers::ipo::list_orders).post(handlers::ipo::place_bid),
        )
        .route(
            "/api/v1/ipo/orders/{application_no}",
            put(handlers::ipo::modify_bid).delete(handlers::ipo::cancel_bid),
        )
        // Profile
        .route("/api/v1/profile", get(handlers::profile::get_profile))
        .route(
            "/api/v1/profile/freeze/otp",
            post(handlers::profile::request_freeze_otp),
        )
        .route(
            "/api/v1/profile/freeze",
            get(handlers::profile::freeze_status).post(handlers::profile::freeze_account),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer internal-key")
            .header("X-Client-Id", "AB1234");
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let harness = Harness::new();
        let response = build_router(harness.state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["database"], "connected");
    }

    #[tokio::test]
    async fn health_reports_cache_outage() {
        let harness = Harness::new();
        harness.cache.fail();
        let response = build_router(harness.state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_or_wrong_key_is_401() {
        let harness = Harness::new();
        let app = build_router(harness.state);

        let no_key = app
            .clone()
            .oneshot(Request::get("/api/v1/funds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(no_key.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(no_key).await["error"]["code"], "unauthorized");

        let wrong_key = app
            .oneshot(
                Request::get("/api/v1/funds")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .header("X-Client-Id", "AB1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(wrong_key.status(), StatusCode::UNAUTHORIZED);
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_client_id_is_401() {
        let harness = Harness::new();
        let response = build_router(harness.state)
            .oneshot(
                Request::get("/api/v1/profile")
                    .header(header::AUTHORIZATION, "Bearer internal-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn funds_success_uses_client_header() {
        let harness = Harness::new();
        harness
            .transport
            .push_success(json!({ "client_id": "AB1234", "cash_available": 10 }));

        let response = build_router(harness.state)
            .oneshot(authed("GET", "/api/v1/funds", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Funds fetched successfully");
        assert_eq!(
            harness.transport.requests()[0].query[0],
            ("client_id", "AB1234".to_string())
        );
    }

    #[tokio::test]
    async fn vendor_error_is_passed_through() {
        let harness = Harness::new();
        harness.transport.push_json(
            422,
            json!({ "status": "error", "message": "Insufficient balance", "error_code": "PO_001" }),
        );

        let response = build_router(harness.state)
            .oneshot(authed(
                "POST",
                "/api/v1/funds/payout",
                Some(json!({ "amount": "100" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "PO_001");
        assert_eq!(body["error"]["message"], "Insufficient balance");
    }

    #[tokio::test]
    async fn transport_failure_is_generic_500() {
        let harness = Harness::new();
        harness.transport.push_timeout();

        let response = build_router(harness.state)
            .oneshot(authed("GET", "/api/v1/ipo/orders", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["message"],
            "Something went wrong, please try again later"
        );
    }

    #[tokio::test]
    async fn cancel_bid_routes_application_number() {
        let harness = Harness::new();
        harness
            .transport
            .push_success(json!({ "application_no": "APP-7", "status": "CANCELLED" }));

        let response = build_router(harness.state)
            .oneshot(authed("DELETE", "/api/v1/ipo/orders/APP-7", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            harness.transport.requests()[0]
                .query
                .contains(&("application_no", "APP-7".to_string()))
        );
    }

    #[tokio::test]
    async fn freeze_status_defaults_to_not_frozen() {
        let harness = Harness::new();
        let response = build_router(harness.state)
            .oneshot(authed("GET", "/api/v1/profile/freeze", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["frozen"], false);
    }
}
