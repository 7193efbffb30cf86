//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "marketplace-gateway",
        description = "Admin authorization and advertisement interaction analytics"
    ),
    paths(
        handlers::admin::admin_status,
        handlers::admin::list_entities,
        handlers::admin::stats,
        handlers::entity::create_entity,
        handlers::entity::get_entity,
        handlers::tracking::record_interaction,
        handlers::tracking::analytics,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Admin", description = "Admin status and dashboard data"),
        (name = "Entities", description = "Advertisements"),
        (name = "Tracking", description = "Click/view recording and analytics"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{EventBus, UserRecord, UserRole};
    use crate::identity::HeaderIdentity;
    use crate::persistence::memory::InMemoryStore;

    fn test_app() -> Router {
        let store = Arc::new(InMemoryStore::with_users([
            UserRecord::new("admin-1", UserRole::Admin),
            UserRecord::new("seller-1", UserRole::Customer),
            UserRecord::new("customer-1", UserRole::Customer),
        ]));
        let state = AppState::new(
            Arc::clone(&store) as Arc<dyn crate::persistence::UserStore>,
            store,
            Arc::new(HeaderIdentity::default()),
            Duration::minutes(5),
            EventBus::new(64),
        );
        build_router().with_state(state)
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("valid request");
        };
        request
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        let Ok(response) = app.clone().oneshot(req).await else {
            panic!("router is infallible");
        };
        response
    }

    async fn json_body(response: Response) -> Value {
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body readable");
        };
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }

    async fn create_listing(app: &Router, owner: &str) -> String {
        let response = send(
            app,
            request(
                "POST",
                "/api/v1/entities",
                Some(owner),
                Some(serde_json::json!({"title": "Blue coupe", "category": "cars"})),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let Some(id) = body.get("id").and_then(Value::as_str) else {
            panic!("missing id in {body}");
        };
        id.to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = test_app();
        let response = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_status_requires_identity() {
        let app = test_app();
        let response = send(&app, request("GET", "/api/v1/admin/status", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_status_reports_role() {
        let app = test_app();
        let response = send(
            &app,
            request("GET", "/api/v1/admin/status", Some("admin-1"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.get("is_admin"), Some(&Value::Bool(true)));

        let response = send(
            &app,
            request("GET", "/api/v1/admin/status?refresh=true", Some("customer-1"), None),
        )
        .await;
        let body = json_body(response).await;
        assert_eq!(body.get("is_admin"), Some(&Value::Bool(false)));
        assert!(body.get("user_details").is_some_and(|d| !d.is_null()));
    }

    #[tokio::test]
    async fn admin_status_within_ttl_reads_store_once() {
        use std::sync::atomic::Ordering;

        use crate::service::role_cache::tests::CountingUserStore;

        let users = Arc::new(CountingUserStore::with_users([UserRecord::new(
            "admin-1",
            UserRole::Admin,
        )]));
        let state = AppState::new(
            Arc::clone(&users) as Arc<dyn crate::persistence::UserStore>,
            Arc::new(InMemoryStore::new()),
            Arc::new(HeaderIdentity::default()),
            Duration::minutes(5),
            EventBus::new(16),
        );
        let app = build_router().with_state(state);

        for _ in 0..3 {
            let response = send(
                &app,
                request("GET", "/api/v1/admin/status", Some("admin-1"), None),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(users.calls(), 1);

        users.offline.store(true, Ordering::SeqCst);
        let response = send(
            &app,
            request("GET", "/api/v1/admin/status", Some("admin-1"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.get("is_admin"), Some(&Value::Bool(true)));
        let role = body
            .get("user_details")
            .and_then(|d| d.get("role"))
            .cloned();
        assert_eq!(role, Some(Value::from("admin")));
        assert_eq!(users.calls(), 1);
    }

    #[tokio::test]
    async fn admin_endpoints_forbid_customers() {
        let app = test_app();
        let response = send(
            &app,
            request("GET", "/api/v1/admin/stats", Some("customer-1"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, request("GET", "/api/v1/admin/entities", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn record_interactions_and_read_analytics() {
        let app = test_app();
        let id = create_listing(&app, "seller-1").await;
        let uri = format!("/api/v1/entities/{id}/interactions");

        for (expected, user) in [(1, None), (2, Some("u1")), (3, None)] {
            let response = send(
                &app,
                request("POST", &uri, user, Some(serde_json::json!({"kind": "click"}))),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert_eq!(body.get("updated_count"), Some(&Value::from(expected)));
        }

        let analytics_uri = format!("/api/v1/entities/{id}/analytics");
        let response = send(&app, request("GET", &analytics_uri, Some("seller-1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.get("click_count"), Some(&Value::from(3)));
        assert_eq!(body.get("view_count"), Some(&Value::from(0)));
        let buckets = body
            .get("clicks_over_time")
            .and_then(Value::as_array)
            .map(Vec::len);
        assert_eq!(buckets, Some(1));
    }

    #[tokio::test]
    async fn analytics_is_owner_or_admin_only() {
        let app = test_app();
        let id = create_listing(&app, "seller-1").await;
        let uri = format!("/api/v1/entities/{id}/analytics");

        let response = send(&app, request("GET", &uri, Some("customer-1"), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, request("GET", &uri, Some("admin-1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_kind_is_bad_request() {
        let app = test_app();
        let id = create_listing(&app, "seller-1").await;
        let response = send(
            &app,
            request(
                "POST",
                &format!("/api/v1/entities/{id}/interactions"),
                None,
                Some(serde_json::json!({"kind": "share"})),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn interaction_on_unknown_entity_is_not_found() {
        let app = test_app();
        let uri = format!("/api/v1/entities/{}/interactions", uuid::Uuid::new_v4());
        let response = send(
            &app,
            request("POST", &uri, None, Some(serde_json::json!({"kind": "view"}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_listing_paginates() {
        let app = test_app();
        for _ in 0..3 {
            let _ = create_listing(&app, "seller-1").await;
        }
        let response = send(
            &app,
            request(
                "GET",
                "/api/v1/admin/entities?page=2&per_page=2",
                Some("admin-1"),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let data_len = body.get("data").and_then(Value::as_array).map(Vec::len);
        assert_eq!(data_len, Some(1));
        let total = body.get("pagination").and_then(|p| p.get("total")).cloned();
        assert_eq!(total, Some(Value::from(3)));
    }

    #[test]
    fn openapi_lists_tracking_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/entities/{id}/interactions"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/status"));
    }
}
