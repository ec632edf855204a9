use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::callbacks::expiry_callbacks::ExpiryNotifier;
use crate::config::HealthConfig;
use crate::db::repositories::DBPool;
use crate::handlers::commits::{assign_commit, create_commit, list_commits, move_commit};
use crate::handlers::join_requests::{
    approve_request, list_pending_requests, reject_request, submit_request,
};
use crate::handlers::notifications::send_expiry_notifications;
use crate::handlers::project_health::get_project_health;
use crate::handlers::projects::{
    create_project, delete_project, get_project, list_projects, remove_member, update_project,
};
use crate::handlers::subscriptions::{activate_subscription, check_subscription};

// Define the application state struct
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DBPool>,
    pub health: HealthConfig,
    pub notifier: Arc<dyn ExpiryNotifier>,
}

async fn liveness() -> &'static str {
    "ok"
}

// Function to create the Axum router
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v0/health", get(liveness))
        .route("/v0/projects", get(list_projects).post(create_project))
        .route(
            "/v0/projects/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/v0/projects/:project_id/members/:user_id",
            delete(remove_member),
        )
        .route("/v0/projects/:project_id/health", get(get_project_health))
        .route(
            "/v0/projects/:project_id/commits",
            get(list_commits).post(create_commit),
        )
        .route("/v0/commits/:commit_id/status", patch(move_commit))
        .route("/v0/commits/:commit_id/assignee", patch(assign_commit))
        .route(
            "/v0/projects/:project_id/join-requests",
            get(list_pending_requests).post(submit_request),
        )
        .route("/v0/join-requests/:request_id/approve", post(approve_request))
        .route("/v0/join-requests/:request_id/reject", post(reject_request))
        .route("/v0/check-subscription", post(check_subscription))
        .route("/v0/users/:user_id/subscription", post(activate_subscription))
        .route("/v0/expiry-notifications", get(send_expiry_notifications))
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::expiry_callbacks::LogNotifier;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use diesel::pg::PgConnection;
    use diesel::r2d2::{ConnectionManager, Pool};
    use tower::ServiceExt;

    /// A router whose pool never connects; only requests rejected before
    /// touching the database may be sent to it.
    fn offline_router() -> Router {
        let manager = ConnectionManager::<PgConnection>::new("postgres://localhost/unused");
        let pool = Pool::builder().build_unchecked(manager);
        create_router(AppState {
            pool: Arc::new(pool),
            health: HealthConfig::default(),
            notifier: Arc::new(LogNotifier),
        })
    }

    fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        offline_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn liveness_responds_ok() {
        let request = Request::builder().uri("/v0/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn check_subscription_requires_user_id() {
        let status = status_of(json_request(Method::POST, "/v0/check-subscription", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let status = status_of(json_request(
            Method::POST,
            "/v0/check-subscription",
            r#"{"user_id": "  ", "feature_type": "basic"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn check_subscription_rejects_malformed_user_id() {
        let status = status_of(json_request(
            Method::POST,
            "/v0/check-subscription",
            r#"{"user_id": "not-a-uuid", "feature_type": "workflow"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn project_routes_reject_malformed_ids() {
        let request = Request::builder()
            .uri("/v0/projects/not-a-uuid/health")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_project_requires_title() {
        let body = format!(
            r#"{{"creator_id": "{}", "title": "   "}}"#,
            uuid::Uuid::new_v4()
        );
        let status = status_of(json_request(Method::POST, "/v0/projects", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_project_rejects_unknown_visibility() {
        let body = format!(
            r#"{{"creator_id": "{}", "title": "Compiler", "visibility": "hidden"}}"#,
            uuid::Uuid::new_v4()
        );
        let status = status_of(json_request(Method::POST, "/v0/projects", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn board_move_rejects_unknown_status() {
        let uri = format!("/v0/commits/{}/status", uuid::Uuid::new_v4());
        let status = status_of(json_request(Method::PATCH, &uri, r#"{"status": "archived"}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn activation_requires_plan_name() {
        let uri = format!("/v0/users/{}/subscription", uuid::Uuid::new_v4());
        let status = status_of(json_request(
            Method::POST,
            &uri,
            r#"{"plan_name": "", "interval": "month"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn commit_creation_requires_message() {
        let uri = format!("/v0/projects/{}/commits", uuid::Uuid::new_v4());
        let status = status_of(json_request(Method::POST, &uri, r#"{"message": ""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn project_edit_requires_title() {
        let uri = format!("/v0/projects/{}?caller={}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
        let status = status_of(json_request(Method::PUT, &uri, r#"{"title": " "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn project_edit_rejects_unknown_visibility() {
        let uri = format!("/v0/projects/{}", uuid::Uuid::new_v4());
        let status = status_of(json_request(
            Method::PUT,
            &uri,
            r#"{"title": "Tokenizer", "visibility": "hidden"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_caller_is_rejected() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/v0/projects/{}?caller=nobody", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn member_removal_rejects_malformed_user_id() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/v0/projects/{}/members/not-a-uuid", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assignment_rejects_malformed_assignee() {
        let uri = format!("/v0/commits/{}/assignee", uuid::Uuid::new_v4());
        let status =
            status_of(json_request(Method::PATCH, &uri, r#"{"assigned_to": "someone"}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
