use axum::http::StatusCode;
use serde::Deserialize;
use tokio::task;
use tracing::error;
use uuid::Uuid;

use crate::db::models::project::{Project, Standing};
use crate::db::repositories::projects::ProjectRepository;
use crate::router::AppState;

pub mod commits;
pub mod join_requests;
pub mod notifications;
pub mod project_health;
pub mod projects;
pub mod subscriptions;

/// Error half of every handler result: a status code and a plain message.
pub type ApiError = (StatusCode, String);
pub type ApiResult<T> = Result<T, ApiError>;

/// Runs synchronous repository work on the blocking pool and maps failures
/// onto 500 responses.
pub(crate) async fn run_blocking<T, F>(what: &'static str, work: F) -> ApiResult<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(db_err)) => {
            error!("Database error {}: {:#}", what, db_err);
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", db_err)))
        }
        Err(join_err) => {
            error!("Task join error {}: {}", what, join_err);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to execute database query".to_string()))
        }
    }
}

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message.into())
}

pub(crate) fn not_found(message: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, message.into())
}

pub(crate) fn forbidden(message: impl Into<String>) -> ApiError {
    (StatusCode::FORBIDDEN, message.into())
}

pub(crate) fn conflict(message: impl Into<String>) -> ApiError {
    (StatusCode::CONFLICT, message.into())
}

/// The user a request is made on behalf of, passed as `?caller=<uuid>`.
#[derive(Deserialize, Debug, Default)]
pub struct CallerQuery {
    pub caller: Option<Uuid>,
}

/// Loads a project with the caller's standing in it; 404 when missing.
pub(crate) async fn project_standing(
    state: &AppState,
    project_id: Uuid,
    caller: Option<Uuid>,
) -> ApiResult<(Project, Standing)> {
    let projects = ProjectRepository::new(state.pool.clone());
    run_blocking("loading project", move || projects.find_with_standing(project_id, caller))
        .await?
        .ok_or_else(|| not_found(format!("Project with ID {} not found", project_id)))
}

/// Rejects callers outside the project team.
pub(crate) fn require_team(standing: Standing, what: &str) -> ApiResult<()> {
    if standing.is_on_team() {
        Ok(())
    } else {
        Err(forbidden(format!("You do not have access to this project's {}", what)))
    }
}

/// Rejects anyone but the project creator.
pub(crate) fn require_admin(standing: Standing, action: &str) -> ApiResult<()> {
    if standing.is_admin() {
        Ok(())
    } else {
        Err(forbidden(format!("Only the project admin can {}", action)))
    }
}

/// Trims `raw` and rejects it when nothing is left.
pub(crate) fn required_text(raw: &str, field: &str) -> ApiResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(bad_request(format!("Missing {}", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trims optional text, mapping blank values to `None`.
pub(crate) fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("  Rust port ", "title").unwrap(), "Rust port");
        let err = required_text("   ", "title").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1, "Missing title");
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text(Some(" ".to_string())), None);
        assert_eq!(optional_text(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn team_and_admin_gates() {
        assert!(require_team(Standing::Member, "commits").is_ok());
        let err = require_team(Standing::Outsider, "commits").unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert_eq!(err.1, "You do not have access to this project's commits");

        assert!(require_admin(Standing::Creator, "edit this project").is_ok());
        let err = require_admin(Standing::Member, "edit this project").unwrap_err();
        assert_eq!(err.1, "Only the project admin can edit this project");
    }

    #[tokio::test]
    async fn blocking_errors_become_500() {
        let err = run_blocking("in test", || -> anyhow::Result<()> { anyhow::bail!("boom") })
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.1.contains("boom"));
    }
}
