use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{conflict, not_found, optional_text, run_blocking, ApiError, ApiResult};
use crate::db::models::join_request::{JoinRequest, JoinRequestStatus, NewJoinRequest};
use crate::db::repositories::join_requests::{JoinRequestRepository, ReviewOutcome, SubmitOutcome};
use crate::router::AppState;

#[derive(Deserialize, Debug)]
pub struct SubmitJoinRequest {
    pub user_id: Uuid,
    pub message: Option<String>,
}

// Handler for GET /v0/projects/:project_id/join-requests
pub async fn list_pending_requests(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    debug!("Fetching pending join requests for project {}", project_id);
    let repo = JoinRequestRepository::new(state.pool.clone());
    let pending =
        run_blocking("fetching join requests", move || repo.find_pending_by_project(project_id)).await?;
    Ok(Json(pending))
}

// Handler for POST /v0/projects/:project_id/join-requests
pub async fn submit_request(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<SubmitJoinRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_request = NewJoinRequest {
        id: Uuid::new_v4(),
        project_id,
        user_id: body.user_id,
        message: optional_text(body.message),
        status: JoinRequestStatus::Pending.as_str().to_string(),
        created_at: Utc::now(),
    };
    let repo = JoinRequestRepository::new(state.pool.clone());
    match run_blocking("submitting join request", move || repo.submit(new_request)).await? {
        SubmitOutcome::Created(request) => Ok((StatusCode::CREATED, Json(request))),
        SubmitOutcome::ProjectNotFound => {
            Err(not_found(format!("Project with ID {} not found", project_id)))
        }
        SubmitOutcome::AlreadyMember => Err(conflict("Already a member of this project")),
        SubmitOutcome::AlreadyPending => Err(conflict("A join request is already pending")),
        SubmitOutcome::TeamFull => Err(conflict("Team is full")),
    }
}

// Handler for POST /v0/join-requests/:request_id/approve
pub async fn approve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = JoinRequestRepository::new(state.pool.clone());
    let outcome =
        run_blocking("approving join request", move || repo.approve(request_id, Utc::now())).await?;
    reviewed(request_id, outcome).map(Json)
}

// Handler for POST /v0/join-requests/:request_id/reject
pub async fn reject_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = JoinRequestRepository::new(state.pool.clone());
    let outcome =
        run_blocking("rejecting join request", move || repo.reject(request_id, Utc::now())).await?;
    reviewed(request_id, outcome).map(Json)
}

fn reviewed(request_id: Uuid, outcome: ReviewOutcome) -> Result<JoinRequest, ApiError> {
    match outcome {
        ReviewOutcome::Reviewed(request) => Ok(request),
        ReviewOutcome::NotFound => {
            Err(not_found(format!("Join request with ID {} not found", request_id)))
        }
        ReviewOutcome::NotPending(request) => {
            info!(request_id = %request_id, status = %request.status, "Join request already reviewed");
            Err(conflict(format!("Join request is already {}", request.status)))
        }
        ReviewOutcome::TeamFull => Err(conflict("Team is full")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: &str) -> JoinRequest {
        JoinRequest {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            message: None,
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn review_outcomes_map_to_statuses() {
        let id = Uuid::new_v4();
        assert!(reviewed(id, ReviewOutcome::Reviewed(request("approved"))).is_ok());
        assert_eq!(reviewed(id, ReviewOutcome::NotFound).unwrap_err().0, StatusCode::NOT_FOUND);
        assert_eq!(reviewed(id, ReviewOutcome::TeamFull).unwrap_err().0, StatusCode::CONFLICT);

        let err = reviewed(id, ReviewOutcome::NotPending(request("rejected"))).unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1, "Join request is already rejected");
    }
}
