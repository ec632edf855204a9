use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    bad_request, not_found, optional_text, project_standing, require_team, required_text,
    run_blocking, ApiResult, CallerQuery,
};
use crate::db::models::commit::{Commit, CommitAssignment, CommitMove, CommitStatus, NewCommit};
use crate::db::repositories::commits::CommitRepository;
use crate::db::repositories::project_members::ProjectMemberRepository;
use crate::router::AppState;

#[derive(Deserialize, Debug)]
pub struct CreateCommitRequest {
    pub message: String,
    pub assigned_to: Option<Uuid>,
    pub status: Option<CommitStatus>,
}

/// A drop on the workflow board. `column` names a custom board column
/// (stored in the commit's `role`); omit it for the default columns.
#[derive(Deserialize, Debug)]
pub struct MoveCommitRequest {
    pub status: CommitStatus,
    pub column: Option<String>,
}

/// `assigned_to: null` unassigns the commit.
#[derive(Deserialize, Debug)]
pub struct AssignCommitRequest {
    pub assigned_to: Option<Uuid>,
}

/// Loads a commit and checks that the caller works on its project.
async fn team_commit(
    state: &AppState,
    commit_id: Uuid,
    caller: Option<Uuid>,
    what: &str,
) -> ApiResult<Commit> {
    let repo = CommitRepository::new(state.pool.clone());
    let commit = run_blocking("fetching commit", move || repo.find(commit_id))
        .await?
        .ok_or_else(|| not_found(format!("Commit with ID {} not found", commit_id)))?;
    let (_, standing) = project_standing(state, commit.project_id, caller).await?;
    require_team(standing, what)?;
    Ok(commit)
}

// Handler for GET /v0/projects/:project_id/commits
pub async fn list_commits(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
) -> ApiResult<impl IntoResponse> {
    debug!("Fetching commits for project {}", project_id);
    let (_, standing) = project_standing(&state, project_id, query.caller).await?;
    require_team(standing, "commits")?;

    let repo = CommitRepository::new(state.pool.clone());
    let commits = run_blocking("fetching commits", move || repo.find_by_project(project_id)).await?;
    Ok(Json(commits))
}

// Handler for POST /v0/projects/:project_id/commits
pub async fn create_commit(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
    Json(body): Json<CreateCommitRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = required_text(&body.message, "message")?;
    let (_, standing) = project_standing(&state, project_id, query.caller).await?;
    require_team(standing, "commits")?;

    let status = body.status.unwrap_or(CommitStatus::Pending);
    let now = Utc::now();
    let new_commit = NewCommit {
        id: Uuid::new_v4(),
        project_id,
        message,
        assigned_to: body.assigned_to,
        status: status.as_str().to_string(),
        created_at: now,
        completed_at: (status == CommitStatus::Completed).then_some(now),
    };

    let commits = CommitRepository::new(state.pool.clone());
    let created = run_blocking("creating commit", move || commits.create(new_commit)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// Handler for PATCH /v0/commits/:commit_id/status
pub async fn move_commit(
    State(state): State<AppState>,
    Path(commit_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
    Json(body): Json<MoveCommitRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!(commit_id = %commit_id, status = ?body.status, "Moving commit");
    team_commit(&state, commit_id, query.caller, "workflow board").await?;

    let change = CommitMove::to(body.status, optional_text(body.column), Utc::now());
    let repo = CommitRepository::new(state.pool.clone());
    match run_blocking("moving commit", move || repo.apply_move(commit_id, &change)).await? {
        Some(commit) => Ok(Json(commit)),
        None => Err(not_found(format!("Commit with ID {} not found", commit_id))),
    }
}

// Handler for PATCH /v0/commits/:commit_id/assignee
pub async fn assign_commit(
    State(state): State<AppState>,
    Path(commit_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
    Json(body): Json<AssignCommitRequest>,
) -> ApiResult<impl IntoResponse> {
    let commit = team_commit(&state, commit_id, query.caller, "commits").await?;

    if let Some(assignee) = body.assigned_to {
        let members = ProjectMemberRepository::new(state.pool.clone());
        let project_id = commit.project_id;
        let on_team =
            run_blocking("checking assignee", move || members.is_member(project_id, assignee)).await?;
        if !on_team {
            return Err(bad_request(format!(
                "User {} is not a member of this project",
                assignee
            )));
        }
    }

    let assignment = CommitAssignment {
        assigned_to: body.assigned_to,
        updated_at: Some(Utc::now()),
    };
    let repo = CommitRepository::new(state.pool.clone());
    match run_blocking("assigning commit", move || repo.assign(commit_id, &assignment)).await? {
        Some(commit) => {
            info!(commit_id = %commit.id, assigned_to = ?commit.assigned_to, "Commit assigned");
            Ok(Json(commit))
        }
        None => Err(not_found(format!("Commit with ID {} not found", commit_id))),
    }
}
