use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{forbidden, project_standing, run_blocking, ApiResult, CallerQuery};
use crate::db::repositories::commits::CommitRepository;
use crate::db::repositories::join_requests::JoinRequestRepository;
use crate::db::repositories::project_members::ProjectMemberRepository;
use crate::health::calculate_health_score;
use crate::metrics::{activity_stats, assumed_test_stats, commit_stats, month_ago};
use crate::router::AppState;

// Handler for GET /v0/projects/:project_id/health
pub async fn get_project_health(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
) -> ApiResult<impl IntoResponse> {
    debug!("Scoring health of project {}", project_id);
    let (project, standing) = project_standing(&state, project_id, query.caller).await?;
    if !project.is_visible_to(standing) {
        return Err(forbidden("You do not have access to this project"));
    }

    let members = ProjectMemberRepository::new(state.pool.clone());
    let commits = CommitRepository::new(state.pool.clone());
    let requests = JoinRequestRepository::new(state.pool.clone());
    let now = Utc::now();

    let (commit_rows, member_rows, request_rows) = run_blocking("loading project activity", move || {
        Ok((
            commits.find_by_project(project_id)?,
            members.find_by_project(project_id)?,
            requests.find_since(project_id, month_ago(now))?,
        ))
    })
    .await?;

    let tests = assumed_test_stats(
        state.health.assumed_tests_total,
        state.health.assumed_tests_passed,
    );
    let score = calculate_health_score(
        &commit_stats(&commit_rows, now),
        &tests,
        &activity_stats(&member_rows, &request_rows, now),
    );
    debug!(project_id = %project_id, score = score.score, status = %score.status, "Project scored");
    Ok(Json(score))
}
