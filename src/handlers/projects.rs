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
    bad_request, conflict, forbidden, not_found, optional_text, project_standing, require_admin,
    required_text, run_blocking, ApiError, ApiResult, CallerQuery,
};
use crate::access::SubscriptionProfile;
use crate::db::models::project::{
    NewProject, Project, ProjectEdit, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC,
};
use crate::db::repositories::project_members::ProjectMemberRepository;
use crate::db::repositories::projects::ProjectRepository;
use crate::db::repositories::users::UserRepository;
use crate::router::AppState;
use crate::subscription::{can_create_project, clamp_team_size, max_project_count};

const DEFAULT_TEAM_SIZE: u32 = 5;

#[derive(Deserialize, Debug)]
pub struct CreateProjectRequest {
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Option<String>,
    pub team_size: Option<u32>,
    pub repository_link: Option<String>,
}

fn parse_visibility(raw: Option<&str>) -> ApiResult<String> {
    match raw.map(str::trim) {
        None | Some("") | Some(VISIBILITY_PUBLIC) => Ok(VISIBILITY_PUBLIC.to_string()),
        Some(VISIBILITY_PRIVATE) => Ok(VISIBILITY_PRIVATE.to_string()),
        Some(other) => Err(bad_request(format!("Unknown visibility: {}", other))),
    }
}

/// Outcome of the creation transaction, decided inside the blocking task.
enum Creation {
    Created(Project),
    UnknownUser,
    LimitReached(i32),
}

// Handler for POST /v0/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let title = required_text(&body.title, "title")?;
    let visibility = parse_visibility(body.visibility.as_deref())?;
    let requested_size = body.team_size.unwrap_or(DEFAULT_TEAM_SIZE);
    let creator_id = body.creator_id;
    debug!(creator_id = %creator_id, title = %title, "Creating project");

    let users = UserRepository::new(state.pool.clone());
    let projects = ProjectRepository::new(state.pool.clone());
    let description = optional_text(body.description);
    let repository_link = optional_text(body.repository_link);

    let outcome = run_blocking("creating project", move || {
        let Some(user) = users.find(creator_id)? else {
            return Ok(Creation::UnknownUser);
        };
        let now = Utc::now();
        let profile = SubscriptionProfile::from(&user);
        let plan = profile.effective_plan_at(now);

        let owned = u32::try_from(projects.count_created_by(creator_id)?).unwrap_or(u32::MAX);
        if !can_create_project(plan, profile.role(), owned) {
            return Ok(Creation::LimitReached(max_project_count(plan, profile.role())));
        }

        let team_size = clamp_team_size(requested_size, plan);
        let project = projects.create(NewProject {
            id: Uuid::new_v4(),
            title,
            description,
            visibility,
            team_size: i32::try_from(team_size).unwrap_or(i32::MAX),
            repository_link,
            creator_id,
            created_at: now,
        })?;
        Ok(Creation::Created(project))
    })
    .await?;

    match outcome {
        Creation::Created(project) => Ok((StatusCode::CREATED, Json(project))),
        Creation::UnknownUser => Err(not_found(format!("User with ID {} not found", creator_id))),
        Creation::LimitReached(limit) => {
            info!(creator_id = %creator_id, limit, "Project limit reached");
            Err((
                StatusCode::FORBIDDEN,
                format!(
                    "You have reached the maximum number of projects ({}) for your plan. Please upgrade to create more projects.",
                    limit
                ),
            ))
        }
    }
}

// Handler for GET /v0/projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    debug!("Listing public projects");
    let repo = ProjectRepository::new(state.pool.clone());
    let projects = run_blocking("listing projects", move || repo.list_public()).await?;
    Ok(Json(projects))
}

// Handler for GET /v0/projects/:project_id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
) -> ApiResult<impl IntoResponse> {
    debug!("Fetching project {}", project_id);
    let (project, standing) = project_standing(&state, project_id, query.caller).await?;
    if !project.is_visible_to(standing) {
        return Err(forbidden("You do not have access to this project"));
    }
    Ok(Json(project))
}

#[derive(Deserialize, Debug)]
pub struct UpdateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    /// Left unchanged when omitted.
    pub visibility: Option<String>,
    /// Left unchanged when omitted; clamped to the creator's plan otherwise.
    pub team_size: Option<u32>,
    pub repository_link: Option<String>,
}

enum Edit {
    Updated(Project),
    Missing,
    Denied(ApiError),
}

// Handler for PUT /v0/projects/:project_id
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
    Json(body): Json<UpdateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let title = required_text(&body.title, "title")?;
    let visibility = match body.visibility.as_deref() {
        Some(raw) => Some(parse_visibility(Some(raw))?),
        None => None,
    };
    let description = optional_text(body.description);
    let repository_link = optional_text(body.repository_link);
    let requested_size = body.team_size;
    let caller = query.caller;

    let projects = ProjectRepository::new(state.pool.clone());
    let users = UserRepository::new(state.pool.clone());
    let outcome = run_blocking("updating project", move || {
        let Some((project, standing)) = projects.find_with_standing(project_id, caller)? else {
            return Ok(Edit::Missing);
        };
        if let Err(denied) = require_admin(standing, "edit this project") {
            return Ok(Edit::Denied(denied));
        }

        let now = Utc::now();
        let team_size = match requested_size {
            Some(requested) => {
                let creator = users.find(project.creator_id)?;
                let profile = creator.as_ref().map(SubscriptionProfile::from).unwrap_or_default();
                let clamped = clamp_team_size(requested, profile.effective_plan_at(now));
                i32::try_from(clamped).unwrap_or(i32::MAX)
            }
            None => project.team_size,
        };
        let edit = ProjectEdit {
            title,
            description,
            visibility: visibility.unwrap_or(project.visibility),
            team_size,
            repository_link,
            updated_at: Some(now),
        };
        Ok(match projects.update(project_id, &edit)? {
            Some(updated) => Edit::Updated(updated),
            None => Edit::Missing,
        })
    })
    .await?;

    match outcome {
        Edit::Updated(project) => {
            info!(project_id = %project.id, team_size = project.team_size, "Project updated");
            Ok(Json(project))
        }
        Edit::Missing => Err(not_found(format!("Project with ID {} not found", project_id))),
        Edit::Denied(denied) => Err(denied),
    }
}

// Handler for DELETE /v0/projects/:project_id
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CallerQuery>,
) -> ApiResult<impl IntoResponse> {
    let (_, standing) = project_standing(&state, project_id, query.caller).await?;
    require_admin(standing, "delete this project")?;

    let repo = ProjectRepository::new(state.pool.clone());
    if run_blocking("deleting project", move || repo.delete(project_id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("Project with ID {} not found", project_id)))
    }
}

// Handler for DELETE /v0/projects/:project_id/members/:user_id
pub async fn remove_member(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CallerQuery>,
) -> ApiResult<impl IntoResponse> {
    let (project, standing) = project_standing(&state, project_id, query.caller).await?;
    require_admin(standing, "remove team members")?;
    if user_id == project.creator_id {
        return Err(conflict("The project admin cannot be removed from the team"));
    }

    let members = ProjectMemberRepository::new(state.pool.clone());
    if run_blocking("removing member", move || members.remove(project_id, user_id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("User {} is not a member of this project", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_defaults_to_public() {
        assert_eq!(parse_visibility(None).unwrap(), "public");
        assert_eq!(parse_visibility(Some(" ")).unwrap(), "public");
        assert_eq!(parse_visibility(Some("private")).unwrap(), "private");
        assert_eq!(parse_visibility(Some("secret")).unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
