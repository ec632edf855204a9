use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::project_members::{count_members, is_member};
use super::{checkout, DBConn, DBPool};
use crate::db::models::join_request::{JoinRequest, JoinRequestStatus, NewJoinRequest};
use crate::db::models::project::Project;
use crate::db::models::project_member::NewProjectMember;
use crate::db::postgres::schema::{join_requests, project_members, projects};

/// Result of asking to join a project.
#[derive(Debug)]
pub enum SubmitOutcome {
    Created(JoinRequest),
    ProjectNotFound,
    AlreadyMember,
    AlreadyPending,
    TeamFull,
}

/// Result of approving or rejecting a request.
#[derive(Debug)]
pub enum ReviewOutcome {
    Reviewed(JoinRequest),
    NotFound,
    NotPending(JoinRequest),
    TeamFull,
}

#[derive(Clone)]
pub struct JoinRequestRepository {
    pool: Arc<DBPool>,
}

impl JoinRequestRepository {
    pub fn new(pool: Arc<DBPool>) -> Self {
        JoinRequestRepository { pool }
    }

    pub fn submit(&self, new_request: NewJoinRequest) -> Result<SubmitOutcome> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            let Some(project) = lock_project(conn, new_request.project_id)? else {
                return Ok(SubmitOutcome::ProjectNotFound);
            };
            let refusal = submit_refusal(
                is_member(conn, project.id, new_request.user_id)?,
                has_pending(conn, project.id, new_request.user_id)?,
                count_members(conn, project.id)?,
                project.team_size,
            );
            if let Some(refusal) = refusal {
                return Ok(refusal);
            }

            let created = diesel::insert_into(join_requests::table)
                .values(&new_request)
                .returning(JoinRequest::as_returning())
                .get_result(conn)
                .context("Failed to insert join request")?;
            debug!(request_id = %created.id, project_id = %created.project_id, "Join request submitted");
            Ok(SubmitOutcome::Created(created))
        })
    }

    /// Approves a pending request and adds the requester to the team.
    pub fn approve(&self, request_id: Uuid, now: DateTime<Utc>) -> Result<ReviewOutcome> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            let request = match pending_only(lock_request(conn, request_id)?) {
                Ok(request) => request,
                Err(outcome) => return Ok(outcome),
            };
            let project = lock_project(conn, request.project_id)?
                .context("Join request references a missing project")?;

            let step = admission(
                is_member(conn, project.id, request.user_id)?,
                count_members(conn, project.id)?,
                project.team_size,
            );
            match step {
                Admission::TeamFull => return Ok(ReviewOutcome::TeamFull),
                Admission::AlreadyOnTeam => {}
                Admission::AddMember => {
                    let member = NewProjectMember {
                        joined_at: now,
                        ..NewProjectMember::joining_now(request.project_id, request.user_id)
                    };
                    diesel::insert_into(project_members::table)
                        .values(&member)
                        .execute(conn)
                        .context("Failed to add approved member")?;
                }
            }

            let reviewed = set_status(conn, request.id, JoinRequestStatus::Approved, now)?;
            info!(request_id = %reviewed.id, user_id = %reviewed.user_id, project_id = %reviewed.project_id, "Join request approved");
            Ok(ReviewOutcome::Reviewed(reviewed))
        })
    }

    pub fn reject(&self, request_id: Uuid, now: DateTime<Utc>) -> Result<ReviewOutcome> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            let request = match pending_only(lock_request(conn, request_id)?) {
                Ok(request) => request,
                Err(outcome) => return Ok(outcome),
            };
            let reviewed = set_status(conn, request.id, JoinRequestStatus::Rejected, now)?;
            info!(request_id = %reviewed.id, "Join request rejected");
            Ok(ReviewOutcome::Reviewed(reviewed))
        })
    }

    pub fn find_pending_by_project(&self, target_project: Uuid) -> Result<Vec<JoinRequest>> {
        let mut conn = checkout(&self.pool)?;
        join_requests::table
            .filter(join_requests::project_id.eq(target_project))
            .filter(join_requests::status.eq(JoinRequestStatus::Pending.as_str()))
            .order(join_requests::created_at.asc())
            .select(JoinRequest::as_select())
            .load(&mut conn)
            .context("Failed to load pending join requests")
    }

    /// Requests of any status created at or after `since`.
    pub fn find_since(&self, target_project: Uuid, since: DateTime<Utc>) -> Result<Vec<JoinRequest>> {
        let mut conn = checkout(&self.pool)?;
        join_requests::table
            .filter(join_requests::project_id.eq(target_project))
            .filter(join_requests::created_at.ge(since))
            .select(JoinRequest::as_select())
            .load(&mut conn)
            .context("Failed to load recent join requests")
    }
}

/// What approving a pending request does to the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    AddMember,
    AlreadyOnTeam,
    TeamFull,
}

/// Why a new request must be turned away, or `None` when it may be filed.
pub(crate) fn submit_refusal(
    is_member: bool,
    has_pending: bool,
    members: i64,
    team_size: i32,
) -> Option<SubmitOutcome> {
    if is_member {
        Some(SubmitOutcome::AlreadyMember)
    } else if has_pending {
        Some(SubmitOutcome::AlreadyPending)
    } else if members >= i64::from(team_size) {
        Some(SubmitOutcome::TeamFull)
    } else {
        None
    }
}

pub(crate) fn admission(is_member: bool, members: i64, team_size: i32) -> Admission {
    if is_member {
        Admission::AlreadyOnTeam
    } else if members >= i64::from(team_size) {
        Admission::TeamFull
    } else {
        Admission::AddMember
    }
}

/// Only pending requests can be reviewed.
pub(crate) fn pending_only(request: Option<JoinRequest>) -> std::result::Result<JoinRequest, ReviewOutcome> {
    match request {
        None => Err(ReviewOutcome::NotFound),
        Some(request) if !request.is_pending() => Err(ReviewOutcome::NotPending(request)),
        Some(request) => Ok(request),
    }
}

/// Loads the project and holds its row until the transaction ends, so
/// capacity checks on the same project run one at a time.
fn lock_project(conn: &mut DBConn, project_id: Uuid) -> Result<Option<Project>> {
    projects::table
        .find(project_id)
        .select(Project::as_select())
        .for_update()
        .get_result(conn)
        .optional()
        .context("Failed to lock project")
}

fn lock_request(conn: &mut DBConn, request_id: Uuid) -> Result<Option<JoinRequest>> {
    join_requests::table
        .find(request_id)
        .select(JoinRequest::as_select())
        .for_update()
        .get_result(conn)
        .optional()
        .context("Failed to find join request")
}

fn has_pending(conn: &mut DBConn, target_project: Uuid, target_user: Uuid) -> Result<bool> {
    let pending: i64 = join_requests::table
        .filter(join_requests::project_id.eq(target_project))
        .filter(join_requests::user_id.eq(target_user))
        .filter(join_requests::status.eq(JoinRequestStatus::Pending.as_str()))
        .select(count_star())
        .get_result(conn)
        .context("Failed to check pending join requests")?;
    Ok(pending > 0)
}

fn set_status(
    conn: &mut DBConn,
    request_id: Uuid,
    status: JoinRequestStatus,
    now: DateTime<Utc>,
) -> Result<JoinRequest> {
    diesel::update(join_requests::table.find(request_id))
        .set((
            join_requests::status.eq(status.as_str()),
            join_requests::updated_at.eq(Some(now)),
        ))
        .returning(JoinRequest::as_returning())
        .get_result(conn)
        .context("Failed to update join request status")
}
