use anyhow::{Context, Result};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{checkout, DBConn, DBPool};
use crate::db::models::project_member::ProjectMember;
use crate::db::postgres::schema::{commits, project_members};

#[derive(Clone)]
pub struct ProjectMemberRepository {
    pool: Arc<DBPool>,
}

impl ProjectMemberRepository {
    pub fn new(pool: Arc<DBPool>) -> Self {
        ProjectMemberRepository { pool }
    }

    pub fn find_by_project(&self, target_project: Uuid) -> Result<Vec<ProjectMember>> {
        let mut conn = checkout(&self.pool)?;
        project_members::table
            .filter(project_members::project_id.eq(target_project))
            .order(project_members::joined_at.asc())
            .select(ProjectMember::as_select())
            .load(&mut conn)
            .context("Failed to load project members")
    }

    pub fn is_member(&self, target_project: Uuid, target_user: Uuid) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        is_member(&mut conn, target_project, target_user)
    }

    /// Drops a member from the team and unassigns their commits on the
    /// project. Returns `false` when the user was not a member.
    pub fn remove(&self, target_project: Uuid, target_user: Uuid) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        let removed = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let removed = diesel::delete(
                project_members::table
                    .filter(project_members::project_id.eq(target_project))
                    .filter(project_members::user_id.eq(target_user)),
            )
            .execute(conn)
            .context("Failed to remove project member")?;
            if removed == 0 {
                return Ok(false);
            }

            let unassigned = diesel::update(
                commits::table
                    .filter(commits::project_id.eq(target_project))
                    .filter(commits::assigned_to.eq(target_user)),
            )
            .set(commits::assigned_to.eq(None::<Uuid>))
            .execute(conn)
            .context("Failed to unassign commits of removed member")?;
            info!(project_id = %target_project, user_id = %target_user, unassigned, "Member removed");
            Ok(true)
        })?;
        Ok(removed)
    }
}

pub(crate) fn is_member(conn: &mut DBConn, target_project: Uuid, target_user: Uuid) -> Result<bool> {
    diesel::select(diesel::dsl::exists(
        project_members::table
            .filter(project_members::project_id.eq(target_project))
            .filter(project_members::user_id.eq(target_user)),
    ))
    .get_result(conn)
    .context("Failed to check project membership")
}

pub(crate) fn count_members(conn: &mut DBConn, target_project: Uuid) -> Result<i64> {
    project_members::table
        .filter(project_members::project_id.eq(target_project))
        .select(count_star())
        .get_result(conn)
        .context("Failed to count project members")
}
