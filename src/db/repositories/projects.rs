use anyhow::{Context, Result};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::project_members::is_member;
use super::{checkout, DBPool};
use crate::db::models::project::{
    NewProject, Project, ProjectEdit, Standing, VISIBILITY_PUBLIC,
};
use crate::db::models::project_member::NewProjectMember;
use crate::db::postgres::schema::{commits, join_requests, project_members, projects};

#[derive(Clone)]
pub struct ProjectRepository {
    pool: Arc<DBPool>,
}

/// Membership row that enrols a project's creator.
pub(crate) fn creator_membership(project: &Project) -> NewProjectMember {
    NewProjectMember {
        joined_at: project.created_at,
        ..NewProjectMember::joining_now(project.id, project.creator_id)
    }
}

impl ProjectRepository {
    pub fn new(pool: Arc<DBPool>) -> Self {
        ProjectRepository { pool }
    }

    /// Inserts the project and enrols its creator as the first member.
    pub fn create(&self, new_project: NewProject) -> Result<Project> {
        let mut conn = checkout(&self.pool)?;
        let project = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let project = diesel::insert_into(projects::table)
                .values(&new_project)
                .returning(Project::as_returning())
                .get_result(conn)
                .context("Failed to insert project")?;

            diesel::insert_into(project_members::table)
                .values(&creator_membership(&project))
                .execute(conn)
                .context("Failed to add creator as project member")?;

            Ok(project)
        })?;
        info!(project_id = %project.id, creator_id = %project.creator_id, "Project created");
        Ok(project)
    }

    pub fn find(&self, project_id: Uuid) -> Result<Option<Project>> {
        let mut conn = checkout(&self.pool)?;
        projects::table
            .find(project_id)
            .select(Project::as_select())
            .first(&mut conn)
            .optional()
            .context("Failed to find project")
    }

    /// The project together with how `caller` relates to it.
    pub fn find_with_standing(
        &self,
        project_id: Uuid,
        caller: Option<Uuid>,
    ) -> Result<Option<(Project, Standing)>> {
        let Some(project) = self.find(project_id)? else {
            return Ok(None);
        };
        let member = match caller {
            Some(user_id) => {
                let mut conn = checkout(&self.pool)?;
                is_member(&mut conn, project_id, user_id)?
            }
            None => false,
        };
        let standing = project.standing_of(caller, member);
        Ok(Some((project, standing)))
    }

    /// Public projects, newest first.
    pub fn list_public(&self) -> Result<Vec<Project>> {
        let mut conn = checkout(&self.pool)?;
        projects::table
            .filter(projects::visibility.eq(VISIBILITY_PUBLIC))
            .order(projects::created_at.desc())
            .select(Project::as_select())
            .load(&mut conn)
            .context("Failed to load public projects")
    }

    pub fn count_created_by(&self, creator: Uuid) -> Result<i64> {
        let mut conn = checkout(&self.pool)?;
        projects::table
            .filter(projects::creator_id.eq(creator))
            .select(count_star())
            .get_result(&mut conn)
            .context("Failed to count projects for creator")
    }

    pub fn update(&self, project_id: Uuid, edit: &ProjectEdit) -> Result<Option<Project>> {
        let mut conn = checkout(&self.pool)?;
        diesel::update(projects::table.find(project_id))
            .set(edit)
            .returning(Project::as_returning())
            .get_result(&mut conn)
            .optional()
            .context("Failed to update project")
    }

    /// Removes the project with its members, commits and join requests.
    /// Returns `false` when there was nothing to delete.
    pub fn delete(&self, project_id: Uuid) -> Result<bool> {
        let mut conn = checkout(&self.pool)?;
        let deleted = conn.transaction::<_, anyhow::Error, _>(|conn| {
            diesel::delete(project_members::table.filter(project_members::project_id.eq(project_id)))
                .execute(conn)
                .context("Failed to delete project members")?;
            diesel::delete(commits::table.filter(commits::project_id.eq(project_id)))
                .execute(conn)
                .context("Failed to delete project commits")?;
            diesel::delete(join_requests::table.filter(join_requests::project_id.eq(project_id)))
                .execute(conn)
                .context("Failed to delete project join requests")?;
            let removed = diesel::delete(projects::table.find(project_id))
                .execute(conn)
                .context("Failed to delete project")?;
            Ok(removed > 0)
        })?;
        if deleted {
            info!(project_id = %project_id, "Project deleted");
        }
        Ok(deleted)
    }
}
