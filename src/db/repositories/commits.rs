use anyhow::{Context, Result};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::{checkout, DBPool};
use crate::db::models::commit::{Commit, CommitAssignment, CommitMove, NewCommit};
use crate::db::postgres::schema::commits;

#[derive(Clone)]
pub struct CommitRepository {
    pool: Arc<DBPool>,
}

impl CommitRepository {
    pub fn new(pool: Arc<DBPool>) -> Self {
        CommitRepository { pool }
    }

    pub fn create(&self, new_commit: NewCommit) -> Result<Commit> {
        let mut conn = checkout(&self.pool)?;
        diesel::insert_into(commits::table)
            .values(&new_commit)
            .returning(Commit::as_returning())
            .get_result(&mut conn)
            .context("Failed to insert commit")
    }

    pub fn find(&self, commit_id: Uuid) -> Result<Option<Commit>> {
        let mut conn = checkout(&self.pool)?;
        commits::table
            .find(commit_id)
            .select(Commit::as_select())
            .first(&mut conn)
            .optional()
            .context("Failed to find commit")
    }

    /// Commits of a project, newest first.
    pub fn find_by_project(&self, target_project: Uuid) -> Result<Vec<Commit>> {
        let mut conn = checkout(&self.pool)?;
        commits::table
            .filter(commits::project_id.eq(target_project))
            .order(commits::created_at.desc())
            .select(Commit::as_select())
            .load(&mut conn)
            .context("Failed to load commits")
    }

    /// Applies a board move. Returns `None` when the commit does not exist.
    pub fn apply_move(&self, commit_id: Uuid, change: &CommitMove) -> Result<Option<Commit>> {
        let mut conn = checkout(&self.pool)?;
        diesel::update(commits::table.find(commit_id))
            .set(change)
            .returning(Commit::as_returning())
            .get_result(&mut conn)
            .optional()
            .context("Failed to move commit")
    }

    pub fn assign(&self, commit_id: Uuid, assignment: &CommitAssignment) -> Result<Option<Commit>> {
        let mut conn = checkout(&self.pool)?;
        diesel::update(commits::table.find(commit_id))
            .set(assignment)
            .returning(Commit::as_returning())
            .get_result(&mut conn)
            .optional()
            .context("Failed to assign commit")
    }
}
