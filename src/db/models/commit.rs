use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::postgres::schema::commits;

/// Lifecycle of a commit (task) on the workflow board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Pending,
    InProgress,
    Completed,
}

impl CommitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitStatus::Pending => "pending",
            CommitStatus::InProgress => "in_progress",
            CommitStatus::Completed => "completed",
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone, Serialize)]
#[diesel(table_name = commits)]
#[diesel(primary_key(id))]
pub struct Commit {
    pub id: Uuid,
    pub project_id: Uuid,
    pub message: String,
    pub assigned_to: Option<Uuid>,
    pub status: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Commit {
    pub fn is_completed(&self) -> bool {
        self.status == CommitStatus::Completed.as_str()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = commits)]
pub struct NewCommit {
    pub id: Uuid,
    pub project_id: Uuid,
    pub message: String,
    pub assigned_to: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A move on the workflow board. `completed_at` and `role` are written even
/// when `None` so leaving the done column or a custom column clears them.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = commits)]
#[diesel(treat_none_as_null = true)]
pub struct CommitMove {
    pub status: String,
    pub role: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CommitMove {
    pub fn to(status: CommitStatus, role: Option<String>, now: DateTime<Utc>) -> Self {
        CommitMove {
            status: status.as_str().to_string(),
            role,
            completed_at: (status == CommitStatus::Completed).then_some(now),
            updated_at: Some(now),
        }
    }
}

/// Hands a commit to a team member, or unassigns it with `None`.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = commits)]
#[diesel(treat_none_as_null = true)]
pub struct CommitAssignment {
    pub assigned_to: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}
