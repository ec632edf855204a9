use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::postgres::schema::projects;

pub const VISIBILITY_PUBLIC: &str = "public";
pub const VISIBILITY_PRIVATE: &str = "private";

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone, Serialize)]
#[diesel(table_name = projects)]
#[diesel(primary_key(id))]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub visibility: String,
    pub team_size: i32,
    pub repository_link: Option<String>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn is_private(&self) -> bool {
        self.visibility == VISIBILITY_PRIVATE
    }

    /// How `caller` relates to this project; `is_member` comes from
    /// `project_members`.
    pub fn standing_of(&self, caller: Option<Uuid>, is_member: bool) -> Standing {
        match caller {
            Some(user_id) if user_id == self.creator_id => Standing::Creator,
            Some(_) if is_member => Standing::Member,
            _ => Standing::Outsider,
        }
    }

    /// Public projects are open to everyone, private ones to the team.
    pub fn is_visible_to(&self, standing: Standing) -> bool {
        !self.is_private() || standing.is_on_team()
    }
}

/// A caller's relation to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Creator,
    Member,
    Outsider,
}

impl Standing {
    /// Commits and the workflow board are limited to the team.
    pub fn is_on_team(self) -> bool {
        matches!(self, Standing::Creator | Standing::Member)
    }

    /// Editing, deleting and managing members is limited to the creator.
    pub fn is_admin(self) -> bool {
        self == Standing::Creator
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub visibility: String,
    pub team_size: i32,
    pub repository_link: Option<String>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Full replacement of the editable project fields. Blank optional fields
/// are written as NULL.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = projects)]
#[diesel(treat_none_as_null = true)]
pub struct ProjectEdit {
    pub title: String,
    pub description: Option<String>,
    pub visibility: String,
    pub team_size: i32,
    pub repository_link: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
