use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::postgres::schema::project_members;

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone, Serialize)]
#[diesel(table_name = project_members)]
#[diesel(primary_key(id))]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = project_members)]
pub struct NewProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl NewProjectMember {
    pub fn joining_now(project_id: Uuid, user_id: Uuid) -> Self {
        NewProjectMember {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}
