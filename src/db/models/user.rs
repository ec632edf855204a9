use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::postgres::schema::users;

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone, Serialize)]
#[diesel(table_name = users)]
#[diesel(primary_key(id))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub user_role: Option<String>,
    pub subscription: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Subscription fields written when a plan is activated.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = users)]
pub struct UserSubscriptionChanges {
    pub subscription: String,
    pub subscription_status: String,
    pub subscription_period_end: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
