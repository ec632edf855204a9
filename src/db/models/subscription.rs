use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::postgres::schema::subscriptions;

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone, Serialize)]
#[diesel(table_name = subscriptions)]
#[diesel(primary_key(id))]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub price_id: Option<String>,
    pub plan_name: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub price_id: Option<String>,
    pub plan_name: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns refreshed when an existing subscription row is renewed.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionRenewal {
    pub price_id: Option<String>,
    pub plan_name: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&NewSubscription> for SubscriptionRenewal {
    fn from(new: &NewSubscription) -> Self {
        SubscriptionRenewal {
            price_id: new.price_id.clone(),
            plan_name: new.plan_name.clone(),
            status: new.status.clone(),
            current_period_start: new.current_period_start,
            current_period_end: new.current_period_end,
            updated_at: new.updated_at,
        }
    }
}
