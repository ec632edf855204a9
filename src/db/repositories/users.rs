use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::{checkout, DBPool};
use crate::db::models::subscription::{NewSubscription, Subscription, SubscriptionRenewal};
use crate::db::models::user::{User, UserSubscriptionChanges};
use crate::db::postgres::schema::{subscriptions, users};
use crate::subscription::STATUS_ACTIVE;

#[derive(Clone)]
pub struct UserRepository {
    pool: Arc<DBPool>,
}

impl UserRepository {
    pub fn new(pool: Arc<DBPool>) -> Self {
        UserRepository { pool }
    }

    pub fn find(&self, user_id: Uuid) -> Result<Option<User>> {
        let mut conn = checkout(&self.pool)?;
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| {
                error!(user_id = %user_id, error = ?e, "Failed to find user");
                anyhow::anyhow!("Failed to find user {}: {}", user_id, e)
            })
    }

    /// Users whose active subscription ends strictly between `after` and `before`.
    pub fn find_expiring_between(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Vec<User>> {
        let mut conn = checkout(&self.pool)?;
        users::table
            .filter(users::subscription_status.eq(STATUS_ACTIVE))
            .filter(users::subscription_period_end.gt(after))
            .filter(users::subscription_period_end.lt(before))
            .order(users::subscription_period_end.asc())
            .select(User::as_select())
            .load(&mut conn)
            .context("Failed to load users with expiring subscriptions")
    }

    /// Writes an activated plan onto the user row and upserts the matching
    /// `subscriptions` row. Returns `None` when the user does not exist.
    pub fn activate_subscription(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<Option<(User, Subscription)>> {
        let mut conn = checkout(&self.pool)?;
        let target = new_subscription.user_id;
        debug!(user_id = %target, plan = %new_subscription.plan_name, "Activating subscription");

        conn.transaction::<_, anyhow::Error, _>(|conn| {
            let changes = UserSubscriptionChanges {
                subscription: new_subscription.plan_name.clone(),
                subscription_status: new_subscription.status.clone(),
                subscription_period_end: new_subscription.current_period_end,
                updated_at: new_subscription.updated_at,
            };
            let user = diesel::update(users::table.find(target))
                .set(&changes)
                .returning(User::as_returning())
                .get_result(conn)
                .optional()
                .context("Failed to update user subscription")?;

            let Some(user) = user else {
                return Ok(None);
            };

            let renewal = SubscriptionRenewal::from(&new_subscription);
            let subscription = diesel::insert_into(subscriptions::table)
                .values(&new_subscription)
                .on_conflict(subscriptions::user_id)
                .do_update()
                .set(&renewal)
                .returning(Subscription::as_returning())
                .get_result(conn)
                .context("Failed to upsert subscription row")?;

            Ok(Some((user, subscription)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, test_pool};
    use crate::subscription::{period_end, PlanInterval, PRO_PLAN, PROFESSIONAL_PLAN};

    fn activation(user_id: Uuid, plan: &str) -> NewSubscription {
        let now = Utc::now();
        NewSubscription {
            id: Uuid::new_v4(),
            user_id,
            price_id: None,
            plan_name: plan.to_string(),
            status: STATUS_ACTIVE.to_string(),
            current_period_start: now,
            current_period_end: period_end(now, PlanInterval::Month),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn activation_updates_user_and_upserts_one_subscription_row() {
        let Some(pool) = test_pool() else { return };
        let user = insert_user(&pool, None);
        let repo = UserRepository::new(pool.clone());

        let (updated, first) = repo.activate_subscription(activation(user.id, PRO_PLAN)).unwrap().unwrap();
        assert_eq!(updated.subscription.as_deref(), Some(PRO_PLAN));
        assert_eq!(updated.subscription_status.as_deref(), Some(STATUS_ACTIVE));

        let (_, second) = repo
            .activate_subscription(activation(user.id, PROFESSIONAL_PLAN))
            .unwrap()
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.plan_name, PROFESSIONAL_PLAN);

        let mut conn = pool.get().unwrap();
        let rows: i64 = subscriptions::table
            .filter(subscriptions::user_id.eq(user.id))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn activation_for_unknown_user_is_none() {
        let Some(pool) = test_pool() else { return };
        let repo = UserRepository::new(pool);
        assert!(repo.activate_subscription(activation(Uuid::new_v4(), PRO_PLAN)).unwrap().is_none());
    }
}
