//! Subscription expiry reminders.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::models::user::User;

/// Reminders go out while this many days or fewer remain.
pub const NOTICE_WINDOW_DAYS: i64 = 2;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryNotice {
    pub user_id: Uuid,
    pub email: String,
    pub subscription: Option<String>,
    pub expiry_date: DateTime<Utc>,
    pub days_remaining: i64,
}

/// Whole days left before `expiry`, rounded up. Zero or negative once expired.
pub fn days_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (expiry - now).num_milliseconds();
    ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0)
}

pub fn should_notify(days: i64) -> bool {
    days > 0 && days <= NOTICE_WINDOW_DAYS
}

/// Bounds `(after, before)` of the expiry dates a sweep at `now` looks for.
pub fn sweep_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(NOTICE_WINDOW_DAYS))
}

/// Builds a notice for `user`, or `None` if it is outside the window.
pub fn notice_for(user: &User, now: DateTime<Utc>) -> Option<ExpiryNotice> {
    let expiry = user.subscription_period_end?;
    let days = days_remaining(expiry, now);
    should_notify(days).then(|| ExpiryNotice {
        user_id: user.id,
        email: user.email.clone(),
        subscription: user.subscription.clone(),
        expiry_date: expiry,
        days_remaining: days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn user(expires: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            name: None,
            user_role: None,
            subscription: Some("Pro Plan".to_string()),
            subscription_status: Some("active".to_string()),
            subscription_period_end: expires,
            created_at: now(),
            updated_at: None,
        }
    }

    #[test]
    fn days_round_up() {
        assert_eq!(days_remaining(now() + Duration::minutes(1), now()), 1);
        assert_eq!(days_remaining(now() + Duration::days(1), now()), 1);
        assert_eq!(days_remaining(now() + Duration::hours(25), now()), 2);
        assert_eq!(days_remaining(now(), now()), 0);
        assert_eq!(days_remaining(now() - Duration::hours(1), now()), 0);
        assert_eq!(days_remaining(now() - Duration::hours(25), now()), -1);
    }

    #[test]
    fn notify_window_is_one_or_two_days() {
        assert!(!should_notify(0));
        assert!(should_notify(1));
        assert!(should_notify(2));
        assert!(!should_notify(3));
        assert!(!should_notify(-4));
    }

    #[test]
    fn notice_only_inside_window() {
        let soon = user(Some(now() + Duration::hours(30)));
        let notice = notice_for(&soon, now()).expect("expiring user gets a notice");
        assert_eq!(notice.days_remaining, 2);
        assert_eq!(notice.email, "dev@example.com");

        assert!(notice_for(&user(Some(now() + Duration::days(5))), now()).is_none());
        assert!(notice_for(&user(Some(now() - Duration::days(1))), now()).is_none());
        assert!(notice_for(&user(None), now()).is_none());
    }

    #[test]
    fn sweep_window_spans_two_days() {
        let (after, before) = sweep_window(now());
        assert_eq!(after, now());
        assert_eq!(before - after, Duration::days(2));
    }
}
