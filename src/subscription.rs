//! Subscription tiers and the limits they grant.
//!
//! Plans are identified by the display name stored on the user row. A
//! missing or unknown plan behaves like the free tier.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

pub const PRO_PLAN: &str = "Pro Plan";
pub const PROFESSIONAL_PLAN: &str = "Professional Plan";
pub const PROFESSIONAL_ANNUAL_PLAN: &str = "Professional Annual Plan";
pub const PRO_DEV_PLAN: &str = "Pro Dev Plan";
pub const FREE_PLAN: &str = "Free Plan";

pub const ROLE_PROJECT_CREATOR: &str = "project_creator";
pub const ROLE_PROJECT_MEMBER: &str = "project_member";

pub const STATUS_ACTIVE: &str = "active";

/// Project limit meaning "no limit".
pub const UNLIMITED: i32 = -1;

const FREE_TEAM_SIZE: u32 = 5;
const FREE_CREATOR_PROJECTS: i32 = 5;
const FREE_MEMBER_PROJECTS: i32 = 2;

/// Treats a blank plan name as no plan at all.
pub fn named_plan(plan: Option<&str>) -> Option<&str> {
    plan.filter(|name| !name.trim().is_empty())
}

/// Maximum team size allowed on a project owned by a user on `plan`.
pub fn max_team_size(plan: Option<&str>) -> u32 {
    match plan {
        Some(PRO_PLAN) => 25,
        Some(PROFESSIONAL_PLAN) | Some(PROFESSIONAL_ANNUAL_PLAN) => 50,
        // Pro Dev lifts the project cap, not the team size.
        _ => FREE_TEAM_SIZE,
    }
}

/// Maximum number of projects, or [`UNLIMITED`].
pub fn max_project_count(plan: Option<&str>, role: &str) -> i32 {
    let plan = named_plan(plan);
    if plan == Some(PRO_DEV_PLAN) {
        return UNLIMITED;
    }

    if role == ROLE_PROJECT_CREATOR {
        match plan {
            Some(PRO_PLAN) | Some(PROFESSIONAL_PLAN) | Some(PROFESSIONAL_ANNUAL_PLAN) => UNLIMITED,
            _ => FREE_CREATOR_PROJECTS,
        }
    } else if plan.is_some() {
        UNLIMITED
    } else {
        FREE_MEMBER_PROJECTS
    }
}

/// Whether a user with `owned` projects may create another one.
pub fn can_create_project(plan: Option<&str>, role: &str, owned: u32) -> bool {
    let limit = max_project_count(plan, role);
    limit == UNLIMITED || i64::from(owned) < i64::from(limit)
}

/// Clamps a requested team size into `1..=max_team_size(plan)`.
pub fn clamp_team_size(requested: u32, plan: Option<&str>) -> u32 {
    requested.clamp(1, max_team_size(plan))
}

/// Plans that unlock the workflow board.
pub fn includes_workflow(plan: Option<&str>) -> bool {
    matches!(
        plan,
        Some(PRO_PLAN) | Some(PROFESSIONAL_PLAN) | Some(PROFESSIONAL_ANNUAL_PLAN)
    )
}

pub fn is_subscription_active(status: Option<&str>, expiry: Option<DateTime<Utc>>) -> bool {
    is_subscription_active_at(status, expiry, Utc::now())
}

/// A subscription is active when its status is `active` and it expires
/// strictly after `now`.
pub fn is_subscription_active_at(
    status: Option<&str>,
    expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (status, expiry) {
        (Some(STATUS_ACTIVE), Some(expiry)) => now < expiry,
        _ => false,
    }
}

/// Billing interval of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
    Month,
    Year,
}

/// End of a billing period starting at `start`. Day-of-month overflow is
/// clamped to the last day of the target month.
pub fn period_end(start: DateTime<Utc>, interval: PlanInterval) -> DateTime<Utc> {
    let months = match interval {
        PlanInterval::Month => Months::new(1),
        PlanInterval::Year => Months::new(12),
    };
    start.checked_add_months(months).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn team_size_per_plan() {
        assert_eq!(max_team_size(Some("Pro Plan")), 25);
        assert_eq!(max_team_size(Some("Professional Plan")), 50);
        assert_eq!(max_team_size(Some("Professional Annual Plan")), 50);
        assert_eq!(max_team_size(Some("Pro Dev Plan")), 5);
        assert_eq!(max_team_size(Some("Enterprise")), 5);
        assert_eq!(max_team_size(None), 5);
    }

    #[test]
    fn project_count_for_creators() {
        assert_eq!(max_project_count(None, ROLE_PROJECT_CREATOR), 5);
        assert_eq!(max_project_count(Some("Pro Plan"), ROLE_PROJECT_CREATOR), UNLIMITED);
        assert_eq!(
            max_project_count(Some("Professional Annual Plan"), ROLE_PROJECT_CREATOR),
            UNLIMITED
        );
        assert_eq!(max_project_count(Some("Mystery Plan"), ROLE_PROJECT_CREATOR), 5);
    }

    #[test]
    fn project_count_for_members() {
        assert_eq!(max_project_count(None, ROLE_PROJECT_MEMBER), 2);
        assert_eq!(max_project_count(Some("Mystery Plan"), ROLE_PROJECT_MEMBER), UNLIMITED);
        assert_eq!(max_project_count(None, ""), 2);
    }

    #[test]
    fn blank_plan_counts_as_free() {
        assert_eq!(named_plan(Some("  ")), None);
        assert_eq!(named_plan(Some(PRO_PLAN)), Some(PRO_PLAN));
        assert_eq!(max_project_count(Some(""), ROLE_PROJECT_MEMBER), 2);
        assert_eq!(max_project_count(Some(" "), ROLE_PROJECT_CREATOR), 5);
    }

    #[test]
    fn pro_dev_is_unlimited_for_any_role() {
        for role in [ROLE_PROJECT_CREATOR, ROLE_PROJECT_MEMBER, "anything"] {
            assert_eq!(max_project_count(Some("Pro Dev Plan"), role), UNLIMITED);
        }
    }

    #[test]
    fn project_creation_gate() {
        assert!(can_create_project(None, ROLE_PROJECT_CREATOR, 4));
        assert!(!can_create_project(None, ROLE_PROJECT_CREATOR, 5));
        assert!(!can_create_project(None, ROLE_PROJECT_MEMBER, 2));
        assert!(can_create_project(Some(PRO_DEV_PLAN), ROLE_PROJECT_MEMBER, 500));
    }

    #[test]
    fn team_size_clamped_to_plan() {
        assert_eq!(clamp_team_size(40, None), 5);
        assert_eq!(clamp_team_size(40, Some(PRO_PLAN)), 25);
        assert_eq!(clamp_team_size(40, Some(PROFESSIONAL_PLAN)), 40);
        assert_eq!(clamp_team_size(0, Some(PRO_PLAN)), 1);
    }

    #[test]
    fn active_needs_status_and_future_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let future = Some(now + Duration::days(3));
        let past = Some(now - Duration::seconds(1));

        assert!(is_subscription_active_at(Some("active"), future, now));
        assert!(!is_subscription_active_at(Some("active"), past, now));
        assert!(!is_subscription_active_at(Some("active"), Some(now), now));
        assert!(!is_subscription_active_at(Some("canceled"), future, now));
        assert!(!is_subscription_active_at(None, future, now));
        assert!(!is_subscription_active_at(Some("active"), None, now));
    }

    #[test]
    fn active_against_wall_clock() {
        let future = Some(Utc::now() + Duration::days(30));
        assert!(is_subscription_active(Some("active"), future));
        assert!(!is_subscription_active(None, future));
    }

    #[test]
    fn period_end_adds_calendar_units() {
        let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap();
        assert_eq!(
            period_end(jan31, PlanInterval::Month),
            Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap()
        );
        assert_eq!(
            period_end(jan31, PlanInterval::Year),
            Utc.with_ymd_and_hms(2025, 1, 31, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn workflow_plans() {
        assert!(includes_workflow(Some(PRO_PLAN)));
        assert!(includes_workflow(Some(PROFESSIONAL_ANNUAL_PLAN)));
        assert!(!includes_workflow(Some(PRO_DEV_PLAN)));
        assert!(!includes_workflow(None));
    }
}
