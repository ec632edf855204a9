//! Feature gating from a user's subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::user::User;
use crate::subscription::{
    includes_workflow, is_subscription_active_at, max_project_count, max_team_size, named_plan,
    FREE_PLAN, ROLE_PROJECT_MEMBER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// Available on every plan.
    Basic,
    /// Workflow board, Pro and Professional plans only.
    Workflow,
    /// Any paid plan.
    Advanced,
    #[serde(other)]
    Unknown,
}

/// Subscription fields of a user row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionProfile {
    pub plan: Option<String>,
    pub status: Option<String>,
    pub period_end: Option<DateTime<Utc>>,
    pub role: Option<String>,
}

impl From<&User> for SubscriptionProfile {
    fn from(user: &User) -> Self {
        SubscriptionProfile {
            plan: named_plan(user.subscription.as_deref()).map(str::to_string),
            status: user.subscription_status.clone(),
            period_end: user.subscription_period_end,
            role: user.user_role.clone(),
        }
    }
}

impl SubscriptionProfile {
    /// The stored plan name, `None` when blank.
    pub fn plan(&self) -> Option<&str> {
        named_plan(self.plan.as_deref())
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        is_subscription_active_at(self.status.as_deref(), self.period_end, now)
    }

    /// The plan that currently applies: `None` once the subscription lapsed.
    pub fn effective_plan_at(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.is_active_at(now) {
            self.plan()
        } else {
            None
        }
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(ROLE_PROJECT_MEMBER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_team_size: u32,
    pub max_projects: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub has_access: bool,
    pub subscription: String,
    pub is_active: bool,
    pub limits: Limits,
}

/// Decides whether `profile` may use `feature` at `now`.
pub fn check_access(
    profile: &SubscriptionProfile,
    feature: FeatureType,
    now: DateTime<Utc>,
) -> AccessDecision {
    let is_active = profile.is_active_at(now);
    let effective = profile.effective_plan_at(now);

    let has_access = match feature {
        FeatureType::Basic => true,
        FeatureType::Workflow => is_active && includes_workflow(profile.plan()),
        FeatureType::Advanced => is_active && profile.plan().is_some(),
        FeatureType::Unknown => false,
    };

    AccessDecision {
        has_access,
        subscription: profile.plan().unwrap_or(FREE_PLAN).to_string(),
        is_active,
        limits: Limits {
            max_team_size: max_team_size(effective),
            max_projects: max_project_count(effective, profile.role()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{PRO_DEV_PLAN, PRO_PLAN, ROLE_PROJECT_CREATOR, UNLIMITED};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn profile(plan: Option<&str>, expires_in: Duration, role: Option<&str>) -> SubscriptionProfile {
        SubscriptionProfile {
            plan: plan.map(str::to_string),
            status: Some("active".to_string()),
            period_end: Some(now() + expires_in),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn free_user_gets_basic_only() {
        let free = SubscriptionProfile::default();
        assert!(check_access(&free, FeatureType::Basic, now()).has_access);
        assert!(!check_access(&free, FeatureType::Workflow, now()).has_access);
        assert!(!check_access(&free, FeatureType::Advanced, now()).has_access);

        let decision = check_access(&free, FeatureType::Basic, now());
        assert_eq!(decision.subscription, "Free Plan");
        assert!(!decision.is_active);
        assert_eq!(decision.limits, Limits { max_team_size: 5, max_projects: 2 });
    }

    #[test]
    fn pro_plan_unlocks_workflow() {
        let pro = profile(Some(PRO_PLAN), Duration::days(10), Some(ROLE_PROJECT_CREATOR));
        let decision = check_access(&pro, FeatureType::Workflow, now());
        assert!(decision.has_access);
        assert!(decision.is_active);
        assert_eq!(decision.limits, Limits { max_team_size: 25, max_projects: UNLIMITED });
    }

    #[test]
    fn pro_dev_is_advanced_but_not_workflow() {
        let dev = profile(Some(PRO_DEV_PLAN), Duration::days(10), None);
        assert!(!check_access(&dev, FeatureType::Workflow, now()).has_access);
        assert!(check_access(&dev, FeatureType::Advanced, now()).has_access);
    }

    #[test]
    fn lapsed_plan_falls_back_to_free_limits() {
        let lapsed = profile(Some(PRO_PLAN), Duration::days(-1), Some(ROLE_PROJECT_CREATOR));
        let decision = check_access(&lapsed, FeatureType::Workflow, now());
        assert!(!decision.has_access);
        assert!(!decision.is_active);
        assert_eq!(decision.subscription, PRO_PLAN);
        assert_eq!(decision.limits, Limits { max_team_size: 5, max_projects: 5 });
    }

    #[test]
    fn blank_plan_reads_as_free_plan() {
        let blank = profile(Some(""), Duration::days(10), None);
        let decision = check_access(&blank, FeatureType::Advanced, now());
        assert_eq!(decision.subscription, "Free Plan");
        assert!(!decision.has_access);
        assert_eq!(decision.limits, Limits { max_team_size: 5, max_projects: 2 });
    }

    #[test]
    fn profile_from_user_drops_blank_plan() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            name: None,
            user_role: None,
            subscription: Some("   ".to_string()),
            subscription_status: Some("active".to_string()),
            subscription_period_end: Some(now() + Duration::days(3)),
            created_at: now(),
            updated_at: None,
        };
        assert_eq!(SubscriptionProfile::from(&user).plan, None);
    }

    #[test]
    fn unknown_feature_is_denied() {
        let feature: FeatureType = serde_json::from_str("\"teleport\"").unwrap();
        assert_eq!(feature, FeatureType::Unknown);
        let pro = profile(Some(PRO_PLAN), Duration::days(10), None);
        assert!(!check_access(&pro, feature, now()).has_access);
    }

    #[test]
    fn decision_serializes_camel_case() {
        let decision = check_access(&SubscriptionProfile::default(), FeatureType::Basic, now());
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["hasAccess"], true);
        assert_eq!(json["limits"]["maxTeamSize"], 5);
        assert_eq!(json["limits"]["maxProjects"], 2);
    }
}
