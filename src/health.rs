//! Project health scoring.
//!
//! Folds commit cadence, test pass rate and member activity into a single
//! 0-100 score, a status band and a list of improvement suggestions.

use serde::{Deserialize, Serialize};
use std::fmt;

const COMMIT_WEIGHT: f64 = 0.5;
const TEST_WEIGHT: f64 = 0.3;
const ACTIVITY_WEIGHT: f64 = 0.2;

/// Commit figures for a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    pub count: u32,
    /// Commits created during the last week.
    pub frequency: u32,
    pub completed_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStats {
    pub total: u32,
    pub passed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub member_count: u32,
    /// Members active during the last week.
    pub active_members: u32,
    /// Join requests received during the last month.
    pub join_requests: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Critical,
    #[serde(rename = "At Risk")]
    AtRisk,
    Moderate,
    Healthy,
    Excellent,
}

impl HealthStatus {
    /// Maps a total score onto its band.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => HealthStatus::Critical,
            30..=49 => HealthStatus::AtRisk,
            50..=69 => HealthStatus::Moderate,
            70..=89 => HealthStatus::Healthy,
            _ => HealthStatus::Excellent,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Critical => "Critical",
            HealthStatus::AtRisk => "At Risk",
            HealthStatus::Moderate => "Moderate",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Excellent => "Excellent",
        }
    }

    /// CSS classes used by the web client's health badge.
    pub fn badge_class(self) -> &'static str {
        match self {
            HealthStatus::Critical => "bg-red-100 text-red-800 border-red-200",
            HealthStatus::AtRisk => "bg-orange-100 text-orange-800 border-orange-200",
            HealthStatus::Moderate => "bg-yellow-100 text-yellow-800 border-yellow-200",
            HealthStatus::Healthy => "bg-green-100 text-green-800 border-green-200",
            HealthStatus::Excellent => "bg-emerald-100 text-emerald-800 border-emerald-200",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-signal sub-scores, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub commits: u32,
    pub tests: u32,
    pub activity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthScore {
    pub score: u32,
    pub status: HealthStatus,
    pub badge_class: &'static str,
    pub suggestions: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

/// Computes the health score of a project.
pub fn calculate_health_score(
    commits: &CommitStats,
    tests: &TestStats,
    activity: &ActivityStats,
) -> HealthScore {
    let breakdown = ScoreBreakdown {
        commits: commit_score(commits),
        tests: test_score(tests),
        activity: activity_score(activity),
    };

    let weighted = f64::from(breakdown.commits) * COMMIT_WEIGHT
        + f64::from(breakdown.tests) * TEST_WEIGHT
        + f64::from(breakdown.activity) * ACTIVITY_WEIGHT;
    let score = to_score(weighted);
    let status = HealthStatus::from_score(score);

    HealthScore {
        score,
        status,
        badge_class: status.badge_class(),
        suggestions: suggestions(&breakdown, commits, tests, activity),
        breakdown,
    }
}

/// 60% weekly frequency (5 per week saturates), 40% completion rate.
pub fn commit_score(commits: &CommitStats) -> u32 {
    if commits.count == 0 {
        return 0;
    }
    let frequency = (f64::from(commits.frequency) * 20.0).min(100.0);
    let completion = ratio(commits.completed_count, commits.count) * 100.0;
    to_score(frequency * 0.6 + completion * 0.4)
}

pub fn test_score(tests: &TestStats) -> u32 {
    if tests.total == 0 {
        return 0;
    }
    to_score(ratio(tests.passed, tests.total) * 100.0)
}

/// 70% share of active members, 30% recent join requests (4 saturate).
pub fn activity_score(activity: &ActivityStats) -> u32 {
    if activity.member_count == 0 {
        return 0;
    }
    let active = ratio(activity.active_members, activity.member_count) * 100.0;
    let requests = (f64::from(activity.join_requests) * 25.0).min(100.0);
    to_score(active * 0.7 + requests * 0.3)
}

fn suggestions(
    breakdown: &ScoreBreakdown,
    commits: &CommitStats,
    tests: &TestStats,
    activity: &ActivityStats,
) -> Vec<String> {
    let mut out = Vec::new();

    if breakdown.commits < 50 {
        if commits.frequency < 3 {
            out.push("Increase commit frequency to at least 3 times per week".to_string());
        }
        if commits.count > 0 && ratio(commits.completed_count, commits.count) < 0.5 {
            out.push("Complete more pending commits".to_string());
        }
    }

    if breakdown.tests < 60 {
        if tests.total == 0 {
            out.push("Add tests to your project".to_string());
        } else if ratio(tests.passed, tests.total) < 0.7 {
            out.push("Fix failing tests to improve test pass rate".to_string());
        }
    }

    if breakdown.activity < 60 {
        if activity.member_count > 0
            && ratio(activity.active_members, activity.member_count) < 0.5
        {
            out.push("Encourage more team members to actively participate".to_string());
        }
        if activity.join_requests == 0 {
            out.push("Promote your project to attract more join requests".to_string());
        }
    }

    out
}

/// `part / whole`, capped at 1. Callers guarantee `whole > 0`.
fn ratio(part: u32, whole: u32) -> f64 {
    (f64::from(part) / f64::from(whole)).min(1.0)
}

fn to_score(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}
