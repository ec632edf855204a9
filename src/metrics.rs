//! Builds health-score inputs from stored rows.

use chrono::{DateTime, Duration, Months, Utc};

use crate::db::models::commit::Commit;
use crate::db::models::join_request::JoinRequest;
use crate::db::models::project_member::ProjectMember;
use crate::health::{ActivityStats, CommitStats, TestStats};

/// Start of the window counted as "this week".
pub fn week_ago(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(7)
}

/// Start of the window counted as "this month", one calendar month back.
/// A day missing from the previous month clamps to its last day (Mar 31 gives
/// Feb 29), where the web client's `setMonth` rolls forward into March.
pub fn month_ago(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(1)).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn commit_stats(commits: &[Commit], now: DateTime<Utc>) -> CommitStats {
    let since = week_ago(now);
    CommitStats {
        count: saturating_len(commits.len()),
        frequency: saturating_len(commits.iter().filter(|c| c.created_at > since).count()),
        completed_count: saturating_len(commits.iter().filter(|c| c.is_completed()).count()),
    }
}

/// No per-member activity is recorded, so every member counts as active.
pub fn activity_stats(
    members: &[ProjectMember],
    join_requests: &[JoinRequest],
    now: DateTime<Utc>,
) -> ActivityStats {
    let since = month_ago(now);
    let member_count = saturating_len(members.len());
    ActivityStats {
        member_count,
        active_members: member_count,
        join_requests: saturating_len(
            join_requests.iter().filter(|r| r.created_at >= since).count(),
        ),
    }
}

/// Test results are not stored; the configured figures stand in for them.
pub fn assumed_test_stats(total: u32, passed: u32) -> TestStats {
    TestStats {
        total,
        passed: passed.min(total),
    }
}

fn saturating_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
