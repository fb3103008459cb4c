use chrono::{DateTime, Duration, Utc};

const MAX_AGE_DAYS: i64 = 7;

/// Freshness rule for the cached feed snapshot. Pure; persistence never
/// enters into it, so the rule is testable on its own.
pub struct FeedCachePolicy;

impl FeedCachePolicy {
    /// A snapshot is fresh strictly before `timestamp + 7 days`.
    pub fn is_fresh(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now < timestamp + Duration::days(MAX_AGE_DAYS)
    }
}
