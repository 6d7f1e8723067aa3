use chrono::{DateTime, Utc};

/// Time source for the engine. All "today" decisions (daily bonus,
/// rolling quotas) use the UTC calendar date of `now()`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
