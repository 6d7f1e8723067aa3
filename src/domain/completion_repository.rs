use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Append-only store of completion events, queried per UTC calendar
/// day. "Today" matches the event's date component, not a rolling
/// 24-hour window.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// How many times (user, action) completed on `day`. Pure read.
    async fn count_on_day(
        &self,
        user_id: &str,
        action_id: &str,
        day: NaiveDate,
    ) -> Result<u32, sqlx::Error>;

    /// Appends one completion event, but only while today's count is
    /// still under `cap` — check and insert are a single statement, so
    /// concurrent callers can never push the count past the cap.
    /// Returns whether the event was recorded.
    async fn record_if_under_cap(
        &self,
        completion_id: &str,
        user_id: &str,
        action_id: &str,
        cap: u32,
        occurred_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>;
}
