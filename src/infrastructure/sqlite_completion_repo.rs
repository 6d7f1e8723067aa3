use crate::domain::completion_repository::CompletionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteCompletionRepo {
    pub pool: SqlitePool,
}

impl SqliteCompletionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// RFC 3339 bounds of one UTC calendar day, `[00:00, next 00:00)`.
/// Fixed-width UTC timestamps compare correctly as text.
fn day_bounds(day: NaiveDate) -> (String, String) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1);
    (start.to_rfc3339(), end.to_rfc3339())
}

#[async_trait]
impl CompletionRepository for SqliteCompletionRepo {
    async fn count_on_day(
        &self,
        user_id: &str,
        action_id: &str,
        day: NaiveDate,
    ) -> Result<u32, sqlx::Error> {
        let (start, end) = day_bounds(day);

        let row = sqlx::query(
            "SELECT COUNT(*) FROM completions \
             WHERE user_id = ?1 AND action_id = ?2 AND occurred_at >= ?3 AND occurred_at < ?4",
        )
        .bind(user_id)
        .bind(action_id)
        .bind(&start)
        .bind(&end)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get(0)?;
        Ok(count as u32)
    }

    async fn record_if_under_cap(
        &self,
        completion_id: &str,
        user_id: &str,
        action_id: &str,
        cap: u32,
        occurred_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let (start, end) = day_bounds(occurred_at.date_naive());

        // Count and insert are one statement, so the cap holds even
        // when concurrent calls race for the last slot.
        let inserted = sqlx::query(
            "INSERT INTO completions (id, user_id, action_id, occurred_at) \
             SELECT ?1, ?2, ?3, ?4 \
             WHERE (SELECT COUNT(*) FROM completions \
                    WHERE user_id = ?2 AND action_id = ?3 \
                    AND occurred_at >= ?5 AND occurred_at < ?6) < ?7",
        )
        .bind(completion_id)
        .bind(user_id)
        .bind(action_id)
        .bind(occurred_at.to_rfc3339())
        .bind(&start)
        .bind(&end)
        .bind(cap as i64)
        .execute(&self.pool)
        .await?;

        Ok(inserted.rows_affected() > 0)
    }
}
