use crate::domain::money::eur_from_coins;
use crate::domain::withdrawal_repository::{
    WithdrawalRepository, WithdrawalRequest, WithdrawalStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub struct SqliteWithdrawalRepo {
    pub pool: SqlitePool,
}

impl SqliteWithdrawalRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WithdrawalRepository for SqliteWithdrawalRepo {
    async fn create_pending(
        &self,
        request_id: &str,
        user_id: &str,
        destination: &str,
        min_coins: i64,
        requested_at: DateTime<Utc>,
    ) -> Result<Option<WithdrawalRequest>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // The insert snapshots the live balance and takes the write
        // lock; the zeroing below sees exactly the snapshotted value.
        let inserted = sqlx::query(
            "INSERT INTO withdrawals \
             (id, user_id, amount_eur, coins_consumed, destination, created_at, status) \
             SELECT ?1, id, coin_balance / 10000.0, coin_balance, ?2, ?3, 'pending' \
             FROM users WHERE id = ?4 AND coin_balance >= ?5",
        )
        .bind(request_id)
        .bind(destination)
        .bind(requested_at.to_rfc3339())
        .bind(user_id)
        .bind(min_coins)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("UPDATE users SET coin_balance = 0, balance_eur = 0 WHERE id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            "SELECT id, user_id, coins_consumed, destination, created_at, status \
             FROM withdrawals WHERE id = ?1",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;
        let request = map_request(&row)?;

        tx.commit().await?;
        Ok(Some(request))
    }

    async fn pending(&self) -> Result<Vec<WithdrawalRequest>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, user_id, coins_consumed, destination, created_at, status \
             FROM withdrawals WHERE status = 'pending' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_request).collect()
    }
}

fn map_request(row: &SqliteRow) -> Result<WithdrawalRequest, sqlx::Error> {
    let coins_consumed: i64 = row.try_get("coins_consumed")?;
    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);

    let status: String = row.try_get("status")?;
    let status = WithdrawalStatus::parse(&status).ok_or_else(|| {
        sqlx::Error::Decode(format!("unknown withdrawal status: {}", status).into())
    })?;

    Ok(WithdrawalRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        amount_eur: eur_from_coins(coins_consumed),
        coins_consumed,
        destination: row.try_get("destination")?,
        created_at,
        status,
    })
}
