use crate::domain::money::eur_from_coins;
use crate::domain::user_repository::{UserAccount, UserRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const DATE_FMT: &str = "%Y-%m-%d";

pub struct SqliteUserRepo {
    pub pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch<'e, E>(executor: E, user_id: &str) -> Result<Option<UserAccount>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(
            "SELECT id, coin_balance, level, last_daily_bonus FROM users WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        row.map(|r| map_user(&r)).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepo {
    async fn get_or_create(&self, user_id: &str) -> Result<UserAccount, sqlx::Error> {
        let inserted = sqlx::query("INSERT OR IGNORE INTO users (id) VALUES (?1)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if inserted.rows_affected() > 0 {
            log::info!("provisioned new user account {}", user_id);
        }

        // The row exists now in either case.
        Self::fetch(&self.pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn find(&self, user_id: &str) -> Result<Option<UserAccount>, sqlx::Error> {
        Self::fetch(&self.pool, user_id).await
    }

    async fn credit(
        &self,
        user_id: &str,
        coins: i64,
        entry_key: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // The journal row is the idempotency guard: a replayed key is
        // ignored and the balance stays untouched.
        let entry = sqlx::query(
            "INSERT OR IGNORE INTO ledger_entries (entry_key, user_id, coins) VALUES (?1, ?2, ?3)",
        )
        .bind(entry_key)
        .bind(user_id)
        .bind(coins)
        .execute(&mut *tx)
        .await?;

        if entry.rows_affected() > 0 {
            let updated = sqlx::query(
                "UPDATE users SET coin_balance = coin_balance + ?1, \
                 balance_eur = (coin_balance + ?1) / 10000.0 WHERE id = ?2",
            )
            .bind(coins)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(None);
            }
        }

        let account = Self::fetch(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn grant_daily_bonus(
        &self,
        user_id: &str,
        coins: i64,
        day: NaiveDate,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        let day = day.format(DATE_FMT).to_string();

        // Credit and date stamp commit together; the condition makes a
        // second grant on the same day a no-op.
        let granted = sqlx::query(
            "UPDATE users SET coin_balance = coin_balance + ?1, \
             balance_eur = (coin_balance + ?1) / 10000.0, last_daily_bonus = ?2 \
             WHERE id = ?3 AND (last_daily_bonus IS NULL OR last_daily_bonus <> ?2)",
        )
        .bind(coins)
        .bind(&day)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if granted.rows_affected() == 0 {
            return Ok(None);
        }
        Self::fetch(&self.pool, user_id).await
    }

    async fn debit_to_zero(&self, user_id: &str) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Writing first takes the SQLite write lock, so no concurrent
        // credit can land between the read below and the commit.
        let touched = sqlx::query("UPDATE users SET balance_eur = 0 WHERE id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query("SELECT coin_balance FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        let coins: i64 = row.try_get(0)?;

        sqlx::query("UPDATE users SET coin_balance = 0 WHERE id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(coins))
    }
}

fn map_user(row: &SqliteRow) -> Result<UserAccount, sqlx::Error> {
    let coin_balance: i64 = row.try_get("coin_balance")?;
    let last: Option<String> = row.try_get("last_daily_bonus")?;
    let last_daily_bonus = last
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FMT))
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(UserAccount {
        id: row.try_get("id")?,
        coin_balance,
        balance_eur: eur_from_coins(coin_balance),
        level: row.try_get("level")?,
        last_daily_bonus,
    })
}
