use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: String,
    pub coin_balance: i64,
    /// Always `coin_balance / 10_000`; derived, never drifted.
    pub balance_eur: Decimal,
    /// Informational, owned by the progression system.
    pub level: i64,
    /// UTC calendar date of the last daily-bonus grant.
    pub last_daily_bonus: Option<NaiveDate>,
}

/// User record store and ledger primitives. Every balance mutation is
/// an atomic conditional statement at the storage layer, never a
/// read-then-write round trip.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// First-login provisioning: creates the account with a zero
    /// balance if it does not exist yet. Idempotent.
    async fn get_or_create(&self, user_id: &str) -> Result<UserAccount, sqlx::Error>;

    async fn find(&self, user_id: &str) -> Result<Option<UserAccount>, sqlx::Error>;

    /// Adds `coins` (positive, validated by the caller) to the balance
    /// and recomputes the euro value in the same statement. `entry_key`
    /// scopes idempotency: a replay with a key that already committed
    /// applies nothing and returns the current account. `None` when the
    /// user does not exist.
    async fn credit(
        &self,
        user_id: &str,
        coins: i64,
        entry_key: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error>;

    /// Credits the bonus and stamps `last_daily_bonus = day` in one
    /// conditional statement. `None` when the bonus was already granted
    /// on `day`.
    async fn grant_daily_bonus(
        &self,
        user_id: &str,
        coins: i64,
        day: NaiveDate,
    ) -> Result<Option<UserAccount>, sqlx::Error>;

    /// Atomically zeroes both balance fields and returns the pre-debit
    /// coin amount. `None` when the user does not exist.
    async fn debit_to_zero(&self, user_id: &str) -> Result<Option<i64>, sqlx::Error>;
}
