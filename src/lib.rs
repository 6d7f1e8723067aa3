//! Reward-accrual ledger engine: users earn coins through rate-limited
//! actions, coins convert to a euro balance at a fixed rate, and the
//! balance can be turned into a pending cash-out request.
//!
//! All balance mutations are atomic conditional statements at the
//! storage layer, so concurrent requests for the same user can never
//! lose updates or overshoot a daily quota.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::reward_usecase::{RewardExecutor, RewardReceipt};
pub use application::withdrawal_usecase::WithdrawalWorkflow;
pub use domain::catalog::{Action, ActionCatalog, ActionKind};
pub use domain::clock::Clock;
pub use domain::error::LedgerError;
pub use domain::money::{COINS_PER_EUR, MIN_WITHDRAWAL_COINS, MIN_WITHDRAWAL_EUR};
pub use domain::user_repository::{UserAccount, UserRepository};
pub use domain::withdrawal_repository::{WithdrawalRequest, WithdrawalStatus};

use domain::completion_repository::CompletionRepository;
use domain::withdrawal_repository::WithdrawalRepository;
use infrastructure::sqlite_completion_repo::SqliteCompletionRepo;
use infrastructure::sqlite_user_repo::SqliteUserRepo;
use infrastructure::sqlite_withdrawal_repo::SqliteWithdrawalRepo;
use infrastructure::system_clock::SystemClock;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        coin_balance INTEGER NOT NULL DEFAULT 0,
        balance_eur REAL NOT NULL DEFAULT 0,
        level INTEGER NOT NULL DEFAULT 1,
        last_daily_bonus TEXT
    )",
    "CREATE TABLE IF NOT EXISTS completions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        action_id TEXT NOT NULL,
        occurred_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_completions_user_action_day
        ON completions (user_id, action_id, occurred_at)",
    "CREATE TABLE IF NOT EXISTS ledger_entries (
        entry_key TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        coins INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS withdrawals (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        amount_eur REAL NOT NULL,
        coins_consumed INTEGER NOT NULL,
        destination TEXT NOT NULL,
        created_at TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
    )",
];

/// Fully wired engine: catalog, quota tracker, ledger and the two use
/// cases over one SQLite pool. This is the surface a presentation or
/// API layer calls into.
pub struct RewardLedger {
    users: Arc<dyn UserRepository>,
    withdrawals: Arc<dyn WithdrawalRepository>,
    executor: RewardExecutor,
    workflow: WithdrawalWorkflow,
}

impl RewardLedger {
    /// Connects to `database_url` (e.g. `sqlite:rewards.db?mode=rwc`),
    /// creates the schema and wires the built-in action catalog.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        Self::with_parts(pool, ActionCatalog::builtin(), Arc::new(SystemClock)).await
    }

    /// Injection point for a custom catalog or clock (tests use this to
    /// cross calendar-day boundaries).
    pub async fn with_parts(
        pool: SqlitePool,
        catalog: ActionCatalog,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        let users: Arc<dyn UserRepository> = Arc::new(SqliteUserRepo::new(pool.clone()));
        let completions: Arc<dyn CompletionRepository> =
            Arc::new(SqliteCompletionRepo::new(pool.clone()));
        let withdrawals: Arc<dyn WithdrawalRepository> =
            Arc::new(SqliteWithdrawalRepo::new(pool));

        let catalog = Arc::new(catalog);
        let executor = RewardExecutor::new(
            catalog,
            users.clone(),
            completions,
            clock.clone(),
        );
        let workflow = WithdrawalWorkflow::new(users.clone(), withdrawals.clone(), clock);

        log::info!("reward ledger ready");
        Ok(Self {
            users,
            withdrawals,
            executor,
            workflow,
        })
    }

    /// First-login entry point: returns the account, creating it with a
    /// zero balance on first sight.
    pub async fn login(&self, user_id: &str) -> Result<UserAccount, LedgerError> {
        Ok(self.users.get_or_create(user_id).await?)
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserAccount, LedgerError> {
        self.users
            .find(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    /// Completes one reward action for the user, enforcing its daily
    /// quota.
    pub async fn execute(
        &self,
        user_id: &str,
        action_id: &str,
    ) -> Result<RewardReceipt, LedgerError> {
        self.executor.execute(user_id, action_id).await
    }

    /// Converts the user's whole balance into a pending withdrawal
    /// request.
    pub async fn request_withdrawal(
        &self,
        user_id: &str,
        payout_destination: &str,
    ) -> Result<WithdrawalRequest, LedgerError> {
        self.workflow
            .request_withdrawal(user_id, payout_destination)
            .await
    }

    /// The queue an external payout process consumes.
    pub async fn pending_withdrawals(&self) -> Result<Vec<WithdrawalRequest>, LedgerError> {
        Ok(self.withdrawals.pending().await?)
    }

    /// Ledger primitive: idempotent coin credit. `coins` must be
    /// positive; `entry_key` scopes retry deduplication.
    pub async fn credit(
        &self,
        user_id: &str,
        coins: i64,
        entry_key: &str,
    ) -> Result<UserAccount, LedgerError> {
        self.users
            .credit(user_id, coins, entry_key)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    /// Ledger primitive: zeroes both balance fields atomically and
    /// returns the pre-debit coin amount.
    pub async fn debit_to_zero(&self, user_id: &str) -> Result<i64, LedgerError> {
        self.users
            .debit_to_zero(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }
}
