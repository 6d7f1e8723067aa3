use rust_decimal::Decimal;
use thiserror::Error;

/// Per-request outcomes of the ledger engine. The validation variants
/// are expected business results: they never mutate state and become
/// retryable once the underlying condition changes (e.g. the next day).
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown user: {0}")]
    UserNotFound(String),

    #[error("unknown action: {0}")]
    ActionNotFound(String),

    #[error("daily limit reached for {action_id}: {completed}/{cap}")]
    QuotaExceeded {
        action_id: String,
        completed: u32,
        cap: u32,
    },

    #[error("balance {balance} € is below the withdrawal minimum of {minimum} €")]
    BalanceTooLow { balance: Decimal, minimum: Decimal },

    #[error("payout destination must not be empty")]
    EmptyDestination,

    #[error("storage error: {0}")]
    Persistence(#[from] sqlx::Error),
}
