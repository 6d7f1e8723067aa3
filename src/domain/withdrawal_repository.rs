use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WithdrawalStatus::Pending),
            "approved" => Some(WithdrawalStatus::Approved),
            "rejected" => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }
}

/// Durable intent to pay out a balance. Created by the core; the
/// approved/rejected transitions belong to the external payout process.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalRequest {
    pub id: String,
    pub user_id: String,
    /// Euro value of the balance at request time.
    pub amount_eur: Decimal,
    /// Coin balance consumed by the request.
    pub coins_consumed: i64,
    pub destination: String,
    pub created_at: DateTime<Utc>,
    pub status: WithdrawalStatus,
}

#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    /// In one transaction: snapshots the user's current balance into a
    /// pending request (only while `coin_balance >= min_coins`) and
    /// zeroes the balance. A credit can commit before the snapshot or
    /// after it, never in between. `None` when the threshold no longer
    /// holds at commit time or the user is gone.
    async fn create_pending(
        &self,
        request_id: &str,
        user_id: &str,
        destination: &str,
        min_coins: i64,
        requested_at: DateTime<Utc>,
    ) -> Result<Option<WithdrawalRequest>, sqlx::Error>;

    /// The queue the external payout process works through.
    async fn pending(&self) -> Result<Vec<WithdrawalRequest>, sqlx::Error>;
}
