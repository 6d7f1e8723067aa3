use crate::domain::clock::Clock;
use crate::domain::error::LedgerError;
use crate::domain::money::{MIN_WITHDRAWAL_COINS, MIN_WITHDRAWAL_EUR};
use crate::domain::user_repository::UserRepository;
use crate::domain::withdrawal_repository::{WithdrawalRepository, WithdrawalRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Validates withdrawal eligibility and turns the whole balance into a
/// pending payout request. Request creation and balance zeroing commit
/// as one unit.
pub struct WithdrawalWorkflow {
    users: Arc<dyn UserRepository>,
    withdrawals: Arc<dyn WithdrawalRepository>,
    clock: Arc<dyn Clock>,
}

impl WithdrawalWorkflow {
    pub fn new(
        users: Arc<dyn UserRepository>,
        withdrawals: Arc<dyn WithdrawalRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            withdrawals,
            clock,
        }
    }

    pub async fn request_withdrawal(
        &self,
        user_id: &str,
        payout_destination: &str,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let destination = payout_destination.trim();
        if destination.is_empty() {
            return Err(LedgerError::EmptyDestination);
        }

        let account = self
            .users
            .find(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

        if account.balance_eur < MIN_WITHDRAWAL_EUR {
            return Err(LedgerError::BalanceTooLow {
                balance: account.balance_eur,
                minimum: MIN_WITHDRAWAL_EUR,
            });
        }

        let request_id = Uuid::new_v4().to_string();
        let created = self
            .withdrawals
            .create_pending(
                &request_id,
                user_id,
                destination,
                MIN_WITHDRAWAL_COINS,
                self.clock.now(),
            )
            .await?;

        match created {
            Some(request) => {
                log::info!(
                    "withdrawal request {} for {}: {} € ({} coins)",
                    request.id,
                    user_id,
                    request.amount_eur,
                    request.coins_consumed
                );
                Ok(request)
            }
            // The balance moved below the minimum between the check
            // and the commit.
            None => {
                let balance = self
                    .users
                    .find(user_id)
                    .await?
                    .map(|a| a.balance_eur)
                    .unwrap_or(Decimal::ZERO);
                Err(LedgerError::BalanceTooLow {
                    balance,
                    minimum: MIN_WITHDRAWAL_EUR,
                })
            }
        }
    }
}
