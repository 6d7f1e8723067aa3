use crate::domain::catalog::{ActionCatalog, ActionKind};
use crate::domain::clock::Clock;
use crate::domain::completion_repository::CompletionRepository;
use crate::domain::error::LedgerError;
use crate::domain::user_repository::{UserAccount, UserRepository};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one successful action completion. `completions_today`
/// includes the completion just credited and exists for display only.
#[derive(Debug, Clone)]
pub struct RewardReceipt {
    pub action_id: String,
    pub credited_coins: i64,
    pub completions_today: u32,
    pub daily_cap: u32,
    pub account: UserAccount,
}

/// Orchestrates one action-completion request: quota check, coin
/// credit, completion event. Rejections never mutate state.
pub struct RewardExecutor {
    catalog: Arc<ActionCatalog>,
    users: Arc<dyn UserRepository>,
    completions: Arc<dyn CompletionRepository>,
    clock: Arc<dyn Clock>,
}

impl RewardExecutor {
    pub fn new(
        catalog: Arc<ActionCatalog>,
        users: Arc<dyn UserRepository>,
        completions: Arc<dyn CompletionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            users,
            completions,
            clock,
        }
    }

    pub async fn execute(
        &self,
        user_id: &str,
        action_id: &str,
    ) -> Result<RewardReceipt, LedgerError> {
        let action = self
            .catalog
            .get(action_id)
            .ok_or_else(|| LedgerError::ActionNotFound(action_id.to_string()))?;

        // Resolve the user up front so a missing account never leaves
        // stray completion events behind.
        self.users
            .find(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

        let now = self.clock.now();
        let today = now.date_naive();

        match action.kind {
            ActionKind::OnceDaily => {
                let account = self
                    .users
                    .grant_daily_bonus(user_id, action.payout_coins, today)
                    .await?
                    .ok_or_else(|| LedgerError::QuotaExceeded {
                        action_id: action.id.clone(),
                        completed: 1,
                        cap: 1,
                    })?;

                log::info!(
                    "daily bonus: +{} coins for {} ({})",
                    action.payout_coins,
                    user_id,
                    today
                );
                Ok(RewardReceipt {
                    action_id: action.id.clone(),
                    credited_coins: action.payout_coins,
                    completions_today: 1,
                    daily_cap: 1,
                    account,
                })
            }
            ActionKind::RateLimited { cap } => {
                let before = self.completions.count_on_day(user_id, action_id, today).await?;
                if before >= cap {
                    return Err(LedgerError::QuotaExceeded {
                        action_id: action.id.clone(),
                        completed: before,
                        cap,
                    });
                }

                // The event is appended first and doubles as the credit's
                // idempotency key: a partial failure leaves a detectable
                // credit-less event, and a replayed credit for the same
                // completion cannot apply twice.
                let completion_id = Uuid::new_v4().to_string();
                let recorded = self
                    .completions
                    .record_if_under_cap(&completion_id, user_id, action_id, cap, now)
                    .await?;
                if !recorded {
                    // A concurrent call took the last slot.
                    return Err(LedgerError::QuotaExceeded {
                        action_id: action.id.clone(),
                        completed: cap,
                        cap,
                    });
                }

                let account = self
                    .users
                    .credit(user_id, action.payout_coins, &completion_id)
                    .await?
                    .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

                log::info!(
                    "action {}: +{} coins for {} ({}/{} today)",
                    action.id,
                    action.payout_coins,
                    user_id,
                    before + 1,
                    cap
                );
                Ok(RewardReceipt {
                    action_id: action.id.clone(),
                    credited_coins: action.payout_coins,
                    completions_today: before + 1,
                    daily_cap: cap,
                    account,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Action;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn account() -> UserAccount {
        UserAccount {
            id: "u1".to_string(),
            coin_balance: 0,
            balance_eur: Decimal::ZERO,
            level: 1,
            last_daily_bonus: None,
        }
    }

    struct MockUsers {
        bonus_taken: bool,
        credits: AtomicU32,
    }

    #[async_trait]
    impl UserRepository for MockUsers {
        async fn get_or_create(&self, _user_id: &str) -> Result<UserAccount, sqlx::Error> {
            Ok(account())
        }

        async fn find(&self, _user_id: &str) -> Result<Option<UserAccount>, sqlx::Error> {
            Ok(Some(account()))
        }

        async fn credit(
            &self,
            _user_id: &str,
            _coins: i64,
            _entry_key: &str,
        ) -> Result<Option<UserAccount>, sqlx::Error> {
            self.credits.fetch_add(1, Ordering::SeqCst);
            Ok(Some(account()))
        }

        async fn grant_daily_bonus(
            &self,
            _user_id: &str,
            _coins: i64,
            _day: NaiveDate,
        ) -> Result<Option<UserAccount>, sqlx::Error> {
            if self.bonus_taken {
                return Ok(None);
            }
            self.credits.fetch_add(1, Ordering::SeqCst);
            Ok(Some(account()))
        }

        async fn debit_to_zero(&self, _user_id: &str) -> Result<Option<i64>, sqlx::Error> {
            Ok(Some(0))
        }
    }

    struct MockCompletions {
        today: u32,
        admit: bool,
        recorded: AtomicU32,
    }

    #[async_trait]
    impl CompletionRepository for MockCompletions {
        async fn count_on_day(
            &self,
            _user_id: &str,
            _action_id: &str,
            _day: NaiveDate,
        ) -> Result<u32, sqlx::Error> {
            Ok(self.today)
        }

        async fn record_if_under_cap(
            &self,
            _completion_id: &str,
            _user_id: &str,
            _action_id: &str,
            _cap: u32,
            _occurred_at: DateTime<Utc>,
        ) -> Result<bool, sqlx::Error> {
            if self.admit {
                self.recorded.fetch_add(1, Ordering::SeqCst);
            }
            Ok(self.admit)
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
        }
    }

    fn catalog() -> Arc<ActionCatalog> {
        Arc::new(ActionCatalog::new(vec![
            Action {
                id: "tap".to_string(),
                payout_coins: 50,
                kind: ActionKind::RateLimited { cap: 10 },
            },
            Action {
                id: "bonus".to_string(),
                payout_coins: 200,
                kind: ActionKind::OnceDaily,
            },
        ]))
    }

    fn executor(users: Arc<MockUsers>, completions: Arc<MockCompletions>) -> RewardExecutor {
        RewardExecutor::new(catalog(), users, completions, Arc::new(FixedClock))
    }

    #[tokio::test]
    async fn credits_and_reports_the_new_count() {
        let users = Arc::new(MockUsers {
            bonus_taken: false,
            credits: AtomicU32::new(0),
        });
        let completions = Arc::new(MockCompletions {
            today: 3,
            admit: true,
            recorded: AtomicU32::new(0),
        });

        let receipt = executor(users.clone(), completions.clone())
            .execute("u1", "tap")
            .await
            .unwrap();

        assert_eq!(receipt.credited_coins, 50);
        assert_eq!(receipt.completions_today, 4);
        assert_eq!(receipt.daily_cap, 10);
        assert_eq!(users.credits.load(Ordering::SeqCst), 1);
        assert_eq!(completions.recorded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quota_rejection_credits_nothing() {
        let users = Arc::new(MockUsers {
            bonus_taken: false,
            credits: AtomicU32::new(0),
        });
        let completions = Arc::new(MockCompletions {
            today: 10,
            admit: true,
            recorded: AtomicU32::new(0),
        });

        let err = executor(users.clone(), completions.clone())
            .execute("u1", "tap")
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::QuotaExceeded { completed: 10, cap: 10, .. }));
        assert_eq!(users.credits.load(Ordering::SeqCst), 0);
        assert_eq!(completions.recorded.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn losing_the_last_slot_rejects_without_credit() {
        let users = Arc::new(MockUsers {
            bonus_taken: false,
            credits: AtomicU32::new(0),
        });
        let completions = Arc::new(MockCompletions {
            today: 9,
            admit: false,
            recorded: AtomicU32::new(0),
        });

        let err = executor(users.clone(), completions)
            .execute("u1", "tap")
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::QuotaExceeded { .. }));
        assert_eq!(users.credits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_daily_bonus_rejects() {
        let users = Arc::new(MockUsers {
            bonus_taken: true,
            credits: AtomicU32::new(0),
        });
        let completions = Arc::new(MockCompletions {
            today: 0,
            admit: true,
            recorded: AtomicU32::new(0),
        });

        let err = executor(users.clone(), completions)
            .execute("u1", "bonus")
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::QuotaExceeded { completed: 1, cap: 1, .. }));
        assert_eq!(users.credits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let users = Arc::new(MockUsers {
            bonus_taken: false,
            credits: AtomicU32::new(0),
        });
        let completions = Arc::new(MockCompletions {
            today: 0,
            admit: true,
            recorded: AtomicU32::new(0),
        });

        let err = executor(users, completions)
            .execute("u1", "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::ActionNotFound(_)));
    }
}
