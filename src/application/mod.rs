pub mod reward_usecase;
pub mod withdrawal_usecase;
