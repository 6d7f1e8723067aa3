pub mod catalog;
pub mod clock;
pub mod completion_repository;
pub mod error;
pub mod money;
pub mod user_repository;
pub mod withdrawal_repository;
