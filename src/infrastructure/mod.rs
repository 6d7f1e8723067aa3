pub mod sqlite_completion_repo;
pub mod sqlite_user_repo;
pub mod sqlite_withdrawal_repo;
pub mod system_clock;
