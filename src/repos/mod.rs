pub mod error;
pub mod role_repo;
pub mod user_repo;
