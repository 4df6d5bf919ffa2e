pub mod auth_ctx;
pub mod user_id;

pub use auth_ctx::AuthCtx;
pub use user_id::UserIdPath;
