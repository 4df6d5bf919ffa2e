pub mod client;
pub mod valkey;

pub use client::{CacheClient, CacheError};
pub use valkey::ValkeyClient;
