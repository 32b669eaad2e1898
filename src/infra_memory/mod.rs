//! In-process backends: the self-expiring store used for local caches and
//! sessions, plus durable-store stand-ins for running without MySQL.

mod expiring_store;
mod session_store_memory;
mod token_cache_local;
mod token_store_memory;
mod user_repo_memory;

pub use expiring_store::*;
pub use session_store_memory::*;
pub use token_cache_local::*;
pub use token_store_memory::*;
pub use user_repo_memory::*;
