mod session_store_redis;
mod token_store_redis;

pub use session_store_redis::*;
pub use token_store_redis::*;
