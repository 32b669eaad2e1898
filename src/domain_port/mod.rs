// store

mod session_store;
mod token_cache;
mod token_store;

pub use session_store::*;
pub use token_cache::*;
pub use token_store::*;

// repo

mod user_repo;

pub use user_repo::*;
