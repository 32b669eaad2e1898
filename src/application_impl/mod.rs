mod password_hasher;
mod session_authority;
mod token_issuer;

pub use password_hasher::*;
pub use session_authority::*;
pub use token_issuer::*;
