//! Global `tracing` setup. Bootstraps before settings are read and reloads
//! its filter from the `[log]` section afterwards.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
