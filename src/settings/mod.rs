//! Settings are read from a TOML file through `config`; `--settings`
//! overrides the default path. See `bin/settings_demo.rs`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
