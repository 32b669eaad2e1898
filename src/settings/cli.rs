use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "User center token and session service")]
pub struct Cli {
    /// Path of the settings file, without or with its `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
