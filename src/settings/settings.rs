use crate::application_port::AuthConfig;
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub auth: Auth,
    pub log: Log,
    pub store: Store,
    pub redis: Option<Redis>,
}

/// Lifetimes are in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub node_identity: u16,
    pub token_expires_in: u64,
    pub pre_token_expire_in: u64,
    pub session_expires_in: u64,
    pub in_memory_cache_expire_in: u64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            node_identity: 0,
            token_expires_in: 7 * 24 * 60 * 60,     // one week
            pre_token_expire_in: 2 * 60 * 60,       // two hours
            session_expires_in: 24 * 60 * 60,       // one day
            in_memory_cache_expire_in: 2 * 60 * 60, // two hours
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "mysql" or "memory"
    #[serde(default)]
    pub mysql_dsn: String,
    #[serde(default = "default_user_table_name")]
    pub user_table_name: String,
    #[serde(default = "default_token_table_name")]
    pub token_table_name: String,
}

/// Present only when an external cache is configured.
#[derive(Debug, Deserialize)]
pub struct Redis {
    pub dsn: String,
}

fn default_user_table_name() -> String {
    "uc_users".to_string()
}

fn default_token_table_name() -> String {
    "uc_user_token".to_string()
}

impl Auth {
    pub fn to_config(&self) -> AuthConfig {
        AuthConfig {
            token_expires_in: Duration::from_secs(self.token_expires_in),
            pre_token_expire_in: Duration::from_secs(self.pre_token_expire_in),
            session_expires_in: Duration::from_secs(self.session_expires_in),
        }
    }

    pub fn in_memory_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.in_memory_cache_expire_in)
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow!(e))
    }

    #[test]
    fn defaults_fill_missing_lifetimes() {
        let settings = from_toml(
            r#"
[auth]
node_identity = 3

[log]
filter = "info"

[store]
backend = "memory"
"#,
        )
        .unwrap();

        assert!(settings.redis.is_none());
        assert_eq!(settings.auth.node_identity, 3);
        assert_eq!(settings.store.token_table_name, "uc_user_token");
        let config = settings.auth.to_config();
        assert_eq!(config.token_expires_in, Duration::from_secs(604_800));
        assert_eq!(config.pre_token_expire_in, Duration::from_secs(7_200));
        assert_eq!(settings.auth.in_memory_cache_ttl(), Duration::from_secs(7_200));
    }

    #[test]
    fn redis_section_selects_external_cache() {
        let settings = from_toml(
            r#"
[log]
filter = "debug"

[store]
backend = "mysql"
mysql_dsn = "mysql://u:p@localhost/ucenter"

[redis]
dsn = "redis://127.0.0.1:6379"
"#,
        )
        .unwrap();

        assert_eq!(settings.redis.unwrap().dsn, "redis://127.0.0.1:6379");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("")).is_err());
    }
}
