use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Owns the wired authority plus the resources that need closing.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    token_cache: Option<Arc<LocalTokenCache>>,
    session_cache: Option<Arc<MemorySessionStore>>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        if settings.redis.is_none() {
            check_local_ttls(settings)?;
        }

        let auth_config = settings.auth.to_config();
        let token_issuer: Arc<dyn TokenIssuer> =
            Arc::new(Sha256TokenIssuer::new(settings.auth.node_identity)?);
        let credential_hasher: Arc<dyn CredentialHasher> =
            Arc::new(Argon2PasswordHasher::default());

        let (user_repo, durable_tokens, pool): (Arc<dyn UserRepo>, Arc<dyn TokenStore>, _) =
            match settings.store.backend.as_str() {
                "mysql" => {
                    let pool = Pool::<MySql>::connect(&settings.store.mysql_dsn).await?;
                    let user_repo: Arc<dyn UserRepo> =
                        Arc::new(MySqlUserRepo::new(pool.clone(), &settings.store.user_table_name)?);
                    let token_store: Arc<dyn TokenStore> = Arc::new(MySqlTokenStore::new(
                        pool.clone(),
                        &settings.store.token_table_name,
                    )?);
                    (user_repo, token_store, Some(pool))
                }
                "memory" => {
                    let user_repo: Arc<dyn UserRepo> = Arc::new(MemoryUserRepo::new());
                    let token_store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
                    (user_repo, token_store, None)
                }
                other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
            };

        let mut token_cache = None;
        let mut session_cache = None;

        let (token_store, session_store): (Arc<dyn TokenStore>, Arc<dyn SessionStore>) =
            match &settings.redis {
                Some(redis_settings) => {
                    let redis_client = redis::Client::open(redis_settings.dsn.as_str())?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    info!("external cache configured, local token cache disabled");
                    let token_store: Arc<dyn TokenStore> = Arc::new(RedisTokenStore::new(
                        redis_manager.clone(),
                        auth_config.token_expires_in,
                        auth_config.pre_token_expire_in,
                    ));
                    let session_store: Arc<dyn SessionStore> = Arc::new(RedisSessionStore::new(
                        redis_manager,
                        auth_config.session_expires_in,
                    ));
                    (token_store, session_store)
                }
                None => {
                    let cache = Arc::new(LocalTokenCache::start(
                        settings.auth.in_memory_cache_ttl(),
                        auth_config.token_expires_in,
                        auth_config.pre_token_expire_in,
                    ));
                    let sessions = Arc::new(MemorySessionStore::start(auth_config.session_expires_in));
                    token_cache = Some(cache);
                    session_cache = Some(sessions.clone());
                    let session_store: Arc<dyn SessionStore> = sessions;
                    (durable_tokens, session_store)
                }
            };

        let auth_service: Arc<dyn AuthService> = Arc::new(SessionAuthority::new(
            auth_config,
            user_repo,
            credential_hasher,
            token_issuer,
            token_store,
            session_store,
            token_cache.clone().map(|c| c as Arc<dyn TokenCache>),
        ));

        info!(
            store = %settings.store.backend,
            external_cache = settings.redis.is_some(),
            "server started"
        );

        Ok(Self {
            auth_service,
            token_cache,
            session_cache,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(cache) = &self.token_cache {
            cache.close();
        }
        if let Some(sessions) = &self.session_cache {
            sessions.close();
        }
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Local caches and the in-memory session store only expire entries through
/// their sweeper, which never runs below `MIN_SWEEP_TTL`.
fn check_local_ttls(settings: &Settings) -> anyhow::Result<()> {
    let auth = &settings.auth;
    for (name, secs) in [
        ("in_memory_cache_expire_in", auth.in_memory_cache_expire_in),
        ("token_expires_in", auth.token_expires_in),
        ("pre_token_expire_in", auth.pre_token_expire_in),
        ("session_expires_in", auth.session_expires_in),
    ] {
        if Duration::from_secs(secs) < MIN_SWEEP_TTL {
            return Err(anyhow::anyhow!(
                "auth.{} is {}s, must be at least {:?} without an external cache",
                name,
                secs,
                MIN_SWEEP_TTL
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Auth, Log, Store};

    fn memory_settings(backend: &str) -> Settings {
        Settings {
            auth: Auth {
                node_identity: 4,
                ..Default::default()
            },
            log: Log {
                filter: "info".into(),
            },
            store: Store {
                backend: backend.into(),
                mysql_dsn: String::new(),
                user_table_name: "uc_users".into(),
                token_table_name: "uc_user_token".into(),
            },
            redis: None,
        }
    }

    #[tokio::test]
    async fn memory_backend_wires_local_caches() {
        let server = Server::try_new(&memory_settings("memory")).await.unwrap();
        assert!(server.token_cache.is_some());
        assert!(server.session_cache.is_some());
        assert!(server.pool.is_none());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        assert!(Server::try_new(&memory_settings("sqlite")).await.is_err());
    }

    #[tokio::test]
    async fn sweepless_cache_ttl_is_rejected() {
        let mut settings = memory_settings("memory");
        settings.auth.in_memory_cache_expire_in = 3;
        let err = Server::try_new(&settings).await.err().unwrap();
        assert!(err.to_string().contains("in_memory_cache_expire_in"));

        let mut settings = memory_settings("memory");
        settings.auth.pre_token_expire_in = 2;
        assert!(Server::try_new(&settings).await.is_err());

        let mut settings = memory_settings("memory");
        settings.auth.in_memory_cache_expire_in = 5;
        let server = Server::try_new(&settings).await.unwrap();
        server.shutdown().await;
    }

    #[tokio::test]
    async fn out_of_range_node_is_rejected() {
        let mut settings = memory_settings("memory");
        settings.auth.node_identity = 40;
        assert!(Server::try_new(&settings).await.is_err());
    }
}
