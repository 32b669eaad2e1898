use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Issues, rotates and validates the refresh / access / pre-access triad
/// and the web session of each user.
///
/// The token store is either the durable store (records carry creation
/// times and expiry is computed here) or an external cache (expiry is the
/// cache's job). `token_cache` is only wired when the former is active.
pub struct SessionAuthority {
    config: AuthConfig,
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_issuer: Arc<dyn TokenIssuer>,
    token_store: Arc<dyn TokenStore>,
    session_store: Arc<dyn SessionStore>,
    token_cache: Option<Arc<dyn TokenCache>>,
}

impl SessionAuthority {
    pub fn new(
        config: AuthConfig,
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_issuer: Arc<dyn TokenIssuer>,
        token_store: Arc<dyn TokenStore>,
        session_store: Arc<dyn SessionStore>,
        token_cache: Option<Arc<dyn TokenCache>>,
    ) -> Self {
        Self {
            config,
            user_repo,
            credential_hasher,
            token_issuer,
            token_store,
            session_store,
            token_cache,
        }
    }

    #[inline]
    fn require(params: &[&str]) -> Result<(), AuthError> {
        if params.iter().any(|p| p.is_empty()) {
            return Err(AuthError::ParamInvalid);
        }
        Ok(())
    }

    async fn find_user(&self, user_name: &str) -> Result<UserRecord, AuthError> {
        self.user_repo
            .get_by_name(user_name)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Answer from the local mirror when it knows the user. `None` means the
    /// mirror has nothing and the backend must decide.
    ///
    /// The pre-access mirror is only written on rotation, so its lifetime is
    /// counted from the rotation. A missing entry is not proof the grace
    /// window closed.
    fn check_cached(&self, user_name: &str, presented: &str) -> Option<Result<(), AuthError>> {
        let cache = self.token_cache.as_ref()?;
        match cache.access(user_name)? {
            CachedToken::Cleared => Some(Err(AuthError::TokenExpired)),
            current => {
                if current.matches(presented) {
                    return Some(Ok(()));
                }
                match cache.pre_access(user_name)? {
                    pre if pre.matches(presented) => {
                        debug!(user = %user_name, "accepted pre-access token from cache");
                        Some(Ok(()))
                    }
                    _ => Some(Err(AuthError::AccessTokenInvalid)),
                }
            }
        }
    }

    /// Validate against a record whose store stamped creation times.
    fn check_stamped(
        &self,
        record: &TokenRecord,
        created_at: chrono::DateTime<Utc>,
        presented: &str,
    ) -> Result<(), AuthError> {
        let age = (Utc::now() - created_at).to_std().unwrap_or(Duration::ZERO);

        if age > self.config.token_expires_in || record.access_token.is_empty() {
            if let Some(cache) = &self.token_cache {
                cache.mark_cleared(&record.user_name);
            }
            return Err(AuthError::TokenExpired);
        }

        let in_grace = age < self.config.pre_token_expire_in;
        if let Some(cache) = &self.token_cache {
            // The pre-access mirror is written on rotation only.
            cache.put_access(&record.user_name, CachedToken::Known(record.access_token.clone()));
            if !in_grace {
                cache.forget_pre_access(&record.user_name);
            }
        }

        if record.access_token == presented {
            return Ok(());
        }
        if in_grace && !record.pre_access_token.is_empty() && record.pre_access_token == presented {
            return Ok(());
        }
        Err(AuthError::AccessTokenInvalid)
    }

    /// Validate against a record from a store that expires keys itself.
    fn check_live(record: &TokenRecord, presented: &str) -> Result<(), AuthError> {
        let matches = |stored: &str| !stored.is_empty() && stored == presented;
        if matches(&record.access_token) || matches(&record.pre_access_token) {
            return Ok(());
        }
        Err(AuthError::AccessTokenInvalid)
    }
}

#[async_trait::async_trait]
impl AuthService for SessionAuthority {
    async fn register(&self, user: NewUser) -> Result<(), AuthError> {
        Self::require(&[user.user_name.as_str(), user.password.as_str()])?;

        if self.user_repo.get_by_name(&user.user_name).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.credential_hasher.hash_password(&user.password).await?;
        self.user_repo
            .create(NewUserRecord {
                user_name: user.user_name.clone(),
                password_hash,
                nickname: user.nickname,
                email: user.email,
            })
            .await?;

        info!(user = %user.user_name, "user registered");
        Ok(())
    }

    async fn login(&self, user_name: &str, password: &str) -> Result<LoginResult, AuthError> {
        Self::require(&[user_name, password])?;

        let user = self.find_user(user_name).await?;
        let ok = self
            .credential_hasher
            .verify_password(password, &user.password_hash)
            .await?;
        if !ok {
            warn!(user = %user_name, "login rejected: password mismatch");
            return Err(AuthError::PasswordInvalid);
        }

        // Not rolled back: a failure part way leaves the earlier writes in place.
        let refresh_token = self.token_issuer.new_token();
        self.token_store
            .set_refresh_token(user_name, &refresh_token)
            .await?;

        let access_token = self.token_issuer.new_token();
        self.token_store
            .set_access_token(user_name, &access_token)
            .await?;
        self.token_store.set_pre_access_token(user_name, "").await?;

        let session_token = self.token_issuer.new_token();
        self.session_store
            .save_session(user_name, &session_token)
            .await?;

        if let Some(cache) = &self.token_cache {
            cache.put_access(user_name, CachedToken::Known(access_token.clone()));
            cache.forget_pre_access(user_name);
        }

        info!(user = %user_name, "login succeeded");
        Ok(LoginResult {
            refresh_token,
            access_token,
            session_token,
            access_token_expires_in: self.config.token_expires_in,
            session_expires_in: self.config.session_expires_in,
        })
    }

    async fn check_access_token(
        &self,
        user_name: &str,
        access_token: &str,
    ) -> Result<(), AuthError> {
        Self::require(&[user_name, access_token])?;

        if let Some(decided) = self.check_cached(user_name, access_token) {
            return decided;
        }

        let record = self.token_store.get_token_info(user_name).await?;
        match record.access_created_at {
            Some(created_at) => self.check_stamped(&record, created_at, access_token),
            None => Self::check_live(&record, access_token),
        }
    }

    async fn reset_access_token(
        &self,
        user_name: &str,
        refresh_token: &str,
    ) -> Result<String, AuthError> {
        Self::require(&[user_name, refresh_token])?;

        let record = self.token_store.get_token_info(user_name).await?;
        if record.refresh_token.is_empty() || record.refresh_token != refresh_token {
            warn!(user = %user_name, "rotation rejected: refresh token mismatch");
            return Err(AuthError::RefreshTokenInvalid);
        }

        // Demote first: a crash between the writes leaves the old token in
        // both slots, which the next rotation repairs.
        self.token_store
            .set_pre_access_token(user_name, &record.access_token)
            .await?;
        let access_token = self.token_issuer.new_token();
        self.token_store
            .set_access_token(user_name, &access_token)
            .await?;

        if let Some(cache) = &self.token_cache {
            cache.put_access(user_name, CachedToken::Known(access_token.clone()));
            if record.access_token.is_empty() {
                cache.forget_pre_access(user_name);
            } else {
                cache.put_pre_access(user_name, CachedToken::Known(record.access_token));
            }
        }

        info!(user = %user_name, "access token rotated");
        Ok(access_token)
    }

    async fn check_session(&self, user_name: &str, session: &str) -> Result<(), AuthError> {
        Self::require(&[user_name, session])?;

        match self.session_store.load_session(user_name).await? {
            Some(stored) if !stored.is_empty() && stored == session => {
                self.session_store.save_session(user_name, session).await?;
                Ok(())
            }
            _ => Err(AuthError::SessionInvalid),
        }
    }

    async fn kill_offline(&self, user_name: &str) -> Result<(), AuthError> {
        Self::require(&[user_name])?;
        self.find_user(user_name).await?;

        self.token_store.set_refresh_token(user_name, "").await?;
        self.token_store.set_access_token(user_name, "").await?;
        self.token_store.set_pre_access_token(user_name, "").await?;
        self.session_store.save_session(user_name, "").await?;

        if let Some(cache) = &self.token_cache {
            cache.mark_cleared(user_name);
        }

        info!(user = %user_name, "user forced offline");
        Ok(())
    }

    async fn get_user_info(&self, user_name: &str) -> Result<UserInfo, AuthError> {
        Self::require(&[user_name])?;
        Ok(self.find_user(user_name).await?.into())
    }
}
