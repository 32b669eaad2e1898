use std::sync::Arc;
use std::time::Duration;
use ucenter::application_impl::{Argon2PasswordHasher, SessionAuthority, Sha256TokenIssuer};
use ucenter::application_port::{AuthConfig, AuthError, AuthService};
use ucenter::domain_model::NewUser;
use ucenter::domain_port::{TokenCache, TokenStore};
use ucenter::infra_memory::{LocalTokenCache, MemorySessionStore, MemoryTokenStore, MemoryUserRepo};

async fn authority(with_cache: bool) -> (Arc<SessionAuthority>, Arc<MemoryTokenStore>) {
    let config = AuthConfig {
        token_expires_in: Duration::from_secs(3600),
        pre_token_expire_in: Duration::from_secs(600),
        session_expires_in: Duration::from_secs(600),
    };
    let tokens = Arc::new(MemoryTokenStore::new());
    let cache: Option<Arc<dyn TokenCache>> = if with_cache {
        Some(Arc::new(LocalTokenCache::start(
            Duration::from_secs(600),
            config.token_expires_in,
            config.pre_token_expire_in,
        )))
    } else {
        None
    };
    let authority = Arc::new(SessionAuthority::new(
        config.clone(),
        Arc::new(MemoryUserRepo::new()),
        Arc::new(Argon2PasswordHasher::with_cost(8, 1, 1).unwrap()),
        Arc::new(Sha256TokenIssuer::new(0).unwrap()),
        tokens.clone(),
        Arc::new(MemorySessionStore::start(config.session_expires_in)),
        cache,
    ));

    authority
        .register(NewUser {
            user_name: "alice".to_string(),
            password: "s3cret!".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    (authority, tokens)
}

#[tokio::test]
async fn rotation_scenario() {
    for with_cache in [true, false] {
        let (auth, _) = authority(with_cache).await;

        let login = auth.login("alice", "s3cret!").await.unwrap();
        let (r1, a1) = (login.refresh_token, login.access_token);

        let a2 = auth.reset_access_token("alice", &r1).await.unwrap();
        assert_ne!(a1, a2);

        auth.check_access_token("alice", &a2).await.unwrap();
        auth.check_access_token("alice", &a1).await.unwrap();
        assert!(matches!(
            auth.check_access_token("alice", "garbage").await,
            Err(AuthError::AccessTokenInvalid)
        ));
    }
}

#[tokio::test]
async fn second_rotation_retires_the_oldest_token() {
    let (auth, _) = authority(false).await;
    let login = auth.login("alice", "s3cret!").await.unwrap();

    let a2 = auth
        .reset_access_token("alice", &login.refresh_token)
        .await
        .unwrap();
    let a3 = auth
        .reset_access_token("alice", &login.refresh_token)
        .await
        .unwrap();

    auth.check_access_token("alice", &a3).await.unwrap();
    auth.check_access_token("alice", &a2).await.unwrap();
    assert!(matches!(
        auth.check_access_token("alice", &login.access_token).await,
        Err(AuthError::AccessTokenInvalid)
    ));
}

#[tokio::test]
async fn relogin_drops_the_grace_token() {
    let (auth, tokens) = authority(true).await;
    let first = auth.login("alice", "s3cret!").await.unwrap();
    auth.reset_access_token("alice", &first.refresh_token)
        .await
        .unwrap();

    let second = auth.login("alice", "s3cret!").await.unwrap();
    assert_eq!(tokens.get_token_info("alice").await.unwrap().pre_access_token, "");
    auth.check_access_token("alice", &second.access_token)
        .await
        .unwrap();
    assert!(matches!(
        auth.check_access_token("alice", &first.access_token).await,
        Err(AuthError::AccessTokenInvalid)
    ));
    assert!(matches!(
        auth.reset_access_token("alice", &first.refresh_token).await,
        Err(AuthError::RefreshTokenInvalid)
    ));
}

#[tokio::test]
async fn wrong_refresh_token_is_rejected() {
    let (auth, tokens) = authority(true).await;
    auth.login("alice", "s3cret!").await.unwrap();
    let before = tokens.get_token_info("alice").await.unwrap();

    assert!(matches!(
        auth.reset_access_token("alice", "wrong-refresh").await,
        Err(AuthError::RefreshTokenInvalid)
    ));

    let after = tokens.get_token_info("alice").await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn kill_offline_twice() {
    let (auth, tokens) = authority(true).await;
    let login = auth.login("alice", "s3cret!").await.unwrap();

    auth.kill_offline("alice").await.unwrap();
    auth.kill_offline("alice").await.unwrap();

    let record = tokens.get_token_info("alice").await.unwrap();
    assert!(record.refresh_token.is_empty());
    assert!(record.access_token.is_empty());
    assert!(record.pre_access_token.is_empty());
    assert!(auth
        .check_access_token("alice", &login.access_token)
        .await
        .is_err());
    assert!(auth
        .check_session("alice", &login.session_token)
        .await
        .is_err());

    // A fresh login brings the user back.
    let again = auth.login("alice", "s3cret!").await.unwrap();
    auth.check_access_token("alice", &again.access_token)
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_parameters_are_rejected() {
    let (auth, _) = authority(true).await;
    assert!(matches!(
        auth.check_access_token("alice", "").await,
        Err(AuthError::ParamInvalid)
    ));
    assert!(matches!(
        auth.reset_access_token("", "x").await,
        Err(AuthError::ParamInvalid)
    ));
    assert!(matches!(
        auth.kill_offline("").await,
        Err(AuthError::ParamInvalid)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checks_during_rotation() {
    let (auth, _) = authority(true).await;
    let login = auth.login("alice", "s3cret!").await.unwrap();
    let old = login.access_token.clone();

    let new = auth
        .reset_access_token("alice", &login.refresh_token)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let auth = auth.clone();
        let token = if i % 2 == 0 { old.clone() } else { new.clone() };
        handles.push(tokio::spawn(async move {
            auth.check_access_token("alice", &token).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}
