/// Walks one user through the whole token lifecycle against whatever
/// backends the settings select.
///
/// ```text
/// $ cargo run --bin session_demo -- --settings=settings/dev.toml
/// ```
///
/// With `store.backend = "mysql"` the `uc_users` and `uc_user_token` tables
/// must already exist.
use futures_util::future::join_all;
use ucenter::application_port::AuthError;
use ucenter::domain_model::NewUser;
use ucenter::logger::*;
use ucenter::server::Server;
use ucenter::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&settings.log))?;

    let server = Server::try_new(&settings).await?;
    let auth = server.auth_service.clone();

    let user = NewUser {
        user_name: "sails".to_string(),
        password: "twtpsu31".to_string(),
        nickname: "xu".to_string(),
        email: "sails@example.com".to_string(),
    };
    match auth.register(user).await {
        Ok(()) => println!("registered sails"),
        Err(AuthError::UserExists) => println!("sails already registered"),
        Err(e) => return Err(e.into()),
    }

    let login = auth.login("sails", "twtpsu31").await?;
    println!("login -> refresh={} access={}", login.refresh_token, login.access_token);

    auth.check_access_token("sails", &login.access_token).await?;
    println!("access token valid");

    let rotated = auth
        .reset_access_token("sails", &login.refresh_token)
        .await?;
    println!("rotated -> access={}", rotated);

    // Requests still carrying the old token land inside the grace window.
    let checks = join_all((0..8).map(|i| {
        let auth = auth.clone();
        let token = if i % 2 == 0 {
            rotated.clone()
        } else {
            login.access_token.clone()
        };
        async move { auth.check_access_token("sails", &token).await }
    }))
    .await;
    println!(
        "concurrent checks: {} ok / {} total",
        checks.iter().filter(|r| r.is_ok()).count(),
        checks.len()
    );

    match auth.check_access_token("sails", "garbage").await {
        Err(e) => println!("garbage token -> {}", e),
        Ok(()) => println!("garbage token unexpectedly accepted"),
    }

    auth.check_session("sails", &login.session_token).await?;
    println!("session valid and refreshed");

    println!("profile: {:?}", auth.get_user_info("sails").await?);

    auth.kill_offline("sails").await?;
    match auth.check_access_token("sails", &rotated).await {
        Err(e) => println!("after kill -> {}", e),
        Ok(()) => println!("after kill token unexpectedly accepted"),
    }

    server.shutdown().await;
    Ok(())
}
