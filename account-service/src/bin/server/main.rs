use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use account_service::config::Config;
use account_service::domain::authentication::models::AuthPolicy;
use account_service::domain::authentication::service::AuthService;
use account_service::domain::user::service::UserService;
use account_service::inbound::http::router::create_router;
use account_service::inbound::http::router::AppState;
use account_service::outbound::cache::InMemoryRefreshTokenStore;
use account_service::outbound::repositories::PostgresUserRepository;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenSettings;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        access_token_ttl_secs = config.auth.access_token.expires_in_secs,
        refresh_token_ttl_secs = config.auth.refresh_token.expires_in_secs,
        auth_errors_limit = config.auth.auth_errors_limit,
        track_failed_logins = config.auth.track_failed_logins,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let password = &config.auth.password;
    let password_hasher =
        PasswordHasher::with_cost(password.memory_kib, password.iterations, password.parallelism)?;
    let access_settings: TokenSettings = (&config.auth.access_token).into();
    let refresh_settings: TokenSettings = (&config.auth.refresh_token).into();
    let codec = Arc::new(TokenCodec::new(&access_settings, &refresh_settings)?);

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());

    let user_service = Arc::new(UserService::new(
        Arc::clone(&user_repository),
        password_hasher.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        user_repository,
        Arc::clone(&refresh_tokens),
        codec,
        password_hasher,
        AuthPolicy {
            auth_errors_limit: config.auth.auth_errors_limit,
            track_failed_logins: config.auth.track_failed_logins,
        },
    ));

    let state = AppState::new(user_service, auth_service, &config.rate_limit);

    let sweep_state = state.clone();
    let sweep_period = Duration::from_secs(config.auth.refresh_cache_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_period);
        loop {
            interval.tick().await;
            let purged = refresh_tokens.purge_expired();
            let windows = sweep_state.login_limiter.cleanup() + sweep_state.refresh_limiter.cleanup();
            if purged > 0 || windows > 0 {
                tracing::debug!(
                    refresh_tokens = purged,
                    rate_limit_windows = windows,
                    "Swept expired entries"
                );
            }
        }
    });

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(
        http_listener,
        create_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    tracing::info!("Server exited");
    Ok(())
}
