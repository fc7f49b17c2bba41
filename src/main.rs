use contact_inbox::{
    admin::{self, AdminGate, SqliteSessionStore},
    config::AppConfig,
    db, web,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    let dotenv = dotenvy::dotenv();

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contact_inbox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting contact-inbox v{}", env!("CARGO_PKG_VERSION"));
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = AppConfig::init()?;
    info!("Configuration loaded");

    // Initialize database
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    info!("Database connected: {}", config.database.url);

    // Run migrations
    db::init_db(&pool).await?;

    let sessions = Arc::new(SqliteSessionStore::new(pool.clone()));
    let gate = Arc::new(AdminGate::new(
        config.admin.secret.clone(),
        sessions,
        config.web.session_ttl()?,
    ));

    tokio::spawn(admin::run_session_cleanup(
        gate.clone(),
        Duration::from_secs(config.web.session_cleanup_secs.max(1)),
    ));

    let state = web::AppState {
        pool,
        gate,
        cookie_key: web::derive_cookie_key(&config.admin.session_secret),
        secure_cookies: config.web.secure_cookies,
        max_field_length: config.messages.max_field_length,
    };

    if !config.web.secure_cookies {
        warn!("Session cookies are not marked Secure; serve over HTTPS in production");
    }

    let app = web::create_router(state, config.web.static_dir.as_deref());

    let addr = config.web.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Web server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
