/// Account Service - Main entry point
use actix_web::{web, App, HttpServer};
use redis::aio::ConnectionManager;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_service::{
    config::Config,
    db::{self, InMemoryUserRepository, PgUserRepository, UserRepository},
    metrics,
    middleware::AccessControl,
    routes,
    services::{LogMailer, Mailer, SmtpMailer},
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
    AppState,
};

const DB_MAX_CONNECTIONS: u32 = 5;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("account-service failed: {:#}", e);
        return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing::info!("Starting account-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    metrics::init();

    let users: Arc<dyn UserRepository> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url, DB_MAX_CONNECTIONS).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database pool created, migrations applied");
            Arc::new(PgUserRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let session_store: Arc<dyn SessionStore> = match config.redis_url.as_deref() {
        Some(url) => {
            let client = redis::Client::open(url)?;
            let conn = ConnectionManager::new(client).await?;
            tracing::info!("Redis session store initialized");
            Arc::new(RedisSessionStore::new(conn))
        }
        None => {
            tracing::warn!("REDIS_URL not set, sessions are kept in memory");
            Arc::new(MemorySessionStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match config.smtp.as_ref() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "SMTP mailer initialized");
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, outgoing mail is only logged");
            Arc::new(LogMailer::new())
        }
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let state = web::Data::new(AppState::new(config, users, mailer, session_store));

    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(AccessControl::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
