//! # Hushbox Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use hb_api::{router, AppState, SessionSettings};
use hb_config::AppConfig;
use hb_core::{AdminAuthenticator, AuthProvider};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[cfg(feature = "db-sqlite")]
use hb_db_sqlite::SqliteConfessionRepo;

#[cfg(feature = "auth-jwt")]
use hb_auth_jwt::JwtAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-jwt")))]
compile_error!("hushbox needs a storage plugin (db-sqlite) and an auth plugin (auth-jwt)");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(config.logging.json);
    if let Some(path) = &config.env_file {
        info!(path = %path.display(), "loaded .env");
    }
    let address = config.bind_address();

    // 1. Initialize Database Implementation
    let repo = Arc::new(
        SqliteConfessionRepo::new(&config.database.url)
            .await
            .with_context(|| format!("failed to open database {}", config.database.url))?,
    );

    // 2. Initialize Auth Implementation
    let ttl_hours = config.auth.token_ttl_hours;
    let auth: Arc<dyn AuthProvider> = Arc::new(JwtAuthProvider::new(
        &config.auth.jwt_secret,
        config.auth.admin_username.clone(),
        config.auth.admin_password_hash,
        chrono::Duration::hours(ttl_hours),
    ));
    let authenticator =
        AdminAuthenticator::standard(auth.clone(), config.auth.require_external_role);

    // 3. Wrap in AppState (dynamic dispatch over the plugin traits)
    let state = AppState {
        confessions: repo.clone(),
        bans: repo,
        auth,
        authenticator: Arc::new(authenticator),
        policy: Arc::new(config.submission),
        trusted_proxies: Arc::new(config.server.trusted_proxies),
        session: SessionSettings {
            max_age_secs: ttl_hours * 3600,
            secure: config.auth.cookie_secure,
        },
    };

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "Hushbox listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Hushbox stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
