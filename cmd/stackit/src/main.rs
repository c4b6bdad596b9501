//! # StackIt Server
//!
//! Assembles the application from configuration and compile-time features,
//! then serves it until ctrl-c or SIGTERM.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use api_adapters::AppState;
use auth_adapters::JwtAuthProvider;
use chrono::Duration;
use configs::{DatabaseSettings, LogFormat, Settings, TelemetrySettings};
use secrecy::ExposeSecret;
use services::{ForumLimits, Repositories, Services};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-postgres")]
use storage_adapters::PgStore;

#[cfg(not(all(feature = "web-axum", feature = "auth-jwt")))]
compile_error!("the stackit binary needs the `web-axum` and `auth-jwt` features");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.telemetry)?;

    let repos = build_repositories(&settings.database).await?;
    let auth = JwtAuthProvider::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        Duration::hours(settings.auth.token_ttl_hours),
    );
    let limits = ForumLimits {
        page_size: settings.forum.page_size,
        notification_limit: settings.forum.notification_limit,
    };
    let services = Services::new(repos, Arc::new(auth), limits);
    let app = api_adapters::router(AppState::new(services));

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "StackIt API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(telemetry: &TelemetrySettings) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured filter.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&telemetry.filter))
        .context("parsing telemetry.filter")?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match telemetry.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .map_err(|e| anyhow!(e))
}

async fn build_repositories(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    match &database.url {
        #[cfg(feature = "db-postgres")]
        Some(url) => {
            let store = PgStore::connect(url.expose_secret(), database.max_connections)
                .await
                .context("connecting to postgres")?;
            store.migrate().await.context("running migrations")?;
            Ok(Repositories::from_store(Arc::new(store)))
        }
        #[cfg(not(feature = "db-postgres"))]
        Some(_) => {
            warn!("database.url is set but db-postgres is not compiled in; using the in-memory store");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
        None => {
            warn!("no database.url configured; using the in-memory store, data is lost on restart");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
