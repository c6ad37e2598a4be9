//! soundreal-auth - Session and entitlement gateway
//!
//! Handles the identity provider's post-login callback and the session-scoped
//! account endpoints (admin check, usage).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use soundreal_auth::identity::IdentityClient;
use soundreal_auth::{build_router, AppState};
use soundreal_common::config::{CliOverrides, ServiceConfig};
use soundreal_common::db::ProfileStore;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for soundreal-auth
#[derive(Parser, Debug)]
#[command(name = "soundreal-auth")]
#[command(about = "SoundReal post-login and entitlement service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Public base URL redirects point at
    #[arg(long)]
    site_url: Option<String>,

    /// Profile store connection URL (postgres:// or sqlite:)
    #[arg(long)]
    database_url: Option<String>,

    /// Create the profiles table if missing (SQLite only, for local runs)
    #[arg(long)]
    init_schema: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config: self.config.clone(),
            port: self.port,
            bind: self.bind.clone(),
            site_url: self.site_url.clone(),
            database_url: self.database_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is needed for the log level, so it is resolved before tracing starts
    // and its own log lines go through a scoped default subscriber.
    let config = {
        let bootstrap = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).finish();
        tracing::subscriber::with_default(bootstrap, || ServiceConfig::load(&args.overrides()))
            .context("Failed to load configuration")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("soundreal_auth={0},soundreal_common={0},tower_http=info", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SoundReal auth service (soundreal-auth) v{}", env!("CARGO_PKG_VERSION"));
    info!("Site URL: {}", config.site_url);
    info!("Identity provider: {}", config.supabase.url);
    if config.admins.is_empty() {
        warn!("Admin allow-lists are empty; no caller will be classified as admin");
    } else {
        info!(
            emails = config.admins.email_count(),
            ids = config.admins.id_count(),
            "Admin allow-lists loaded"
        );
    }

    let store = ProfileStore::connect(&config.database_url, config.http_timeout)
        .await
        .context("Failed to connect to profile store")?;

    if args.init_schema {
        store
            .ensure_profiles_table()
            .await
            .context("Failed to create profiles table")?;
    }

    let identity = IdentityClient::new(&config.supabase, config.http_timeout)
        .context("Failed to build identity provider client")?;

    let addr = config.listen_address();
    let state = AppState::new(config, identity, store.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("soundreal-auth listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
