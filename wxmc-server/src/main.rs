//! wxmc-server - Weather Markov-chain forecast service
//!
//! Startup order: arguments → TOML config → tracing → root folder and
//! database → default model → HTTP server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wxmc_common::config::{find_config_file, RootFolderInitializer, RootFolderResolver, TomlConfig};
use wxmc_common::dataset::REFERENCE_DATASET;
use wxmc_common::db::{init_database, purge_expired_sessions, ModelRecord};
use wxmc_common::markov::CategorySet;
use wxmc_server::forecast::build_model_record;
use wxmc_server::{build_router, AppState};

/// Command-line arguments for wxmc-server
#[derive(Parser, Debug)]
#[command(name = "wxmc-server")]
#[command(about = "Weather Markov-chain forecast service")]
#[command(version)]
struct Args {
    /// TOML config file (default: platform config directory)
    #[arg(short, long, env = "WXMC_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(short, long, env = "WXMC_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long, env = "WXMC_BIND_ADDRESS")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "WXMC_PORT")]
    port: Option<u16>,

    /// CSV used to build the default model
    #[arg(long, env = "WXMC_DEFAULT_DATASET")]
    default_dataset: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its log level applies; outcome is logged below
    let config_path = args.config.clone().or_else(find_config_file);
    let loaded = config_path.as_deref().map(TomlConfig::load);
    let log_level = match &loaded {
        Some(Ok(config)) => config.logging.level.clone(),
        _ => TomlConfig::default().logging.level,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("wxmc_server={0},wxmc_common={0},tower_http={0}", log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting wxmc-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = match (config_path, loaded) {
        (Some(path), Some(Ok(config))) => {
            info!("Loaded config from {}", path.display());
            config
        }
        (_, Some(Err(e))) => {
            warn!("{} - using compiled defaults", e);
            TomlConfig::default()
        }
        _ => {
            info!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder)
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    match purge_expired_sessions(&pool).await {
        Ok(0) => {}
        Ok(n) => info!("Purged {} expired sessions", n),
        Err(e) => warn!("Failed to purge expired sessions: {}", e),
    }

    let categories = config.category_set();
    info!("Allowed categories: {}", categories.to_vec().join(", "));

    let dataset = args.default_dataset.or_else(|| config.default_dataset.clone());
    let default_model = match load_default_model(dataset.as_deref(), &categories) {
        Ok(record) => record,
        Err(e) => {
            error!("Failed to build default model: {:#}", e);
            return Err(e);
        }
    };
    info!(
        "Default model: {} observations, states [{}]",
        default_model.summary.observation_count,
        default_model.model.categories().join(", ")
    );

    let state = AppState::new(pool, default_model, categories)
        .with_token_ttl(chrono::Duration::minutes(config.token_ttl_minutes))
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_cors_allowed_origins(config.cors_allowed_origins.clone());
    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.bind_address);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("wxmc-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Default model from `path`, or from the bundled reference dataset
fn load_default_model(path: Option<&Path>, categories: &CategorySet) -> Result<ModelRecord> {
    let (csv, origin) = match path {
        Some(path) => {
            let csv = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read default dataset {}", path.display()))?;
            (csv, path.display().to_string())
        }
        None => (REFERENCE_DATASET.to_string(), "bundled reference data".to_string()),
    };

    info!("Building default model from {}", origin);
    build_model_record(&csv, categories)
        .with_context(|| format!("Invalid default dataset ({})", origin))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
