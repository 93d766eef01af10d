//! # Marquee Server
//!
//! Movie showcase REST API.
//!
//! ## Overview
//!
//! - **Catalog**: movies, cinemas, showtimes, actors, genres and streaming
//!   platforms
//! - **Ratings**: per-user scores with an eagerly maintained aggregate
//! - **Lifecycle**: movie status derived from the release date and kept
//!   current by a periodic sweep
//! - **Favorites** and a per-request visit log
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - PostgreSQL for persistent storage (or an in-memory store in dev mode)
//! - Redis for the listing cache (or an in-process cache)
//! - A webhook relay or the log for new-movie notifications

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use marquee_core::{
    database::infrastructure::postgres::PostgresDatabase,
    tasks::{PeriodicTask, RatingSweep, StatusSweep},
};
use marquee_server::{
    infra::{
        app_state::AppState,
        config::{Config, ConfigLoad, ConfigLoader},
        startup::{ProdStartupHooks, StartupHooks},
    },
    routes,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "marquee-server")]
#[command(about = "Movie showcase REST API with ratings, showtimes and favorites")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Explicit configuration file (TOML, or JSON by extension)
    #[arg(long, env = "MARQUEE_CONFIG_PATH")]
    config: Option<std::path::PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
    #[command(subcommand)]
    Tasks(TasksCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[derive(Debug, Subcommand)]
enum TasksCommand {
    /// Run one sweep immediately and exit
    Run {
        #[arg(value_enum)]
        task: TaskName,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskName {
    StatusSweep,
    RatingSweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    if let Some(command) = cli.command {
        match command {
            Command::Db(DbCommand::Migrate) => {
                run_db_migrate(&config).await?;
            }
            Command::Tasks(TasksCommand::Run { task }) => {
                run_task_once(config, task).await?;
            }
        }
        return Ok(());
    }

    run_server(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Arc<Config>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    info!(source = ?config.metadata.source, "configuration loaded");
    for warning in &warnings {
        warn!(message = %warning, "configuration warning");
    }

    Ok(Arc::new(config))
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is required to run migrations")?;
    let pg = PostgresDatabase::connect(url)
        .await
        .context("failed to connect to PostgreSQL for migration")?;
    pg.migrate().await.context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_task_once(config: Arc<Config>, task: TaskName) -> anyhow::Result<()> {
    let state = AppState::connect(config).await?;
    let task: Arc<dyn PeriodicTask> = match task {
        TaskName::StatusSweep => Arc::new(StatusSweep::new(state.movies.clone())),
        TaskName::RatingSweep => {
            Arc::new(RatingSweep::new(state.unit_of_work.clone()))
        }
    };

    let started = Utc::now();
    let report = task
        .run_once()
        .await
        .with_context(|| format!("{} failed", task.name()))?;
    info!(
        task = task.name(),
        examined = report.examined,
        changed = report.changed,
        failed = report.failed,
        elapsed_ms = (Utc::now() - started).num_milliseconds(),
        "task finished"
    );
    Ok(())
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    let state = AppState::connect(Arc::clone(&config)).await?;

    if let Some(pg) = &state.postgres {
        pg.migrate().await.context("database migration failed")?;
    }

    let scheduler = ProdStartupHooks
        .run(&state)
        .await
        .context("startup hooks failed")?;

    let addr = config.bind_address();
    let router = routes::create_app(state);

    info!(
        "Starting Marquee server on {}:{}",
        config.server.host, config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    scheduler.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
