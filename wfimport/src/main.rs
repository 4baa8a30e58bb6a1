//! wfimport - Workflow importer
//!
//! Recovers workflow graphs embedded in exported images.
//!
//! - `wfimport serve`: HTTP command layer for the editor page (toggle/open/
//!   close/submit + SSE events); graphs are handed to the page as new tabs.
//! - `wfimport import <files...>`: one-shot batch import; graphs are written
//!   to an output directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wfimport::config::{CliOverrides, ImporterConfig};
use wfimport::models::ImageFile;
use wfimport::services::{status_reporter, DirectoryGraphLoader, ExtractionClient};
use wfimport::AppState;
use wfimport_common::config::LoggingConfig;
use wfimport_common::events::EventBus;

/// Command-line arguments for wfimport
#[derive(Parser, Debug)]
#[command(name = "wfimport")]
#[command(about = "Recover editable workflows from exported images")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Metadata Extraction Service base URL
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Delay before a fully successful session closes (milliseconds)
    #[arg(long, global = true)]
    auto_close_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP command layer
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Write loaded graphs here instead of sending them to the editor page
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Import workflows from image files on disk
    Import {
        /// Directory receiving one JSON file per loaded workflow
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let output_dir = match &args.command {
        Command::Serve { output_dir, .. } | Command::Import { output_dir, .. } => output_dir.clone(),
    };
    let port = match &args.command {
        Command::Serve { port, .. } => *port,
        Command::Import { .. } => None,
    };
    let overrides = CliOverrides {
        service_url: args.service_url.clone(),
        port,
        output_dir,
        auto_close_delay_ms: args.auto_close_delay_ms,
    };

    let toml = wfimport_common::config::load_config(args.config.as_deref())?;
    let config = ImporterConfig::resolve(toml, &overrides)?;

    init_tracing(&config.logging)?;

    info!("Starting wfimport v{}", env!("CARGO_PKG_VERSION"));
    info!("Extraction service: {}{}", config.service_url, config.extract_path);

    match args.command {
        Command::Serve { .. } => serve(config).await,
        Command::Import { files, .. } => import(config, files).await,
    }
}

async fn serve(config: ImporterConfig) -> Result<ExitCode> {
    let event_bus = EventBus::new(100);
    let controller = wfimport::controller_from_config(&config, event_bus.clone())?;
    match &config.output_dir {
        Some(dir) => info!("Loaded workflows will be written to {}", dir.display()),
        None => info!("Loaded workflows will be sent to the editor page over /import/events"),
    }

    let state = AppState::new(controller, event_bus);
    let app = wfimport::build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    Ok(ExitCode::SUCCESS)
}

async fn import(config: ImporterConfig, paths: Vec<PathBuf>) -> Result<ExitCode> {
    let output_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let event_bus = EventBus::new(100);
    let controller = wfimport::build_controller(
        Arc::new(ExtractionClient::from_config(&config)?),
        Arc::new(DirectoryGraphLoader::new(output_dir.clone())),
        event_bus,
        &config,
    );

    let mut files = Vec::with_capacity(paths.len());
    let mut unreadable = 0;
    for path in &paths {
        match ImageFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                eprintln!("{}: {}", path.display(), e);
                unreadable += 1;
            }
        }
    }

    controller.open().await;
    match controller.submit_files(files).await {
        Ok(outcome) => {
            println!("{}", status_reporter::batch_summary(&outcome).text);
            if outcome.success_count > 0 {
                println!("Workflows written to {}", output_dir.display());
            }
            controller.close().await;
            if outcome.fail_count == 0 && unreadable == 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            controller.close().await;
            Ok(ExitCode::FAILURE)
        }
    }
}
