//! wfimport library interface
//!
//! Batch import controller that recovers workflow graphs embedded in
//! exported images and opens them in the editor. Exposes the controller,
//! its collaborators and the HTTP command layer.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, ImportError};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use wfimport_common::events::EventBus;

use crate::config::ImporterConfig;
use crate::models::ImportSession;
use crate::services::{
    BatchProcessor, BroadcastGraphLoader, DirectoryGraphLoader, ExtractionClient,
    GraphLoaderAdapter, HostGraphLoader, MetadataExtractor, SessionController,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Controller of the page's import session
    pub controller: SessionController,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(controller: SessionController, event_bus: EventBus) -> Self {
        Self {
            controller,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Wire a controller from explicit collaborators
pub fn build_controller(
    extractor: Arc<dyn MetadataExtractor>,
    host: Arc<dyn HostGraphLoader>,
    event_bus: EventBus,
    config: &ImporterConfig,
) -> SessionController {
    let processor = BatchProcessor::new(extractor, GraphLoaderAdapter::new(host), event_bus.clone());
    SessionController::new(
        Arc::new(RwLock::new(ImportSession::new())),
        processor,
        event_bus,
        config.auto_close_delay(),
    )
}

/// Wire a controller from configuration
///
/// Graphs go to `output_dir` when configured, otherwise to the connected
/// editor page over the event bus.
pub fn controller_from_config(
    config: &ImporterConfig,
    event_bus: EventBus,
) -> Result<SessionController, ImportError> {
    let extractor: Arc<dyn MetadataExtractor> = Arc::new(ExtractionClient::from_config(config)?);
    let host: Arc<dyn HostGraphLoader> = match &config.output_dir {
        Some(dir) => Arc::new(DirectoryGraphLoader::new(dir.clone())),
        None => Arc::new(BroadcastGraphLoader::new(event_bus.clone())),
    };
    Ok(build_controller(extractor, host, event_bus, config))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::health_routes())
        .with_state(state)
}
