//! Batch import services
//!
//! Leaves first: extraction client, graph loader adapter (and host
//! implementations), batch processor, session controller, status reporter.

pub mod batch_processor;
pub mod extraction_client;
pub mod graph_loader;
pub mod host_loaders;
pub mod session_controller;
pub mod status_reporter;

pub use batch_processor::{BatchProcessor, PreparedBatch};
pub use extraction_client::{ExtractionClient, MetadataExtractor};
pub use graph_loader::{
    derive_tab_title, GraphLoaderAdapter, HostGraphLoader, HostLoadError, LoadOptions,
    DEFAULT_TAB_TITLE,
};
pub use host_loaders::{BroadcastGraphLoader, DirectoryGraphLoader};
pub use session_controller::{SessionController, DEFAULT_AUTO_CLOSE_DELAY};
pub use status_reporter::StatusReporter;
