//! Graph Loader Adapter
//!
//! Picks the preferred payload of an extraction success (workflow graph
//! over API prompt), parses textual payloads, derives the tab title from
//! the file name and hands the graph to the host.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ImportError;
use crate::models::extraction::NO_VALID_WORKFLOW_DATA;
use crate::models::ExtractionSuccess;

/// Title used when the file name has no stem
pub const DEFAULT_TAB_TITLE: &str = "Imported Workflow";

/// Options passed to the host with every graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Replace the target tab's contents
    pub clean: bool,
    /// Open the graph in a newly created tab
    pub new_tab: bool,
    /// Select the new tab immediately
    pub select_tab: bool,
    /// Tab display name
    pub title: String,
}

impl LoadOptions {
    /// New, selected, clean tab with the given title
    pub fn new_tab(title: impl Into<String>) -> Self {
        Self {
            clean: true,
            new_tab: true,
            select_tab: true,
            title: title.into(),
        }
    }
}

/// Failure raised by the host while materializing a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostLoadError(pub String);

/// The editor's own graph loading API
#[async_trait]
pub trait HostGraphLoader: Send + Sync {
    async fn load_graph(&self, graph: Value, options: LoadOptions) -> Result<(), HostLoadError>;
}

/// Strip the final extension; fall back to the default title on an empty stem
pub fn derive_tab_title(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => &filename[..idx],
        _ => filename,
    };

    if stem.is_empty() {
        DEFAULT_TAB_TITLE.to_string()
    } else {
        stem.to_string()
    }
}

/// Workflow graph first, API prompt as fallback
pub fn select_payload(success: &ExtractionSuccess) -> Result<&Value, ImportError> {
    success
        .workflow_graph
        .as_ref()
        .or(success.api_prompt.as_ref())
        .ok_or_else(|| ImportError::Load(NO_VALID_WORKFLOW_DATA.to_string()))
}

/// Textual payloads are JSON-decoded; structured payloads pass through
pub fn parse_payload(payload: &Value) -> Result<Value, ImportError> {
    match payload {
        Value::String(text) => serde_json::from_str(text)
            .map_err(|e| ImportError::Parse(format!("Failed to parse workflow: {}", e))),
        other => Ok(other.clone()),
    }
}

/// Adapter between extraction results and the host graph loader
#[derive(Clone)]
pub struct GraphLoaderAdapter {
    host: Arc<dyn HostGraphLoader>,
}

impl GraphLoaderAdapter {
    pub fn new(host: Arc<dyn HostGraphLoader>) -> Self {
        Self { host }
    }

    /// Load one extraction success into a new tab
    ///
    /// Returns the tab title on success.
    pub async fn load(
        &self,
        success: &ExtractionSuccess,
        filename: &str,
    ) -> Result<String, ImportError> {
        let payload = select_payload(success)?;
        let graph = parse_payload(payload)?;
        let title = derive_tab_title(filename);

        tracing::debug!(file = %filename, title = %title, "Loading workflow into new tab");

        self.host
            .load_graph(graph, LoadOptions::new_tab(title.clone()))
            .await
            .map_err(|e| ImportError::Load(format!("Failed to load workflow: {}", e)))?;

        Ok(title)
    }
}
