//! Host Graph Loader implementations
//!
//! - `BroadcastGraphLoader`: hands graphs to the connected editor page over
//!   the event bus (SSE), which opens them as new tabs.
//! - `DirectoryGraphLoader`: writes each graph into an output directory,
//!   one file per "tab".

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use wfimport_common::events::{EventBus, ImportEvent};

use super::graph_loader::{HostGraphLoader, HostLoadError, LoadOptions};

/// Publishes `WorkflowLoaded` events for the editor page
pub struct BroadcastGraphLoader {
    event_bus: EventBus,
}

impl BroadcastGraphLoader {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl HostGraphLoader for BroadcastGraphLoader {
    async fn load_graph(&self, graph: Value, options: LoadOptions) -> Result<(), HostLoadError> {
        let event = ImportEvent::WorkflowLoaded {
            title: options.title.clone(),
            graph,
            clean: options.clean,
            new_tab: options.new_tab,
            select_tab: options.select_tab,
            timestamp: chrono::Utc::now(),
        };

        match self.event_bus.emit(event) {
            Ok(receivers) => {
                tracing::debug!(title = %options.title, receivers, "Workflow published to editor");
                Ok(())
            }
            Err(_) => Err(HostLoadError("no editor connected".to_string())),
        }
    }
}

/// Writes graphs as `<title>.json` into a directory
pub struct DirectoryGraphLoader {
    dir: PathBuf,
}

/// Replace characters that are not allowed in file names
fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

impl DirectoryGraphLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate_path(&self, stem: &str, attempt: usize) -> PathBuf {
        if attempt == 1 {
            self.dir.join(format!("{}.json", stem))
        } else {
            self.dir.join(format!("{} ({}).json", stem, attempt))
        }
    }
}

#[async_trait]
impl HostGraphLoader for DirectoryGraphLoader {
    async fn load_graph(&self, graph: Value, options: LoadOptions) -> Result<(), HostLoadError> {
        if !graph.is_object() {
            return Err(HostLoadError(
                "invalid workflow graph: expected a JSON object".to_string(),
            ));
        }

        let content = serde_json::to_vec_pretty(&graph)
            .map_err(|e| HostLoadError(format!("serialize failed: {}", e)))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| HostLoadError(format!("{}: {}", self.dir.display(), e)))?;

        let stem = sanitize_file_stem(&options.title);
        let mut attempt = 1;
        loop {
            let path = self.candidate_path(&stem, attempt);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&content)
                        .await
                        .map_err(|e| HostLoadError(format!("{}: {}", path.display(), e)))?;
                    file.flush()
                        .await
                        .map_err(|e| HostLoadError(format!("{}: {}", path.display(), e)))?;
                    tracing::info!(path = %path.display(), "Workflow written");
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(HostLoadError(format!("{}: {}", path.display(), e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_directory_loader_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirectoryGraphLoader::new(dir.path());

        loader
            .load_graph(json!({"nodes": [1]}), LoadOptions::new_tab("render"))
            .await
            .unwrap();
        loader
            .load_graph(json!({"nodes": [2]}), LoadOptions::new_tab("render"))
            .await
            .unwrap();

        let first: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("render.json")).unwrap()).unwrap();
        let second: Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("render (2).json")).unwrap())
                .unwrap();
        assert_eq!(first, json!({"nodes": [1]}));
        assert_eq!(second, json!({"nodes": [2]}));
    }

    #[tokio::test]
    async fn test_directory_loader_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirectoryGraphLoader::new(dir.path());

        let err = loader
            .load_graph(json!([1, 2, 3]), LoadOptions::new_tab("list"))
            .await
            .unwrap_err();
        assert!(err.0.contains("expected a JSON object"));
        assert!(!dir.path().join("list.json").exists());
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("a/b:c"), "a_b_c");
        assert_eq!(sanitize_file_stem("render.final"), "render.final");
    }

    #[tokio::test]
    async fn test_broadcast_loader_requires_listener() {
        let bus = EventBus::new(10);
        let loader = BroadcastGraphLoader::new(bus.clone());

        let err = loader
            .load_graph(json!({}), LoadOptions::new_tab("x"))
            .await
            .unwrap_err();
        assert_eq!(err.0, "no editor connected");

        let mut rx = bus.subscribe();
        loader
            .load_graph(json!({"nodes": []}), LoadOptions::new_tab("x"))
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            ImportEvent::WorkflowLoaded {
                title,
                new_tab,
                select_tab,
                ..
            } => {
                assert_eq!(title, "x");
                assert!(new_tab);
                assert!(select_tab);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
