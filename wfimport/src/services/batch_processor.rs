//! Batch Processor
//!
//! Processes a batch of files strictly sequentially, in input order:
//! file *i* is extracted and loaded (or fails) before file *i+1* starts.
//! A failing file is recorded and never aborts the batch.

use std::future::Future;
use std::sync::Arc;
use wfimport_common::events::{EventBus, ImportEvent};

use super::extraction_client::MetadataExtractor;
use super::graph_loader::GraphLoaderAdapter;
use crate::error::ImportError;
use crate::models::{BatchOutcome, FileOutcome, FileTask, ImageFile};

/// Image files that passed the MIME filter, paired with their tasks
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    files: Vec<ImageFile>,
    tasks: Vec<FileTask>,
}

impl PreparedBatch {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// Sequential extract-then-load runner
#[derive(Clone)]
pub struct BatchProcessor {
    extractor: Arc<dyn MetadataExtractor>,
    loader: GraphLoaderAdapter,
    event_bus: EventBus,
}

impl BatchProcessor {
    pub fn new(
        extractor: Arc<dyn MetadataExtractor>,
        loader: GraphLoaderAdapter,
        event_bus: EventBus,
    ) -> Self {
        Self {
            extractor,
            loader,
            event_bus,
        }
    }

    /// Drop non-image entries; reject a batch with nothing left
    pub fn prepare(files: Vec<ImageFile>) -> Result<PreparedBatch, ImportError> {
        let submitted = files.len();
        let files: Vec<ImageFile> = files.into_iter().filter(ImageFile::is_image).collect();

        if files.is_empty() {
            tracing::debug!(submitted, "Submission contains no image files");
            return Err(ImportError::no_valid_images());
        }

        if files.len() < submitted {
            tracing::debug!(
                submitted,
                kept = files.len(),
                "Dropped non-image entries from submission"
            );
        }

        let tasks = files
            .iter()
            .enumerate()
            .map(|(i, f)| FileTask {
                index: i + 1,
                name: f.name.clone(),
                mime_type: f.mime_type.clone(),
            })
            .collect();

        Ok(PreparedBatch { files, tasks })
    }

    /// Filter and process a submission
    pub async fn run(&self, files: Vec<ImageFile>) -> Result<BatchOutcome, ImportError> {
        let batch = Self::prepare(files)?;
        Ok(self.run_prepared(batch, |_| async {}).await)
    }

    /// Process a prepared batch; `on_file_start` completes before each file
    pub async fn run_prepared<F, Fut>(&self, batch: PreparedBatch, mut on_file_start: F) -> BatchOutcome
    where
        F: FnMut(FileTask) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let mut outcome = BatchOutcome::new();
        let total = batch.len();

        tracing::info!(batch_id = %outcome.batch_id, total, "Batch started");
        self.event_bus.emit_lossy(ImportEvent::BatchStarted {
            batch_id: outcome.batch_id,
            total,
            timestamp: chrono::Utc::now(),
        });

        for (file, task) in batch.files.iter().zip(batch.tasks.iter()) {
            on_file_start(task.clone()).await;

            match self.process_file(file).await {
                FileOutcome::Succeeded { title } => {
                    tracing::info!(batch_id = %outcome.batch_id, file = %task.name, title = %title, "File imported");
                    self.event_bus.emit_lossy(ImportEvent::FileImported {
                        batch_id: outcome.batch_id,
                        index: task.index,
                        total,
                        filename: task.name.clone(),
                        title: title.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    outcome.record_success(title);
                }
                FileOutcome::Failed { reason } => {
                    tracing::warn!(batch_id = %outcome.batch_id, file = %task.name, reason = %reason, "File import failed");
                    self.event_bus.emit_lossy(ImportEvent::FileFailed {
                        batch_id: outcome.batch_id,
                        index: task.index,
                        total,
                        filename: task.name.clone(),
                        reason: reason.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    outcome.record_failure(task.name.clone(), reason);
                }
            }
        }

        outcome.finish();

        tracing::info!(
            batch_id = %outcome.batch_id,
            success_count = outcome.success_count,
            fail_count = outcome.fail_count,
            "Batch completed"
        );
        self.event_bus.emit_lossy(ImportEvent::BatchCompleted {
            batch_id: outcome.batch_id,
            success_count: outcome.success_count,
            fail_count: outcome.fail_count,
            classification: outcome.classification(),
            timestamp: chrono::Utc::now(),
        });

        outcome
    }

    /// Extract then load one file
    async fn process_file(&self, file: &ImageFile) -> FileOutcome {
        let loaded = match self.extractor.extract(file).await {
            Ok(success) => self.loader.load(&success, &file.name).await,
            Err(e) => Err(e),
        };

        match loaded {
            Ok(title) => FileOutcome::Succeeded { title },
            Err(e) => FileOutcome::Failed { reason: e.reason() },
        }
    }
}
