//! Session/Dialog Controller
//!
//! Owns the lifecycle of one import session and is the only component that
//! mutates it. UI events map one-to-one onto `toggle`, `open`, `close` and
//! `submit_files`.
//!
//! Concurrent batches are excluded by an async mutex taken with `try_lock`:
//! the second of two simultaneous submissions is rejected as busy, never
//! queued. Closing the session does not cancel a running batch; the batch
//! finishes in the background and its outcome is published on the event bus
//! but not shown in the (closed or re-opened) session.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use wfimport_common::events::{EventBus, ImportEvent};

use super::batch_processor::{BatchProcessor, PreparedBatch};
use super::status_reporter::{self, StatusReporter};
use crate::error::ImportError;
use crate::models::{
    BatchClassification, BatchOutcome, ImageFile, ImportSession, SessionSnapshot, StatusMessage,
};

/// Default delay before a fully successful session closes itself
pub const DEFAULT_AUTO_CLOSE_DELAY: Duration = Duration::from_millis(1500);

/// Import session controller
#[derive(Clone)]
pub struct SessionController {
    session: Arc<RwLock<ImportSession>>,
    batch_guard: Arc<Mutex<()>>,
    processor: BatchProcessor,
    reporter: StatusReporter,
    event_bus: EventBus,
    auto_close_delay: Duration,
}

impl SessionController {
    /// Create a controller around an explicitly constructed session
    pub fn new(
        session: Arc<RwLock<ImportSession>>,
        processor: BatchProcessor,
        event_bus: EventBus,
        auto_close_delay: Duration,
    ) -> Self {
        Self {
            session,
            batch_guard: Arc::new(Mutex::new(())),
            processor,
            reporter: StatusReporter::new(event_bus.clone()),
            event_bus,
            auto_close_delay,
        }
    }

    pub fn session(&self) -> Arc<RwLock<ImportSession>> {
        Arc::clone(&self.session)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }

    /// Open if closed, close if open
    pub async fn toggle(&self) -> SessionSnapshot {
        let is_open = self.session.read().await.is_open();
        if is_open {
            self.close().await
        } else {
            self.open().await
        }
    }

    /// Open with an empty status area
    pub async fn open(&self) -> SessionSnapshot {
        let snapshot = {
            let mut session = self.session.write().await;
            session.open();
            session.snapshot()
        };

        tracing::info!(session_id = %snapshot.session_id, "Import session opened");
        self.event_bus.emit_lossy(ImportEvent::SessionOpened {
            timestamp: chrono::Utc::now(),
        });

        snapshot
    }

    /// Close unconditionally, including while a batch is running
    pub async fn close(&self) -> SessionSnapshot {
        self.close_session(false).await
    }

    async fn close_session(&self, auto: bool) -> SessionSnapshot {
        let (snapshot, was_processing) = {
            let mut session = self.session.write().await;
            let was_processing = session.is_processing();
            session.close();
            (session.snapshot(), was_processing)
        };

        if was_processing {
            tracing::info!(
                session_id = %snapshot.session_id,
                "Import session closed while a batch is running; it will finish in the background"
            );
        } else {
            tracing::info!(session_id = %snapshot.session_id, auto, "Import session closed");
        }

        self.event_bus.emit_lossy(ImportEvent::SessionClosed {
            auto,
            timestamp: chrono::Utc::now(),
        });

        snapshot
    }

    /// Submit a batch of files
    ///
    /// Rejections (busy, closed, no image files) leave `is_open` and
    /// `is_processing` untouched. Per-file failures never surface here; they
    /// are counted in the returned outcome.
    pub async fn submit_files(&self, files: Vec<ImageFile>) -> Result<BatchOutcome, ImportError> {
        let guard = match Arc::clone(&self.batch_guard).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(files = files.len(), "Submission rejected: batch already running");
                return Err(self.reject(ImportError::Busy).await);
            }
        };

        if !self.session.read().await.is_open() {
            tracing::warn!(files = files.len(), "Submission rejected: session closed");
            // Nothing is visible while closed; publish only
            self.reporter.show(status_reporter::rejection(&ImportError::SessionClosed));
            return Err(ImportError::SessionClosed);
        }

        let batch = match BatchProcessor::prepare(files) {
            Ok(batch) => batch,
            Err(e) => return Err(self.reject(e).await),
        };

        let epoch = {
            let mut session = self.session.write().await;
            if !session.begin_processing() {
                return Err(ImportError::SessionClosed);
            }
            session.epoch()
        };
        self.show_in(epoch, status_reporter::processing(batch.len())).await;

        // Detached so that a dropped caller (closed HTTP connection) cannot
        // abandon the batch halfway
        let controller = self.clone();
        tokio::spawn(async move { controller.run_batch(batch, epoch, guard).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Batch task ended abnormally");
                ImportError::Internal(e.to_string())
            })
    }

    async fn run_batch(
        &self,
        batch: PreparedBatch,
        epoch: u64,
        _guard: OwnedMutexGuard<()>,
    ) -> BatchOutcome {
        let total = batch.len();
        let outcome = self
            .processor
            .run_prepared(batch, |task| {
                let controller = self.clone();
                async move {
                    let status = status_reporter::progress(&task.name, task.index, total);
                    controller.show_in(epoch, status).await;
                }
            })
            .await;

        let summary = status_reporter::batch_summary(&outcome);
        let (still_current, batch_seq) = {
            let mut session = self.session.write().await;
            let current = session.finish_processing(epoch) && session.is_open();
            if current {
                session.set_status(summary.clone());
            }
            (current, session.batch_seq())
        };

        if !still_current {
            tracing::info!(
                batch_id = %outcome.batch_id,
                success_count = outcome.success_count,
                fail_count = outcome.fail_count,
                "Batch finished after its session was closed; outcome not shown"
            );
            return outcome;
        }

        self.reporter.show(summary);

        if outcome.classification() == BatchClassification::AllSuccess {
            self.schedule_auto_close(epoch, batch_seq);
        }

        outcome
    }

    /// One-shot close after the configured delay, unless the session was
    /// closed, re-opened or started another batch in the meantime
    fn schedule_auto_close(&self, epoch: u64, batch_seq: u64) {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(controller.auto_close_delay).await;

            let due = {
                let session = controller.session.read().await;
                session.epoch() == epoch
                    && session.batch_seq() == batch_seq
                    && session.is_open()
                    && !session.is_processing()
            };
            if due {
                controller.close_session(true).await;
            } else {
                tracing::debug!("Auto-close skipped: session changed since batch completed");
            }
        });
    }

    /// Show a rejection in the status area of an open session
    async fn reject(&self, err: ImportError) -> ImportError {
        let status = self.reporter.show(status_reporter::rejection(&err));
        let mut session = self.session.write().await;
        if session.is_open() {
            session.set_status(status);
        }
        err
    }

    /// Show a message only if the session is still the one at `epoch`
    async fn show_in(&self, epoch: u64, status: StatusMessage) {
        let mut session = self.session.write().await;
        if session.epoch() == epoch && session.is_open() {
            session.set_status(self.reporter.show(status));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionResult, ExtractionSuccess, SessionState, Severity};
    use crate::services::extraction_client::MetadataExtractor;
    use crate::services::graph_loader::{
        GraphLoaderAdapter, HostGraphLoader, HostLoadError, LoadOptions,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Succeeds for every file; optionally waits for a release signal
    #[derive(Default)]
    struct GatedExtractor {
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
        fail_all: bool,
        /// Fail only files whose name starts with this
        fail_prefix: Option<&'static str>,
    }

    #[async_trait]
    impl MetadataExtractor for GatedExtractor {
        async fn extract(&self, file: &ImageFile) -> ExtractionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let named_failure = self.fail_prefix.is_some_and(|p| file.name.starts_with(p));
            if self.fail_all || named_failure {
                return Err(ImportError::Extraction("No workflow found in image".to_string()));
            }
            Ok(ExtractionSuccess {
                workflow_graph: Some(json!({"nodes": []})),
                api_prompt: None,
                info: None,
            })
        }
    }

    struct NullHost;

    #[async_trait]
    impl HostGraphLoader for NullHost {
        async fn load_graph(&self, _graph: Value, _options: LoadOptions) -> Result<(), HostLoadError> {
            Ok(())
        }
    }

    fn controller(extractor: Arc<GatedExtractor>, delay_ms: u64) -> SessionController {
        let bus = EventBus::new(100);
        let processor = BatchProcessor::new(
            extractor,
            GraphLoaderAdapter::new(Arc::new(NullHost)),
            bus.clone(),
        );
        SessionController::new(
            Arc::new(RwLock::new(ImportSession::new())),
            processor,
            bus,
            Duration::from_millis(delay_ms),
        )
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_toggle_opens_and_closes() {
        let ctl = controller(Arc::new(GatedExtractor::default()), 1500);

        assert_eq!(ctl.toggle().await.state, SessionState::Idle);
        assert_eq!(ctl.toggle().await.state, SessionState::Closed);
    }

    #[tokio::test]
    async fn test_submit_while_closed_rejected() {
        let extractor = Arc::new(GatedExtractor::default());
        let ctl = controller(extractor.clone(), 1500);

        let err = ctl.submit_files(vec![png("a.png")]).await.unwrap_err();
        assert_eq!(err, ImportError::SessionClosed);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_images_is_validation_error_without_state_change() {
        let extractor = Arc::new(GatedExtractor::default());
        let ctl = controller(extractor.clone(), 1500);
        ctl.open().await;

        let err = ctl
            .submit_files(vec![ImageFile::new("a.txt", "text/plain", vec![])])
            .await
            .unwrap_err();

        assert_eq!(err, ImportError::no_valid_images());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);

        let snapshot = ctl.snapshot().await;
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_eq!(snapshot.status.unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_concurrent_submission_rejected_as_busy() {
        let gate = Arc::new(Notify::new());
        let extractor = Arc::new(GatedExtractor {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let ctl = controller(extractor.clone(), 60_000);
        ctl.open().await;

        let first = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.submit_files(vec![png("a.png")]).await })
        };

        // Wait until the first batch is inside the extractor
        while extractor.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(ctl.snapshot().await.is_processing);

        let second = ctl.submit_files(vec![png("b.png")]).await;
        assert_eq!(second.unwrap_err(), ImportError::Busy);

        gate.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.fail_count, 0);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_success_auto_closes_after_delay() {
        let ctl = controller(Arc::new(GatedExtractor::default()), 50);
        ctl.open().await;

        let outcome = ctl.submit_files(vec![png("a.png"), png("b.png")]).await.unwrap();
        assert_eq!(outcome.success_count, 2);

        let snapshot = ctl.snapshot().await;
        assert!(snapshot.is_open);
        assert!(!snapshot.is_processing);
        assert_eq!(snapshot.status.unwrap().severity, Severity::Success);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ctl.snapshot().await.state, SessionState::Closed);
    }

    #[tokio::test]
    async fn test_all_failed_stays_open() {
        let extractor = Arc::new(GatedExtractor {
            fail_all: true,
            ..Default::default()
        });
        let ctl = controller(extractor, 20);
        ctl.open().await;

        let outcome = ctl.submit_files(vec![png("a.png")]).await.unwrap();
        assert_eq!(outcome.fail_count, 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = ctl.snapshot().await;
        assert_eq!(snapshot.state, SessionState::Idle);
        let status = snapshot.status.unwrap();
        assert_eq!(status.severity, Severity::Error);
        assert_eq!(status.text, "Failed to import workflows:\na.png: No workflow found in image");
    }

    #[tokio::test]
    async fn test_manual_reopen_cancels_pending_auto_close() {
        let ctl = controller(Arc::new(GatedExtractor::default()), 80);
        ctl.open().await;
        ctl.submit_files(vec![png("a.png")]).await.unwrap();

        ctl.close().await;
        ctl.open().await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ctl.snapshot().await.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_close_mid_batch_lets_batch_finish_silently() {
        let gate = Arc::new(Notify::new());
        let extractor = Arc::new(GatedExtractor {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let ctl = controller(extractor.clone(), 20);
        ctl.open().await;

        let running = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.submit_files(vec![png("a.png")]).await })
        };
        while extractor.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let closed = ctl.close().await;
        assert_eq!(closed.state, SessionState::Closed);
        assert!(!closed.is_processing);

        // Re-opened session cannot start a batch while the old one holds the guard
        ctl.open().await;
        assert_eq!(
            ctl.submit_files(vec![png("b.png")]).await.unwrap_err(),
            ImportError::Busy
        );

        gate.notify_one();
        let outcome = running.await.unwrap().unwrap();
        assert_eq!(outcome.success_count, 1);

        // Old outcome is not shown in the re-opened session, which stays open
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = ctl.snapshot().await;
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_ne!(snapshot.status.unwrap().severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_failed_batch_within_delay_keeps_session_open() {
        let extractor = Arc::new(GatedExtractor {
            fail_prefix: Some("bad"),
            ..Default::default()
        });
        let ctl = controller(extractor, 200);
        ctl.open().await;

        let first = ctl.submit_files(vec![png("good.png")]).await.unwrap();
        assert_eq!(first.classification(), BatchClassification::AllSuccess);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = ctl.submit_files(vec![png("bad.png")]).await.unwrap();
        assert_eq!(second.classification(), BatchClassification::AllFailed);

        // First batch's timer fires here and must not close the session
        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = ctl.snapshot().await;
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_eq!(
            snapshot.status.unwrap().text,
            "Failed to import workflows:\nbad.png: No workflow found in image"
        );
    }

    #[tokio::test]
    async fn test_busy_rejection_while_closed_leaves_status() {
        let gate = Arc::new(Notify::new());
        let extractor = Arc::new(GatedExtractor {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let ctl = controller(extractor.clone(), 60_000);
        ctl.open().await;

        let running = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.submit_files(vec![png("a.png")]).await })
        };
        while extractor.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let before = ctl.close().await.status;
        assert_eq!(
            ctl.submit_files(vec![png("b.png")]).await.unwrap_err(),
            ImportError::Busy
        );
        assert_eq!(ctl.snapshot().await.status, before);

        gate.notify_one();
        running.await.unwrap().unwrap();
    }
}
