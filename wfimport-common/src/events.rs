//! Event types for the import event system
//!
//! Provides the shared import event definitions and the EventBus that
//! carries them to SSE subscribers (the editor page, CLI progress output).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Severity of a user-visible status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Final classification of a completed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchClassification {
    /// At least one success, no failures
    AllSuccess,
    /// At least one success and at least one failure
    Partial,
    /// No successes
    AllFailed,
}

/// Import event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImportEvent {
    /// Import session opened
    SessionOpened {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Import session closed
    SessionClosed {
        /// True when closed by the post-success timer rather than the user
        auto: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Status area content changed
    StatusChanged {
        message: String,
        severity: Severity,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A batch passed validation and started processing
    BatchStarted {
        batch_id: Uuid,
        /// Number of image files in the batch
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One file was extracted and loaded into a new tab
    FileImported {
        batch_id: Uuid,
        /// 1-based position within the batch
        index: usize,
        total: usize,
        filename: String,
        /// Tab title the workflow was loaded under
        title: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One file failed extraction or loading
    FileFailed {
        batch_id: Uuid,
        index: usize,
        total: usize,
        filename: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every file of a batch has been attempted
    BatchCompleted {
        batch_id: Uuid,
        success_count: usize,
        fail_count: usize,
        classification: BatchClassification,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Request for the editor page to open a workflow graph in a new tab
    WorkflowLoaded {
        title: String,
        graph: serde_json::Value,
        /// Replace the target tab's contents rather than merging
        clean: bool,
        /// Open in a newly created tab
        new_tab: bool,
        /// Select the new tab immediately
        select_tab: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ImportEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            ImportEvent::SessionOpened { .. } => "SessionOpened",
            ImportEvent::SessionClosed { .. } => "SessionClosed",
            ImportEvent::StatusChanged { .. } => "StatusChanged",
            ImportEvent::BatchStarted { .. } => "BatchStarted",
            ImportEvent::FileImported { .. } => "FileImported",
            ImportEvent::FileFailed { .. } => "FileFailed",
            ImportEvent::BatchCompleted { .. } => "BatchCompleted",
            ImportEvent::WorkflowLoaded { .. } => "WorkflowLoaded",
        }
    }
}

/// Broadcast channel for import events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ImportEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use wfimport_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ImportEvent,
    ) -> Result<usize, broadcast::error::SendError<ImportEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ImportEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
