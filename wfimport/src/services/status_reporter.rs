//! Status Reporter
//!
//! Maps controller outcomes to status-area text and severity, and publishes
//! each shown message as a `StatusChanged` event.

use wfimport_common::events::{EventBus, ImportEvent};

use crate::error::ImportError;
use crate::models::{BatchClassification, BatchOutcome, Severity, StatusMessage};

/// Build a status message
pub fn message(text: impl Into<String>, severity: Severity) -> StatusMessage {
    StatusMessage {
        text: text.into(),
        severity,
    }
}

/// Rejected submissions (busy, closed, validation)
pub fn rejection(err: &ImportError) -> StatusMessage {
    let severity = match err {
        ImportError::Busy | ImportError::SessionClosed => Severity::Warning,
        _ => Severity::Error,
    };
    message(err.to_string(), severity)
}

pub fn processing(total: usize) -> StatusMessage {
    message(format!("Processing {} file(s)...", total), Severity::Info)
}

pub fn progress(filename: &str, index: usize, total: usize) -> StatusMessage {
    message(
        format!("Importing {} ({}/{})...", filename, index, total),
        Severity::Info,
    )
}

/// Final message for a completed batch
pub fn batch_summary(outcome: &BatchOutcome) -> StatusMessage {
    let failures = outcome.failure_messages.join("\n");
    match outcome.classification() {
        BatchClassification::AllSuccess => message(
            format!("Successfully imported {} workflow(s)", outcome.success_count),
            Severity::Success,
        ),
        BatchClassification::Partial => message(
            format!(
                "Imported {} workflow(s), {} failed:\n{}",
                outcome.success_count, outcome.fail_count, failures
            ),
            Severity::Warning,
        ),
        BatchClassification::AllFailed => message(
            format!("Failed to import workflows:\n{}", failures),
            Severity::Error,
        ),
    }
}

/// Publishes status messages on the event bus
#[derive(Clone)]
pub struct StatusReporter {
    event_bus: EventBus,
}

impl StatusReporter {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }

    /// Show a message; returns it so the caller can keep it as "last shown"
    pub fn show(&self, status: StatusMessage) -> StatusMessage {
        match status.severity {
            Severity::Error => tracing::warn!(status = %status.text, "Import status"),
            _ => tracing::info!(status = %status.text, "Import status"),
        }

        self.event_bus.emit_lossy(ImportEvent::StatusChanged {
            message: status.text.clone(),
            severity: status.severity,
            timestamp: chrono::Utc::now(),
        });

        status
    }
}
