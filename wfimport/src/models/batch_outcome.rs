//! Aggregate result of one batch

use super::BatchClassification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One failed file and the reason it failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub filename: String,
    pub reason: String,
}

impl FileFailure {
    /// Status-area line for this failure
    pub fn message(&self) -> String {
        format!("{}: {}", self.filename, self.reason)
    }
}

/// Aggregate of a completed batch
///
/// `success_count + fail_count` always equals the number of image files
/// that were submitted in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub success_count: usize,
    pub fail_count: usize,
    /// `"<filename>: <reason>"` per failure, in input order
    pub failure_messages: Vec<String>,
    /// Structured failures, parallel to `failure_messages`
    pub failures: Vec<FileFailure>,
    /// Tab titles of loaded workflows, in input order
    pub loaded_titles: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            success_count: 0,
            fail_count: 0,
            failure_messages: Vec::new(),
            failures: Vec::new(),
            loaded_titles: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn record_success(&mut self, title: String) {
        self.success_count += 1;
        self.loaded_titles.push(title);
    }

    pub fn record_failure(&mut self, filename: String, reason: String) {
        let failure = FileFailure { filename, reason };
        self.fail_count += 1;
        self.failure_messages.push(failure.message());
        self.failures.push(failure);
    }

    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Number of files attempted
    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    pub fn classification(&self) -> BatchClassification {
        if self.success_count == 0 {
            BatchClassification::AllFailed
        } else if self.fail_count == 0 {
            BatchClassification::AllSuccess
        } else {
            BatchClassification::Partial
        }
    }
}

impl Default for BatchOutcome {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let mut outcome = BatchOutcome::new();
        outcome.record_success("a".to_string());
        assert_eq!(outcome.classification(), BatchClassification::AllSuccess);

        outcome.record_failure("b.png".to_string(), "Extraction failed: 500".to_string());
        assert_eq!(outcome.classification(), BatchClassification::Partial);
        assert_eq!(outcome.total(), 2);

        let mut failed = BatchOutcome::new();
        failed.record_failure("c.png".to_string(), "nope".to_string());
        assert_eq!(failed.classification(), BatchClassification::AllFailed);
    }

    #[test]
    fn test_failure_messages_in_order() {
        let mut outcome = BatchOutcome::new();
        outcome.record_failure("one.png".to_string(), "first".to_string());
        outcome.record_failure("two.png".to_string(), "second".to_string());

        assert_eq!(
            outcome.failure_messages,
            vec!["one.png: first".to_string(), "two.png: second".to_string()]
        );
    }
}
