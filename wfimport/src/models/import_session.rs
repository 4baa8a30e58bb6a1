//! Import session state machine
//!
//! `Closed → Open.Idle → Open.Processing → Open.Idle → Closed`
//!
//! `close` is valid from either open sub-state. Every open/close bumps the
//! session epoch so that deferred work (auto-close timer, a batch that
//! outlives a close) can tell whether it still belongs to the visible session.

use super::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Closed,
    Idle,
    Processing,
}

/// Message currently shown in the status area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// May span multiple lines
    pub text: String,
    pub severity: Severity,
}

/// One import session (in-memory, re-opened in place)
#[derive(Debug, Clone)]
pub struct ImportSession {
    pub session_id: Uuid,
    is_open: bool,
    is_processing: bool,
    epoch: u64,
    /// Incremented each time a batch starts
    batch_seq: u64,
    last_status: Option<StatusMessage>,
    opened_at: Option<DateTime<Utc>>,
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub is_open: bool,
    pub is_processing: bool,
    pub status: Option<StatusMessage>,
    pub opened_at: Option<DateTime<Utc>>,
}

impl ImportSession {
    /// Create a closed session
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            is_open: false,
            is_processing: false,
            epoch: 0,
            batch_seq: 0,
            last_status: None,
            opened_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn batch_seq(&self) -> u64 {
        self.batch_seq
    }

    pub fn state(&self) -> SessionState {
        match (self.is_open, self.is_processing) {
            (false, _) => SessionState::Closed,
            (true, false) => SessionState::Idle,
            (true, true) => SessionState::Processing,
        }
    }

    /// Open with an empty status area and no batch running
    pub fn open(&mut self) {
        self.is_open = true;
        self.is_processing = false;
        self.last_status = None;
        self.opened_at = Some(Utc::now());
        self.epoch += 1;
    }

    /// Close unconditionally, including mid-batch
    pub fn close(&mut self) {
        self.is_open = false;
        self.is_processing = false;
        self.epoch += 1;
    }

    /// Enter `Open.Processing`; returns false if the session is closed
    pub fn begin_processing(&mut self) -> bool {
        if !self.is_open {
            return false;
        }
        self.is_processing = true;
        self.batch_seq += 1;
        true
    }

    /// Leave `Open.Processing` if the session is still the one that
    /// started the batch; returns whether it was
    pub fn finish_processing(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.is_processing = false;
        true
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.last_status = Some(status);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.state(),
            is_open: self.is_open,
            is_processing: self.is_processing,
            status: self.last_status.clone(),
            opened_at: self.opened_at,
        }
    }
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}
