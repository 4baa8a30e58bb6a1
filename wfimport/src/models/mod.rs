//! Data models for the batch import controller

pub mod batch_outcome;
pub mod extraction;
pub mod import_file;
pub mod import_session;

pub use batch_outcome::{BatchOutcome, FileFailure};
pub use extraction::{ExtractionResponse, ExtractionResult, ExtractionSuccess};
pub use import_file::{FileOutcome, FileTask, ImageFile};
pub use import_session::{ImportSession, SessionSnapshot, SessionState, StatusMessage};
pub use wfimport_common::events::{BatchClassification, Severity};
