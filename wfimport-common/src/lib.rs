//! # wfimport Common Library
//!
//! Shared code for the workflow importer:
//! - Error type
//! - Configuration loading (TOML bootstrap file)
//! - Import event types and the broadcast EventBus
//! - SSE stream helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
