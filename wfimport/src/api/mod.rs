//! HTTP command layer
//!
//! Each route maps one UI event onto one controller command; the keyboard
//! shortcut and toolbar button both call `POST /import/toggle`.

pub mod health;
pub mod import_session;

pub use health::health_routes;
pub use import_session::import_routes;
