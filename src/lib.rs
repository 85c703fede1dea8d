//! Tidings: client-side alert queue, update detector and notification feed.
//!
//! Re-exports modules needed by the binary and by integration tests in `tests/`.

pub mod alerts;
pub mod api;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod models;
pub mod notification;
pub mod store;
