//! Hub Receiver - authenticated webhook receiver.
//!
//! Accepts signed event deliveries from a messaging platform, answers its
//! subscription handshake, and keeps the most recent events in memory.
//!
//! ## Architecture
//!
//! ```text
//! POST webhook → signature check → JSON decode → EventLog::append
//! GET  webhook → handshake check → challenge echo
//! GET  /       → EventLog::snapshot → JSON array
//! ```

pub mod config;
pub mod event_log;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use event_log::{Event, EventLog};
pub use web::{router, AppState};
