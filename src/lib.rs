//! alertsms - an alert manager webhook receiver that relays firing alerts
//! to a single phone number as text messages.
//!
//! Alerts of a batch are rendered from their `summary` annotation and sent
//! one at a time with a fixed spacing, so a fleet-wide outage does not
//! flood the SMS provider.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod internal_metrics;
pub mod notification;
pub mod server;
pub mod task_manager;
pub mod template;

// Re-export core types for convenience
pub use crate::core::*;
