//! Delivery of rendered alerts to an SMS provider.
//!
//! The dispatcher only sees the [`NotificationSender`](crate::core::NotificationSender)
//! trait. `twilio` holds the production client; `recorder` holds an
//! in-memory sender for tests.
pub mod twilio;

#[cfg(any(test, feature = "test-utils"))]
pub mod recorder;

use thiserror::Error;

/// Why a message could not be handed to the provider.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("send failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("send failed: provider returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("send failed: provider response carried no message sid")]
    MissingSid,
    #[error("send failed: {0}")]
    Other(String),
}
