//! Core domain types and service traits for the relay
//!
//! This module defines the webhook payload model decoded from the alert
//! manager and the trait contract the dispatcher uses to hand rendered
//! messages to an SMS provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::notification::SendError;

/// The batch status the relay acts on.
pub const FIRING: &str = "firing";

/// One webhook notification from the alert manager.
///
/// Only the fields the relay uses are decoded; everything else in the
/// payload (`version`, `groupKey`, `receiver`, ...) is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AlertBatch {
    /// Overall status of the notification, e.g. "firing" or "resolved".
    #[serde(default)]
    pub status: String,
    /// The alerts in the order the alert manager sent them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

impl AlertBatch {
    /// Returns true if the batch reports an active condition.
    pub fn is_firing(&self) -> bool {
        self.status == FIRING
    }
}

/// A single firing condition reported by the monitoring system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub status: String,
    /// Structured identity of the alert (`alertname`, `instance`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,
    /// Human text; `summary` holds the message template.
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: HashMap<String, String>,
    pub starts_at: DateTime<Utc>,
}

// A `null` list or map reads the same as an absent one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier assigned by the SMS provider to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Aggregate counts for one processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Messages accepted by the provider.
    pub sent: usize,
    /// Alerts skipped because their summary could not be rendered.
    pub render_failures: usize,
    /// Alerts whose message the provider rejected or never received.
    pub send_failures: usize,
}

impl DispatchReport {
    /// Number of alerts the dispatcher attempted, successfully or not.
    pub fn attempted(&self) -> usize {
        self.sent + self.render_failures + self.send_failures
    }
}

/// Terminal state of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The batch was not firing; nothing was attempted.
    NotFiring,
    /// Every alert in the batch was attempted.
    Done(DispatchReport),
    /// Cancellation was observed during a pacing wait. The remaining alerts
    /// were never attempted.
    CancelledEarly(DispatchReport),
}

impl DispatchOutcome {
    pub fn report(&self) -> DispatchReport {
        match self {
            DispatchOutcome::NotFiring => DispatchReport::default(),
            DispatchOutcome::Done(report) | DispatchOutcome::CancelledEarly(report) => *report,
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers a text message to the configured recipient.
///
/// Implementations must be safe to call from several concurrent dispatches;
/// the dispatcher performs no locking of its own.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends `body` and returns the provider's identifier for the message.
    ///
    /// # Returns
    /// * `Ok(MessageId)` once the provider accepted the message
    /// * `Err(SendError)` on transport failures or provider rejections
    async fn send(&self, body: &str) -> Result<MessageId, SendError>;
}
