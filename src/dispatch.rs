//! The alert dispatcher: renders each alert of a batch and hands it to the
//! notification sender, one at a time, with a minimum spacing between sends.

use crate::core::{AlertBatch, DispatchOutcome, DispatchReport, NotificationSender};
use crate::internal_metrics as counters;
use crate::template::compose_message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// Resolves once `signal` turns true. A dropped sender never cancels.
pub async fn cancelled(signal: &mut watch::Receiver<bool>) {
    if signal.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Sends the alerts of a batch sequentially through a [`NotificationSender`].
///
/// A dispatcher holds no per-batch state; one instance is shared by every
/// request and each `dispatch` call runs independently.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Arc<dyn NotificationSender>,
    pacing_interval: Duration,
}

impl Dispatcher {
    /// Creates a new `Dispatcher`.
    ///
    /// # Arguments
    /// * `sender` - Delivers the rendered messages.
    /// * `pacing_interval` - Minimum spacing between two sends of one batch.
    pub fn new(sender: Arc<dyn NotificationSender>, pacing_interval: Duration) -> Self {
        Self {
            sender,
            pacing_interval,
        }
    }

    /// Delivers one message per alert, in batch order.
    ///
    /// Render and send failures are logged and skip only the affected alert.
    /// `cancel` is observed between sends: once it turns true no further
    /// alert is attempted, while a send already in progress always completes.
    #[instrument(skip_all, fields(alerts = batch.alerts.len()))]
    pub async fn dispatch(
        &self,
        batch: &AlertBatch,
        mut cancel: watch::Receiver<bool>,
    ) -> DispatchOutcome {
        if !batch.is_firing() {
            debug!(status = %batch.status, "Batch is not firing, nothing to send.");
            return DispatchOutcome::NotFiring;
        }

        counters::alerts_received(batch.alerts.len());
        let mut report = DispatchReport::default();
        // `interval` panics on a zero period.
        let mut pacer = interval(self.pacing_interval.max(Duration::from_millis(1)));
        pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        pacer.tick().await;

        for (i, alert) in batch.alerts.iter().enumerate() {
            match compose_message(alert) {
                Ok(body) => match self.sender.send(&body).await {
                    Ok(id) => {
                        info!(index = i, message_id = %id, "Sent message successfully");
                        counters::message_sent();
                        report.sent += 1;
                    }
                    Err(e) => {
                        error!(index = i, error = %e, "Failed to send alert text message");
                        counters::message_send_failed();
                        report.send_failures += 1;
                    }
                },
                Err(e) => {
                    warn!(index = i, error = %e, "Failed to render alert body");
                    counters::render_failed();
                    report.render_failures += 1;
                }
            }

            if i == batch.alerts.len() - 1 {
                break;
            }

            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    warn!(
                        sent = report.sent,
                        remaining = batch.alerts.len() - i - 1,
                        "Request cancelled, not sending any more alerts for request"
                    );
                    counters::batch_cancelled();
                    return DispatchOutcome::CancelledEarly(report);
                }
                _ = pacer.tick() => {}
            }
        }

        DispatchOutcome::Done(report)
    }
}
