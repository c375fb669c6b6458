//! # Internal Metrics Module
//!
//! Counters recorded by the dispatcher, and the optional Prometheus
//! exporter that publishes them.
//!
//! ## Components:
//!
//! - **Recording helpers** (`message_sent`, `render_failed`, ...): thin
//!   wrappers over the `metrics` facade. Without an installed recorder they
//!   are no-ops, which is what unit tests and metrics-disabled runs get.
//!
//! - **`MetricsBuilder`**: installs the Prometheus recorder and binds the
//!   listener for the `MetricsServer`.
//!
//! - **`MetricsServer`**: (Defined in `server.rs`) An `axum`-based web server
//!   that exposes the `/metrics` endpoint for Prometheus to scrape.

use crate::config::MetricsConfig;
use crate::internal_metrics::server::MetricsServer;
use anyhow::{Context, Result};
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub mod server;

pub const ALERTS_RECEIVED: &str = "alerts_received_total";
pub const MESSAGES_SENT: &str = "messages_sent_total";
pub const MESSAGE_SEND_FAILURES: &str = "message_send_failures_total";
pub const ALERT_RENDER_FAILURES: &str = "alert_render_failures_total";
pub const BATCHES_CANCELLED: &str = "batches_cancelled_total";

/// Registers descriptions for every counter with the global recorder.
pub fn describe() {
    metrics::describe_counter!(ALERTS_RECEIVED, Unit::Count, "Total number of alerts received in firing batches.");
    metrics::describe_counter!(MESSAGES_SENT, Unit::Count, "Total number of text messages accepted by the provider.");
    metrics::describe_counter!(MESSAGE_SEND_FAILURES, Unit::Count, "Total number of text messages the provider did not accept.");
    metrics::describe_counter!(ALERT_RENDER_FAILURES, Unit::Count, "Total number of alerts skipped because their summary could not be rendered.");
    metrics::describe_counter!(BATCHES_CANCELLED, Unit::Count, "Total number of batches that stopped early because their request was cancelled.");
}

pub fn alerts_received(count: usize) {
    metrics::counter!(ALERTS_RECEIVED).increment(count as u64);
}

pub fn message_sent() {
    metrics::counter!(MESSAGES_SENT).increment(1);
}

pub fn message_send_failed() {
    metrics::counter!(MESSAGE_SEND_FAILURES).increment(1);
}

pub fn render_failed() {
    metrics::counter!(ALERT_RENDER_FAILURES).increment(1);
}

pub fn batch_cancelled() {
    metrics::counter!(BATCHES_CANCELLED).increment(1);
}

/// Builder for the metrics system.
///
/// Installs the global Prometheus recorder and prepares the server that
/// renders it. Returns `None` when metrics are disabled.
pub struct MetricsBuilder {
    config: MetricsConfig,
}

impl MetricsBuilder {
    /// Creates a new `MetricsBuilder` with the given configuration.
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Binds the metrics listener and installs the recorder.
    ///
    /// # Arguments
    ///
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub async fn build(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Option<(MetricsServer, SocketAddr)>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let listener = TcpListener::bind(self.config.listen_address)
            .await
            .with_context(|| {
                format!(
                    "failed to bind metrics server to {}",
                    self.config.listen_address
                )
            })?;
        let addr = listener.local_addr()?;

        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        describe();
        info!(%addr, "Metrics server listening");

        Ok(Some((MetricsServer::new(listener, handle, shutdown_rx), addr)))
    }
}
