//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::NotificationSender,
    dispatch::Dispatcher,
    internal_metrics::MetricsBuilder,
    notification::twilio::TwilioClient,
    server::{router, AppState},
    task_manager::TaskManager,
};
use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, instrument};

/// A handle to the running relay, containing all its task handles.
pub struct App {
    task_manager: TaskManager,
    local_addr: SocketAddr,
    metrics_addr: Option<SocketAddr>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the webhook server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics_addr
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> Result<()> {
        self.task_manager.shutdown_signal().await;
        info!("Shutdown signal received. Waiting for in-flight requests to complete...");

        self.task_manager.shutdown().await;

        info!("All tasks shut down.");
        Ok(())
    }
}

/// Builder for the relay.
///
/// Separates constructing the components from running them, and lets tests
/// swap the SMS provider for an in-memory sender.
pub struct AppBuilder {
    config: Config,
    sender_override: Option<Arc<dyn NotificationSender>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sender_override: None,
        }
    }

    /// Overrides the notification sender for testing.
    pub fn sender_override(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.sender_override = Some(sender);
        self
    }

    /// Binds the listeners and spawns the servers, returning a runnable `App`.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);

        // =========================================================================
        // 1. Metrics
        // =========================================================================
        let metrics_addr = match MetricsBuilder::new(config.metrics.clone())
            .build(task_manager.get_shutdown_rx())
            .await?
        {
            Some((server, addr)) => {
                task_manager.spawn("MetricsServer", server.run());
                Some(addr)
            }
            None => None,
        };

        // =========================================================================
        // 2. Notification sender and dispatcher
        // =========================================================================
        let sender = match self.sender_override {
            Some(sender) => sender,
            None => Arc::new(
                TwilioClient::new(&config.twilio).context("failed to build Twilio client")?,
            ) as Arc<dyn NotificationSender>,
        };
        let dispatcher = Dispatcher::new(sender, config.dispatch.pacing_interval());

        // =========================================================================
        // 3. Webhook server
        // =========================================================================
        let listener = TcpListener::bind(config.server.listen_address)
            .await
            .with_context(|| format!("failed to bind {}", config.server.listen_address))?;
        let local_addr = listener.local_addr()?;

        let state = AppState::new(
            dispatcher,
            config.server.request_timeout(),
            task_manager.get_shutdown_rx(),
        );
        let shutdown = task_manager.shutdown_signal();
        task_manager.spawn("HttpServer", async move {
            let result = axum::serve(listener, router(state))
                .with_graceful_shutdown(shutdown)
                .await;
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
            info!("HTTP server stopped.");
        });

        info!(addr = %local_addr, "Relay listening for alert manager webhooks");

        Ok(App {
            task_manager,
            local_addr,
            metrics_addr,
        })
    }
}
