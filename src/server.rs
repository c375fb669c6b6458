//! The webhook endpoint: decodes alert manager notifications and runs the
//! dispatcher for each one before answering the request.

use crate::core::{AlertBatch, DispatchOutcome};
use crate::dispatch::{cancelled, Dispatcher};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

/// Shared state of the request handlers.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    request_timeout: Option<Duration>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    /// # Arguments
    /// * `dispatcher` - Delivers the alerts of every accepted request.
    /// * `request_timeout` - Cancels a request's dispatch once it elapses.
    /// * `shutdown_rx` - Cancels every in-flight dispatch when it turns true.
    pub fn new(
        dispatcher: Dispatcher,
        request_timeout: Option<Duration>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            dispatcher,
            request_timeout,
            shutdown_rx,
        }
    }
}

/// Builds the relay's routes: `/` answers `ping`, `/send` takes webhooks.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(ping))
        .route("/send", any(send))
        .fallback(not_found)
        .with_state(state)
}

async fn ping() -> &'static str {
    "ping"
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

fn status_error(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

/// Flips the dispatch's cancellation signal when the request goes away,
/// whether the handler returns or its future is dropped on disconnect.
struct CancelOnDrop(watch::Sender<bool>);

impl CancelOnDrop {
    fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Resolves when a request's dispatch should stop, naming the reason.
async fn cancellation(
    shutdown_rx: &mut watch::Receiver<bool>,
    request_timeout: Option<Duration>,
) -> &'static str {
    let deadline = async {
        match request_timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = cancelled(shutdown_rx) => "shutdown",
        _ = deadline => "request timeout",
    }
}

#[instrument(skip_all)]
async fn send(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return status_error(StatusCode::METHOD_NOT_ALLOWED);
    }

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if content_type != Some("application/json") {
        return status_error(StatusCode::NOT_ACCEPTABLE);
    }

    let batch: AlertBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(error = %e, "Rejecting malformed webhook payload");
            return status_error(StatusCode::BAD_REQUEST);
        }
    };

    if !batch.is_firing() {
        return StatusCode::OK.into_response();
    }

    // The dispatch runs in its own task so a client disconnect cannot abort a
    // send midway; the guard cancels it at the next pacing wait instead.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let guard = CancelOnDrop(cancel_tx);
    let dispatcher = state.dispatcher.clone();
    let mut dispatch = tokio::spawn(async move { dispatcher.dispatch(&batch, cancel_rx).await });

    let mut shutdown_rx = state.shutdown_rx.clone();
    let joined = tokio::select! {
        joined = &mut dispatch => joined,
        reason = cancellation(&mut shutdown_rx, state.request_timeout) => {
            warn!(reason, "Cancelling dispatch for request");
            guard.cancel();
            dispatch.await
        }
    };

    match joined {
        Ok(DispatchOutcome::CancelledEarly(report)) => {
            warn!(
                attempted = report.attempted(),
                sent = report.sent,
                render_failures = report.render_failures,
                send_failures = report.send_failures,
                "Batch stopped early"
            );
            StatusCode::OK.into_response()
        }
        Ok(outcome) => {
            let report = outcome.report();
            info!(
                sent = report.sent,
                render_failures = report.render_failures,
                send_failures = report.send_failures,
                "Batch dispatched"
            );
            StatusCode::OK.into_response()
        }
        Err(e) => {
            error!(error = %e, "Dispatch task failed");
            status_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
