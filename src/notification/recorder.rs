//! An in-memory sender that records every message instead of delivering it.

use crate::core::{MessageId, NotificationSender};
use crate::notification::SendError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<(Instant, String)>>>,
    calls: Arc<Mutex<usize>>,
    fail_on: Arc<HashSet<usize>>,
    cancel_after: Option<(usize, Arc<watch::Sender<bool>>)>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the given 0-based calls instead of recording them.
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = Arc::new(calls.iter().copied().collect());
        self
    }

    /// Flips `cancel` to true once `calls` sends have been attempted.
    pub fn cancelling_after(mut self, calls: usize, cancel: watch::Sender<bool>) -> Self {
        self.cancel_after = Some((calls, Arc::new(cancel)));
        self
    }

    /// Bodies of the messages that were accepted, in send order.
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// When each accepted message was sent, in send order.
    pub fn send_times(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    /// Total number of send attempts, including failed ones.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, body: &str) -> Result<MessageId, SendError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls - 1
        };

        if let Some((after, cancel)) = &self.cancel_after {
            if call + 1 == *after {
                cancel.send_replace(true);
            }
        }

        if self.fail_on.contains(&call) {
            return Err(SendError::Other(format!("call {} rejected", call)));
        }

        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), body.to_string()));
        Ok(MessageId(format!("msgid-{}", call + 1)))
    }
}
