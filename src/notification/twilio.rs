//! A client for sending text messages through the Twilio REST API.

use crate::config::TwilioConfig;
use crate::core::{MessageId, NotificationSender};
use crate::notification::SendError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// The subset of Twilio's message resource the relay reads back.
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

/// Sends every message from `sender` to `receiver` on the configured account.
pub struct TwilioClient {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    receiver: String,
    sender: String,
}

impl TwilioClient {
    /// Creates a new `TwilioClient` from the validated configuration.
    pub fn new(config: &TwilioConfig) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base_url.trim_end_matches('/'),
            config.account_sid
        );

        Ok(Self {
            client,
            messages_url,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            receiver: config.receiver.clone(),
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl NotificationSender for TwilioClient {
    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn send(&self, body: &str) -> Result<MessageId, SendError> {
        let params = [
            ("To", self.receiver.as_str()),
            ("From", self.sender.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Twilio rejected message");
            return Err(SendError::Rejected { status, body });
        }

        let resource: MessageResource = response.json().await?;
        let sid = resource.sid.ok_or(SendError::MissingSid)?;
        debug!(sid = %sid, "Twilio accepted message");
        Ok(MessageId(sid))
    }
}
