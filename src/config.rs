//! Configuration management for the relay
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer compiled defaults, an optional TOML file, the
//! provider credentials (`SID`, `TOKEN`, `RECEIVER`, `SENDER`), prefixed
//! environment variables and finally command-line arguments.

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::cli::Cli;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the webhook listener.
    pub server: ServerConfig,
    /// Configuration for the alert dispatcher.
    pub dispatch: DispatchConfig,
    /// Credentials and endpoints for the SMS provider.
    pub twilio: TwilioConfig,
    /// Configuration for the Prometheus exporter.
    pub metrics: MetricsConfig,
}

/// Configuration for the webhook listener.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// The address the HTTP server binds to.
    pub listen_address: SocketAddr,
    /// Upper bound on how long a single `/send` request keeps dispatching.
    /// Once it passes, the batch stops at its next pacing wait.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}

/// Configuration for the alert dispatcher.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Minimum spacing between two messages of the same batch, in milliseconds.
    pub pacing_interval_ms: u64,
}

impl DispatchConfig {
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }
}

/// Credentials and endpoints for the SMS provider.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct TwilioConfig {
    /// The account identifier (`SID`).
    #[serde(default)]
    pub account_sid: String,
    /// The auth credential (`TOKEN`).
    #[serde(default)]
    pub auth_token: String,
    /// The phone number every alert is sent to (`RECEIVER`).
    #[serde(default)]
    pub receiver: String,
    /// The phone number messages are sent from (`SENDER`).
    #[serde(default)]
    pub sender: String,
    /// Base URL of the REST API.
    pub api_base_url: String,
    /// Timeout of a single provider request, in seconds.
    pub timeout_seconds: u64,
}

// The auth token must never end up in the logs.
impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("receiver", &self.receiver)
            .field("sender", &self.sender)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Configuration for the Prometheus exporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Serve `/metrics` when true.
    pub enabled: bool,
    /// The address the metrics server binds to.
    pub listen_address: SocketAddr,
}

impl Config {
    /// Loads the application configuration, layering every source on top of
    /// the defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(config_path) = &cli.config {
            if !config_path.exists() {
                bail!("configuration file {} does not exist", config_path.display());
            }
            figment = figment.merge(Toml::file(config_path));
        }

        let config: Config = figment
            .merge(Serialized::default("twilio", CredentialsEnv::bare()))
            // Allow overriding with environment variables, e.g., ALERTSMS_SERVER__LISTEN_ADDRESS=127.0.0.1:9000
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .split("__")
                    .ignore(&CredentialsEnv::PREFIXED_KEYS),
            )
            .merge(Serialized::default("twilio", CredentialsEnv::prefixed()))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }

    /// Checks the settings the relay cannot start without.
    pub fn validate(&self) -> Result<()> {
        let twilio = &self.twilio;
        if twilio.account_sid.is_empty() || twilio.auth_token.is_empty() || twilio.sender.is_empty()
        {
            bail!("'SID', 'TOKEN' and 'SENDER' environment variables need to be set");
        }
        if self.dispatch.pacing_interval_ms == 0 {
            bail!("dispatch.pacing_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

const ENV_PREFIX: &str = "ALERTSMS_";

/// The credential variables, kept as strings so phone numbers such as
/// `+15550002222` are not reinterpreted as integers.
#[derive(Debug, Serialize, Default)]
struct CredentialsEnv {
    #[serde(skip_serializing_if = "Option::is_none")]
    account_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
}

impl CredentialsEnv {
    /// Keys the prefixed `Env` provider must leave to [`CredentialsEnv::prefixed`].
    const PREFIXED_KEYS: [&'static str; 4] = [
        "twilio.account_sid",
        "twilio.auth_token",
        "twilio.receiver",
        "twilio.sender",
    ];

    /// `SID`, `TOKEN`, `RECEIVER` and `SENDER`.
    fn bare() -> Self {
        Self::read(|field| match field {
            "account_sid" => "SID".to_string(),
            "auth_token" => "TOKEN".to_string(),
            "receiver" => "RECEIVER".to_string(),
            _ => "SENDER".to_string(),
        })
    }

    /// `ALERTSMS_TWILIO__<FIELD>`.
    fn prefixed() -> Self {
        Self::read(|field| format!("{}TWILIO__{}", ENV_PREFIX, field.to_ascii_uppercase()))
    }

    fn read(var_name: impl Fn(&str) -> String) -> Self {
        let var = |field: &str| std::env::var(var_name(field)).ok();
        Self {
            account_sid: var("account_sid"),
            auth_token: var("auth_token"),
            receiver: var("receiver"),
            sender: var("sender"),
        }
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig {
                listen_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
                request_timeout_seconds: None,
            },
            dispatch: DispatchConfig {
                pacing_interval_ms: 100,
            },
            twilio: TwilioConfig {
                account_sid: String::new(),
                auth_token: String::new(),
                receiver: String::new(),
                sender: String::new(),
                api_base_url: "https://api.twilio.com".to_string(),
                timeout_seconds: 10,
            },
            metrics: MetricsConfig {
                enabled: false,
                listen_address: SocketAddr::from(([0, 0, 0, 0], 9090)),
            },
        }
    }
}
