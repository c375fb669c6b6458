//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the relay using the
//! `clap` crate. They take precedence over the TOML file and environment
//! variables when the configuration is assembled.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Relays alert manager webhooks to a phone number as text messages.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to serve the webhook on, e.g. 0.0.0.0:8080.
    #[arg(long, value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Minimum spacing between messages of one batch, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub pacing_interval_ms: Option<u64>,

    /// Stop dispatching a request's remaining alerts after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub request_timeout: Option<u64>,

    /// The logging level (overridden by RUST_LOG).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut server = Dict::new();
        if let Some(addr) = &self.listen_address {
            server.insert("listen_address".into(), Value::from(addr.clone()));
        }
        if let Some(timeout) = self.request_timeout {
            server.insert("request_timeout_seconds".into(), Value::from(timeout));
        }

        let mut dispatch = Dict::new();
        if let Some(interval) = self.pacing_interval_ms {
            dispatch.insert("pacing_interval_ms".into(), Value::from(interval));
        }

        let mut dict = Dict::new();
        if !server.is_empty() {
            dict.insert("server".into(), Value::from(server));
        }
        if !dispatch.is_empty() {
            dict.insert("dispatch".into(), Value::from(dispatch));
        }
        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
