//! Renders an alert's summary annotation into the SMS body.

use crate::core::Alert;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::trace;

/// The annotation holding the message template.
pub const SUMMARY_ANNOTATION: &str = "summary";

static LABEL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$labels\.([a-z]+)").expect("label token pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("alert had no body")]
    MissingBody,
}

/// Substitutes every `$labels.<name>` token in the alert's summary with the
/// value of the named label.
///
/// Names are one or more lowercase ASCII letters. A label missing from the
/// alert renders as the empty string. Fails with [`RenderError::MissingBody`]
/// when the summary annotation is absent or empty.
pub fn render_summary(alert: &Alert) -> Result<String, RenderError> {
    let summary = alert
        .annotations
        .get(SUMMARY_ANNOTATION)
        .filter(|summary| !summary.is_empty())
        .ok_or(RenderError::MissingBody)?;

    let rendered = LABEL_TOKEN.replace_all(summary, |caps: &Captures| {
        let name = &caps[1];
        let value = alert.labels.get(name).map(String::as_str).unwrap_or_default();
        trace!(label = name, value, "Substituting label");
        value.to_string()
    });

    Ok(rendered.into_owned())
}

/// Builds the final message: the quoted summary followed by the alert's
/// start time, e.g. `"Disk full" alert started at Fri, 06 Jan 2017 19:34:52 UTC`.
pub fn compose_message(alert: &Alert) -> Result<String, RenderError> {
    let summary = render_summary(alert)?;
    Ok(format!(
        "\"{}\" alert started at {}",
        summary,
        alert.starts_at.format("%a, %d %b %Y %H:%M:%S UTC")
    ))
}
