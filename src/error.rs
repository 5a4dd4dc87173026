//! Error taxonomy for the SDK.
//!
//! Foreground calls (`get_me`, `get_donates`, `get_clients`) fail loudly by
//! returning these errors to the caller.  During long polling the same errors
//! are caught per iteration and routed to the `error` channel instead, so a
//! single bad tick never terminates the loop.

use serde_json::Value;

/// Errors produced by the Donatello SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    ///
    /// Requests are single attempts; nothing is retried automatically.
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server explicitly reported `"success": false`.
    ///
    /// Carries the raw response payload so error listeners can inspect
    /// the server-provided message.
    #[error("api error: {payload}")]
    Api {
        /// The decoded response body, exactly as the server sent it.
        payload: Value,
    },

    /// The response payload does not match the expected entity shape.
    #[error("validation error: {source}")]
    Validation {
        #[source]
        source: serde_json::Error,
        /// The payload that failed to parse.
        payload: Value,
    },

    /// A base URL could not be joined with an endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// A registered listener returned an error during dispatch.
    ///
    /// Dispatch never swallows listener failures; the polling loop turns
    /// them into error-channel events.
    #[error("listener error: {0}")]
    Listener(#[source] anyhow::Error),
}

impl Error {
    /// The raw payload attached to this error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Error::Api { payload } | Error::Validation { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
