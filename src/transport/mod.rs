//! Authenticated request execution and response classification.
//!
//! The transport issues one request at a time against either the general API
//! base or the per-widget polling URL, decodes the body as JSON, and applies
//! the envelope rule below.  There is no retry logic; the polling engine
//! decides what a failure means.
//!
//! # Envelope rule
//!
//! The server signals API-level failure by including `"success": false`
//! (a JSON boolean) in the body, regardless of HTTP status.  Such responses
//! are classified as [`Error::Api`] with the raw payload attached.  Any
//! other body is handed back untyped for model construction.  Note the
//! fragility: donation events on the polling endpoint carry no explicit
//! event-type tag and are recognized purely by shape (see
//! [`crate::polling`]).

#[cfg(feature = "blocking")]
pub(crate) mod blocking;
mod http;

pub(crate) use http::Transport;

use serde_json::Value;

use crate::error::Error;

/// Header carrying the account access token on every request.
pub(crate) const TOKEN_HEADER: &str = "X-Token";

/// Apply the `success: false` envelope rule to a decoded body.
pub(crate) fn classify_envelope(value: Value) -> Result<Value, Error> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(Error::Api { payload: value });
    }
    Ok(value)
}

/// Query parameters for one page of donation history.
pub(crate) fn donates_query(page: u32, per_page: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("size", per_page.to_string())]
}
