//! Blocking transport over `reqwest::blocking::Client`.

use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{TOKEN_HEADER, classify_envelope};
use crate::error::Error;

/// Blocking counterpart of [`Transport`](super::Transport).
///
/// Shared between the polling worker thread and foreground calls on the
/// caller's thread; `reqwest::blocking::Client` is internally synchronized,
/// so that sharing is safe.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: Client,
    token: String,
}

impl Transport {
    pub(crate) fn new(token: String) -> Self {
        Self {
            http: Client::new(),
            token,
        }
    }

    /// Assemble one authenticated request against an endpoint.
    fn build(
        &self,
        method: Method,
        base: &Url,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<reqwest::blocking::Request, Error> {
        let mut request = self
            .http
            .request(method, base.join(path)?)
            .header(TOKEN_HEADER, &self.token);
        if !query.is_empty() {
            request = request.query(query);
        }
        Ok(request.build()?)
    }

    /// Issue one request and classify the decoded body.
    pub(crate) fn request(
        &self,
        method: Method,
        base: &Url,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, Error> {
        let request = self.build(method, base, path, query)?;
        let url = request.url().clone();
        let response = self.http.execute(request)?;
        let value: Value = response.json()?;
        debug!(%url, "decoded response");
        classify_envelope(value)
    }
}
