//! Async transport over `reqwest::Client`.

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{TOKEN_HEADER, classify_envelope};
use crate::error::Error;

/// One authenticated HTTP session.
///
/// Cloning is cheap and shares the underlying connection pool, so the
/// polling engine and foreground calls reuse a single session per client
/// instance.  `reqwest::Client` is internally synchronized, which makes
/// concurrent foreground calls during active polling safe.
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
    ) -> Result<reqwest::Request, Error> {
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
    ///
    /// Every request carries the `X-Token` header.  Single attempt, no
    /// retry; transport failures surface as [`Error::Transport`].
    pub(crate) async fn request(
        &self,
        method: Method,
        base: &Url,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, Error> {
        let request = self.build(method, base, path, query)?;
        let url = request.url().clone();
        let response = self.http.execute(request).await?;
        let value: Value = response.json().await?;
        debug!(%url, "decoded response");
        classify_envelope(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::donates_query;

    #[test]
    fn donates_request_url_carries_page_and_size() {
        let transport = Transport::new("secret".into());
        let base = Url::parse("https://donatello.to/api/v1/").unwrap();
        let request = transport
            .build(Method::GET, &base, "donates", &donates_query(1, 10))
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://donatello.to/api/v1/donates?page=1&size=10"
        );
        assert_eq!(request.headers().get(TOKEN_HEADER).unwrap(), "secret");
    }

    #[test]
    fn requests_without_query_have_no_query_string() {
        let transport = Transport::new("secret".into());
        let base = Url::parse("https://donatello.to/api/v1/").unwrap();
        let request = transport.build(Method::GET, &base, "me", &[]).unwrap();
        assert_eq!(request.url().as_str(), "https://donatello.to/api/v1/me");
        assert!(request.url().query().is_none());
    }
}
