//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// API version baked into the default base URL.
pub const API_VERSION: &str = "v1";

pub(crate) const DEFAULT_API_ROOT: &str = "https://donatello.to/api/";
pub(crate) const DEFAULT_WIDGET_BASE: &str = "https://donatello.to/widget/";

/// Default pause between polling iterations.
pub(crate) const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Resolved configuration shared by both client modes.
///
/// Built by [`ClientBuilder`](crate::client::ClientBuilder); both base URLs
/// are overridable there so tests and self-hosted deployments can point the
/// client elsewhere.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub token: String,
    pub widget_id: Option<String>,
    pub poll_interval: Duration,
    pub api_base: Url,
    /// Fully resolved widget polling URL; `None` when no widget id was
    /// supplied, which disables long polling.
    pub widget_url: Option<Url>,
}

impl Config {
    pub(crate) fn new(
        token: String,
        widget_id: Option<String>,
        poll_interval: Duration,
        api_base: Option<Url>,
        widget_base: Option<Url>,
    ) -> Result<Self, Error> {
        let api_base = match api_base {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_ROOT)?.join(&format!("{API_VERSION}/"))?,
        };
        let widget_base = match widget_base {
            Some(url) => url,
            None => Url::parse(DEFAULT_WIDGET_BASE)?,
        };
        // The polling endpoint authenticates through the path rather than
        // headers: /widget/{widget_id}/token/{token}/.
        let widget_url = match &widget_id {
            Some(id) => Some(widget_base.join(&format!("{id}/token/{token}/"))?),
            None => None,
        };
        Ok(Self {
            token,
            widget_id,
            poll_interval,
            api_base,
            widget_url,
        })
    }

    /// Whether long polling can run at all.
    pub(crate) fn polling_enabled(&self) -> bool {
        self.widget_url.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn widget_url_embeds_widget_and_token() {
        let config = Config::new(
            "t".into(),
            Some("w".into()),
            DEFAULT_POLL_INTERVAL,
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            config.widget_url.unwrap().as_str(),
            "https://donatello.to/widget/w/token/t/"
        );
        assert_eq!(config.api_base.as_str(), "https://donatello.to/api/v1/");
    }

    #[test]
    fn default_api_base_carries_the_api_version() {
        let config =
            Config::new("t".into(), None, DEFAULT_POLL_INTERVAL, None, None).unwrap();
        assert!(config.api_base.path().ends_with(&format!("{API_VERSION}/")));
    }

    #[test]
    fn missing_widget_id_disables_polling() {
        let config =
            Config::new("t".into(), None, DEFAULT_POLL_INTERVAL, None, None).unwrap();
        assert!(!config.polling_enabled());
        assert!(config.widget_url.is_none());
    }

    #[test]
    fn base_urls_are_overridable() {
        let config = Config::new(
            "t".into(),
            Some("w".into()),
            DEFAULT_POLL_INTERVAL,
            Some(Url::parse("http://localhost:8080/api/").unwrap()),
            Some(Url::parse("http://localhost:8080/widget/").unwrap()),
        )
        .unwrap();
        assert_eq!(config.api_base.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            config.widget_url.unwrap().as_str(),
            "http://localhost:8080/widget/w/token/t/"
        );
    }
}
