//! Public client facades.
//!
//! [`Donatello`] is the async client; [`blocking::Donatello`] is its
//! thread-based twin (behind the `blocking` cargo feature).  Both compose
//! the same pieces: one transport session, the typed models, the three event
//! buses, and a polling engine when a widget id was supplied.

#[cfg(feature = "blocking")]
pub mod blocking;

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use reqwest::Method;
use time::PrimitiveDateTime;
use tracing::warn;
use url::Url;

use crate::config::{Config, DEFAULT_POLL_INTERVAL};
use crate::error::Error;
use crate::events::{ListenerHandle, ListenerNotFound};
use crate::models::{self, ClientList, DonationList, DonationSummary, LongpollDonate, User};
use crate::polling::engine::{Channels, Engine, Fetch};
use crate::transport::{Transport, donates_query};

/// Configures and builds a client.
///
/// Entry point: [`Donatello::builder`].  Only the token is required;
/// without a widget id the client still serves foreground calls but long
/// polling stays disabled.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    token: String,
    widget_id: Option<String>,
    poll_interval: Duration,
    api_base: Option<Url>,
    widget_base: Option<Url>,
}

impl ClientBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            widget_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            api_base: None,
            widget_base: None,
        }
    }

    /// Widget identifier; enables long polling.
    pub fn widget_id(mut self, widget_id: impl Into<String>) -> Self {
        self.widget_id = Some(widget_id.into());
        self
    }

    /// Pause between polling iterations (default 1 second).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the general API base URL (default `https://donatello.to/api/v1/`).
    pub fn api_base(mut self, url: Url) -> Self {
        self.api_base = Some(url);
        self
    }

    /// Override the widget base URL (default `https://donatello.to/widget/`).
    pub fn widget_base(mut self, url: Url) -> Self {
        self.widget_base = Some(url);
        self
    }

    fn into_config(self) -> Result<Config, Error> {
        Config::new(
            self.token,
            self.widget_id,
            self.poll_interval,
            self.api_base,
            self.widget_base,
        )
    }

    /// Build the async client.
    pub fn build(self) -> Result<Donatello, Error> {
        let config = self.into_config()?;
        let transport = Transport::new(config.token.clone());
        let channels = Arc::new(Channels::new());
        let profile = Arc::new(std::sync::Mutex::new(None));
        let engine = config.widget_url.clone().map(|widget_url| {
            Arc::new(Engine::new(
                ApiFetch {
                    transport: transport.clone(),
                    api_base: config.api_base.clone(),
                    widget_url,
                },
                channels.clone(),
                profile.clone(),
                config.poll_interval,
            ))
        });
        Ok(Donatello {
            transport,
            config,
            channels,
            profile,
            engine,
        })
    }

    /// Build the blocking client.
    #[cfg(feature = "blocking")]
    pub fn build_blocking(self) -> Result<blocking::Donatello, Error> {
        Ok(blocking::Donatello::from_config(self.into_config()?))
    }
}

/// Real [`Fetch`] implementation backed by the shared transport session.
struct ApiFetch {
    transport: Transport,
    api_base: Url,
    widget_url: Url,
}

impl Fetch for ApiFetch {
    async fn fetch_profile(&self) -> Result<serde_json::Value, Error> {
        self.transport
            .request(Method::GET, &self.api_base, "me", &[])
            .await
    }

    async fn poll_widget(&self) -> Result<serde_json::Value, Error> {
        self.transport
            .request(Method::GET, &self.widget_url, "info", &[])
            .await
    }
}

/// Async client for the Donatello API.
///
/// Foreground calls (`get_me`, `get_donates`, `get_clients`) fail loudly by
/// returning [`Error`]; the background polling loop fails softly by routing
/// every per-iteration failure to the `error` channel.
///
/// ```no_run
/// use donatello::Donatello;
///
/// # async fn demo() -> Result<(), donatello::Error> {
/// let client = Donatello::builder("your_token")
///     .widget_id("widget_id")
///     .build()?;
///
/// let user = client.get_me().await?;
/// println!("{user}");
///
/// client.on_donate(|donate| async move {
///     println!("{donate}");
///     Ok(())
/// });
/// client.run().await; // until client.stop()
/// # Ok(())
/// # }
/// ```
pub struct Donatello {
    transport: Transport,
    config: Config,
    channels: Arc<Channels>,
    profile: Arc<std::sync::Mutex<Option<User>>>,
    engine: Option<Arc<Engine<ApiFetch>>>,
}

impl Donatello {
    /// Start configuring a client with the given API token.
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    // -- Foreground calls ---------------------------------------------------

    /// `GET /me` — fetch the account profile and cache the snapshot.
    pub async fn get_me(&self) -> Result<User, Error> {
        let value = self
            .transport
            .request(Method::GET, &self.config.api_base, "me", &[])
            .await?;
        let user: User = models::parse(&value)?;
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(user)
    }

    /// `GET /donates?page=&size=` — one page of donation history, in
    /// server-provided order.
    pub async fn get_donates(&self, page: u32, per_page: u32) -> Result<DonationList, Error> {
        let query = donates_query(page, per_page);
        let value = self
            .transport
            .request(Method::GET, &self.config.api_base, "donates", &query)
            .await?;
        models::parse(&value)
    }

    /// `GET /clients` — every supporter of the account.
    pub async fn get_clients(&self) -> Result<ClientList, Error> {
        let value = self
            .transport
            .request(Method::GET, &self.config.api_base, "clients", &[])
            .await?;
        models::parse(&value)
    }

    // -- Cached profile snapshot --------------------------------------------

    /// The last profile fetched by [`get_me`](Self::get_me) or the ready
    /// tick; `None` before the first successful fetch.
    pub fn user(&self) -> Option<User> {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn nickname(&self) -> Option<String> {
        self.user().map(|user| user.nickname)
    }

    pub fn public_id(&self) -> Option<String> {
        self.user().map(|user| user.public_id)
    }

    pub fn page(&self) -> Option<String> {
        self.user().map(|user| user.page)
    }

    pub fn is_active(&self) -> Option<bool> {
        self.user().map(|user| user.is_active)
    }

    pub fn is_public(&self) -> Option<bool> {
        self.user().map(|user| user.is_public)
    }

    pub fn donates(&self) -> Option<DonationSummary> {
        self.user().map(|user| user.donates)
    }

    pub fn created_at(&self) -> Option<PrimitiveDateTime> {
        self.user().map(|user| user.created_at)
    }

    // -- Listener registration ----------------------------------------------

    /// Register a `ready` listener; fires once per start with the profile.
    pub fn on_ready<F, Fut>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(User) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.channels.ready.add_listener(listener)
    }

    /// Register a `donate` listener; fires once per detected donation.
    pub fn on_donate<F, Fut>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(LongpollDonate) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.channels.donate.add_listener(listener)
    }

    /// Register an `error` listener; fires once per classified failure.
    pub fn on_error<F, Fut>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(Arc<Error>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.channels.error.add_listener(listener)
    }

    pub fn remove_ready_listener(&self, handle: ListenerHandle) -> Result<(), ListenerNotFound> {
        self.channels.ready.remove_listener(handle)
    }

    /// Safe to call from inside a `donate` listener; the bus never holds
    /// its lock while listeners run.
    pub fn remove_donate_listener(&self, handle: ListenerHandle) -> Result<(), ListenerNotFound> {
        self.channels.donate.remove_listener(handle)
    }

    pub fn remove_error_listener(&self, handle: ListenerHandle) -> Result<(), ListenerNotFound> {
        self.channels.error.remove_listener(handle)
    }

    // -- Polling lifecycle --------------------------------------------------

    /// Whether a widget id was supplied, i.e. whether polling can run.
    pub fn is_polling_enabled(&self) -> bool {
        self.config.polling_enabled()
    }

    /// Whether the polling loop is currently running.
    pub fn is_polling(&self) -> bool {
        self.engine.as_ref().is_some_and(|engine| engine.is_running())
    }

    /// Spawn the polling loop on the current tokio runtime and return
    /// immediately.  Without a widget id this only logs a warning — a
    /// deliberately degraded mode, not an error.  No-op while running.
    pub fn start(&self) {
        match &self.engine {
            Some(engine) => engine.spawn(),
            None => warn_polling_disabled(),
        }
    }

    /// Drive the polling loop on the caller's task; returns only once
    /// [`stop`](Self::stop) causes loop exit.
    pub async fn run(&self) {
        match &self.engine {
            Some(engine) => engine.run().await,
            None => warn_polling_disabled(),
        }
    }

    /// Request loop termination.  Idempotent; calling while stopped is a
    /// no-op.  The loop may finish one in-flight iteration first.
    pub fn stop(&self) {
        if let Some(engine) = &self.engine {
            engine.stop();
        }
    }
}

impl Drop for Donatello {
    /// Best-effort teardown: signal the loop to stop.  The task observes
    /// the flag and releases the transport session on its own; this path
    /// never panics.
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) fn warn_polling_disabled() {
    warn!("widget id not specified; long polling is disabled");
    warn!("supply a widget id at construction to receive donate and error events");
}
