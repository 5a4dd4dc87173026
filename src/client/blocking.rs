//! Thread-based client facade.

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Method;
use time::PrimitiveDateTime;

use crate::config::Config;
use crate::error::Error;
use crate::events::{ListenerHandle, ListenerNotFound};
use crate::models::{self, ClientList, DonationList, DonationSummary, LongpollDonate, User};
use crate::polling::blocking::{Channels, Engine, Fetch};
use crate::transport::blocking::Transport;
use crate::transport::donates_query;

use super::warn_polling_disabled;

/// Real [`Fetch`] implementation backed by the shared blocking transport.
struct ApiFetch {
    transport: Transport,
    api_base: url::Url,
    widget_url: url::Url,
}

impl Fetch for ApiFetch {
    fn fetch_profile(&self) -> Result<serde_json::Value, Error> {
        self.transport
            .request(Method::GET, &self.api_base, "me", &[])
    }

    fn poll_widget(&self) -> Result<serde_json::Value, Error> {
        self.transport
            .request(Method::GET, &self.widget_url, "info", &[])
    }
}

/// Blocking client for the Donatello API.
///
/// Same surface as the async [`Donatello`](crate::Donatello), but every call
/// blocks the current thread and the polling loop runs on a dedicated worker
/// thread.  Listeners execute on that worker; foreground calls may run
/// concurrently on the caller's thread — the shared
/// `reqwest::blocking::Client` is internally synchronized, so that is safe.
///
/// ```no_run
/// use donatello::blocking::Donatello;
///
/// # fn demo() -> Result<(), donatello::Error> {
/// let client = Donatello::builder("your_token")
///     .widget_id("widget_id")
///     .build_blocking()?;
///
/// client.on_donate(|donate| {
///     println!("{donate}");
///     Ok(())
/// });
/// client.start();
/// # Ok(())
/// # }
/// ```
pub struct Donatello {
    transport: Transport,
    config: Config,
    channels: Arc<Channels>,
    profile: Arc<Mutex<Option<User>>>,
    engine: Option<Arc<Engine<ApiFetch>>>,
}

impl Donatello {
    /// Start configuring a client with the given API token.
    ///
    /// Finish with
    /// [`build_blocking`](crate::client::ClientBuilder::build_blocking).
    pub fn builder(token: impl Into<String>) -> crate::client::ClientBuilder {
        crate::client::ClientBuilder::new(token)
    }

    pub(crate) fn from_config(config: Config) -> Self {
        let transport = Transport::new(config.token.clone());
        let channels = Arc::new(Channels::new());
        let profile = Arc::new(Mutex::new(None));
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
        Self {
            transport,
            config,
            channels,
            profile,
            engine,
        }
    }

    // -- Foreground calls ---------------------------------------------------

    /// `GET /me` — fetch the account profile and cache the snapshot.
    pub fn get_me(&self) -> Result<User, Error> {
        let value = self
            .transport
            .request(Method::GET, &self.config.api_base, "me", &[])?;
        let user: User = models::parse(&value)?;
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(user)
    }

    /// `GET /donates?page=&size=` — one page of donation history, in
    /// server-provided order.
    pub fn get_donates(&self, page: u32, per_page: u32) -> Result<DonationList, Error> {
        let query = donates_query(page, per_page);
        let value =
            self.transport
                .request(Method::GET, &self.config.api_base, "donates", &query)?;
        models::parse(&value)
    }

    /// `GET /clients` — every supporter of the account.
    pub fn get_clients(&self) -> Result<ClientList, Error> {
        let value = self
            .transport
            .request(Method::GET, &self.config.api_base, "clients", &[])?;
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
    pub fn on_ready<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&User) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.channels.ready.add_listener(listener)
    }

    /// Register a `donate` listener; fires once per detected donation.
    pub fn on_donate<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&LongpollDonate) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.channels.donate.add_listener(listener)
    }

    /// Register an `error` listener; fires once per classified failure.
    pub fn on_error<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Error) -> anyhow::Result<()> + Send + Sync + 'static,
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

    /// Spawn the polling worker thread and return immediately.  Without a
    /// widget id this only logs a warning — a deliberately degraded mode,
    /// not an error.  No-op while running.
    pub fn start(&self) {
        match &self.engine {
            Some(engine) => engine.spawn(),
            None => warn_polling_disabled(),
        }
    }

    /// Request loop termination.  Idempotent; the worker may finish one
    /// in-flight iteration first.
    pub fn stop(&self) {
        if let Some(engine) = &self.engine {
            engine.stop();
        }
    }
}

impl Drop for Donatello {
    /// Best-effort teardown: signal the worker to stop.  The worker
    /// observes the flag, exits its loop and releases the transport
    /// session; this path never panics.
    fn drop(&mut self) {
        self.stop();
    }
}
