//! Threaded polling engine (worker-thread driver).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{Tick, classify_tick};
use crate::error::Error;
use crate::events::blocking::EventBus;
use crate::models::{self, LongpollDonate, User};

/// Blocking counterpart of [`engine::Fetch`](super::engine::Fetch).
pub(crate) trait Fetch: Send + Sync + 'static {
    /// `GET {apiBase}/me`.
    fn fetch_profile(&self) -> Result<Value, Error>;
    /// `GET {widgetUrl}info`.
    fn poll_widget(&self) -> Result<Value, Error>;
}

/// The three fixed event channels of the blocking client.
///
/// All dispatches happen on the polling worker thread.  Each bus
/// synchronizes internally and never holds its lock while a listener runs,
/// so a listener can remove its own handle without self-deadlocking the
/// worker.
pub(crate) struct Channels {
    pub ready: EventBus<User>,
    pub donate: EventBus<LongpollDonate>,
    pub error: EventBus<Error>,
}

impl Channels {
    pub(crate) fn new() -> Self {
        Self {
            ready: EventBus::new(),
            donate: EventBus::new(),
            error: EventBus::new(),
        }
    }
}

/// Long-polling loop for the blocking client, run on a dedicated worker
/// thread.  Same lifecycle and per-iteration error routing as the async
/// engine; pacing uses `std::thread::sleep`.
pub(crate) struct Engine<F> {
    fetch: F,
    channels: Arc<Channels>,
    profile: Arc<Mutex<Option<User>>>,
    interval: Duration,
    stop: AtomicBool,
    running: AtomicBool,
}

impl<F: Fetch> Engine<F> {
    pub(crate) fn new(
        fetch: F,
        channels: Arc<Channels>,
        profile: Arc<Mutex<Option<User>>>,
        interval: Duration,
    ) -> Self {
        Self {
            fetch,
            channels,
            profile,
            interval,
            stop: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request loop termination.  Idempotent; the worker observes the flag
    /// at the top of its next iteration.
    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Spawn the worker thread.  No-op when the loop is already running.
    pub(crate) fn spawn(self: &Arc<Self>) {
        if !self.begin() {
            debug!("long polling already running");
            return;
        }
        let engine = self.clone();
        let spawned = std::thread::Builder::new()
            .name("donatello-longpoll".into())
            .spawn(move || engine.run_loop());
        if let Err(err) = spawned {
            self.running.store(false, Ordering::SeqCst);
            error!(error = %err, "failed to spawn polling thread");
        }
    }

    /// Transition `Stopped → Starting`; false when already running.
    fn begin(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.stop.store(false, Ordering::SeqCst);
        true
    }

    fn run_loop(&self) {
        info!("long polling started");
        self.ready_tick();
        while !self.stop.load(Ordering::SeqCst) {
            if let Err(err) = self.poll_once() {
                self.emit_error(err);
            }
            std::thread::sleep(self.interval);
        }
        self.running.store(false, Ordering::SeqCst);
        info!("long polling stopped");
    }

    /// Fetch the profile once and fire `ready` before any donation polling.
    fn ready_tick(&self) {
        let outcome = match self.fetch.fetch_profile() {
            Ok(value) => models::parse::<User>(&value),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(user) => {
                *self.profile.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(user.clone());
                if let Err(err) = self.channels.ready.dispatch(&user) {
                    self.emit_error(Error::Listener(err));
                }
            }
            Err(err) => self.emit_error(err),
        }
    }

    fn poll_once(&self) -> Result<(), Error> {
        let value = self.fetch.poll_widget()?;
        match classify_tick(&value)? {
            Tick::Donation(donate) => {
                info!(client_name = %donate.client_name, "new donation");
                self.channels
                    .donate
                    .dispatch(&donate)
                    .map_err(Error::Listener)?;
            }
            Tick::Heartbeat => debug!("heartbeat tick"),
        }
        Ok(())
    }

    fn emit_error(&self, err: Error) {
        error!(error = %err, "polling error");
        if let Err(listener_err) = self.channels.error.dispatch(&err) {
            warn!(error = %listener_err, "error listener failed");
        }
    }
}
