//! Async polling engine (tokio task driver).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{Tick, classify_tick};
use crate::error::Error;
use crate::events::bus::EventBus;
use crate::models::{self, LongpollDonate, User};

/// The two requests the engine needs, abstracted so tests can script
/// responses without a server.
pub(crate) trait Fetch: Send + Sync + 'static {
    /// `GET {apiBase}/me`.
    fn fetch_profile(&self) -> impl Future<Output = Result<Value, Error>> + Send;
    /// `GET {widgetUrl}info`.
    fn poll_widget(&self) -> impl Future<Output = Result<Value, Error>> + Send;
}

/// The three fixed event channels of the async client.
///
/// Each bus synchronizes internally and never holds its lock while a
/// listener runs, so listeners can register and remove handles on the same
/// channel they fire on.
pub(crate) struct Channels {
    pub ready: EventBus<User>,
    pub donate: EventBus<LongpollDonate>,
    pub error: EventBus<Arc<Error>>,
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

/// Long-polling loop for the async client.
///
/// Lifecycle: `Stopped → Starting → Polling → (loop) → Stopping → Stopped`.
/// Stopping is cooperative — the flag is observed at the top of each
/// iteration, so one in-flight iteration may still complete.  After the loop
/// exits the engine is eligible for a fresh start.
pub(crate) struct Engine<F> {
    fetch: F,
    channels: Arc<Channels>,
    profile: Arc<std::sync::Mutex<Option<User>>>,
    interval: Duration,
    stop_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl<F: Fetch> Engine<F> {
    pub(crate) fn new(
        fetch: F,
        channels: Arc<Channels>,
        profile: Arc<std::sync::Mutex<Option<User>>>,
        interval: Duration,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            fetch,
            channels,
            profile,
            interval,
            stop_tx,
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request loop termination.  Idempotent; calling while stopped is a
    /// no-op (the flag is cleared again on the next start).
    pub(crate) fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Spawn the loop on the current tokio runtime and return immediately.
    /// No-op when the loop is already running.
    pub(crate) fn spawn(self: &Arc<Self>) {
        if !self.begin() {
            debug!("long polling already running");
            return;
        }
        let engine = self.clone();
        tokio::spawn(async move { engine.run_loop().await });
    }

    /// Drive the loop on the caller's task; returns only after `stop()`
    /// causes loop exit.  No-op when the loop is already running.
    pub(crate) async fn run(self: &Arc<Self>) {
        if !self.begin() {
            debug!("long polling already running");
            return;
        }
        self.clone().run_loop().await;
    }

    /// Transition `Stopped → Starting`; false when already running.
    fn begin(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.stop_tx.send_replace(false);
        true
    }

    async fn run_loop(self: Arc<Self>) {
        info!("long polling started");
        let mut stop_rx = self.stop_tx.subscribe();
        self.ready_tick().await;
        while !*stop_rx.borrow_and_update() {
            if let Err(err) = self.poll_once().await {
                self.emit_error(err).await;
            }
            tokio::time::sleep(self.interval).await;
        }
        self.running.store(false, Ordering::SeqCst);
        info!("long polling stopped");
    }

    /// Fetch the profile once and fire `ready` before any donation polling.
    /// A failure here goes to the error channel; the loop still runs.
    async fn ready_tick(&self) {
        let outcome = match self.fetch.fetch_profile().await {
            Ok(value) => models::parse::<User>(&value),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(user) => {
                *self.profile.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(user.clone());
                if let Err(err) = self.channels.ready.dispatch(&user).await {
                    self.emit_error(Error::Listener(err)).await;
                }
            }
            Err(err) => self.emit_error(err).await,
        }
    }

    /// One loop iteration: fetch, classify, dispatch.
    async fn poll_once(&self) -> Result<(), Error> {
        let value = self.fetch.poll_widget().await?;
        match classify_tick(&value)? {
            Tick::Donation(donate) => {
                info!(client_name = %donate.client_name, "new donation");
                self.channels
                    .donate
                    .dispatch(&donate)
                    .await
                    .map_err(Error::Listener)?;
            }
            Tick::Heartbeat => debug!("heartbeat tick"),
        }
        Ok(())
    }

    /// Route one failure to the error channel.  A failing *error* listener
    /// is only logged; recursing into the channel would never terminate.
    async fn emit_error(&self, err: Error) {
        error!(error = %err, "polling error");
        let err = Arc::new(err);
        if let Err(listener_err) = self.channels.error.dispatch(&err).await {
            warn!(error = %listener_err, "error listener failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::longpoll::tests::longpoll_json;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    /// Pops scripted widget responses; serves empty heartbeats once the
    /// script runs out.
    struct ScriptedFetch {
        profile: Result<Value, ()>,
        ticks: std::sync::Mutex<VecDeque<Result<Value, Error>>>,
        profile_fetches: AtomicUsize,
        polls: AtomicUsize,
    }

    impl ScriptedFetch {
        fn new(ticks: Vec<Result<Value, Error>>) -> Self {
            Self {
                profile: Ok(json!({
                    "nickname": "streamer",
                    "pubId": "abc123",
                    "page": "https://donatello.to/streamer",
                    "isActive": true,
                    "isPublic": true,
                    "donates": {"totalAmount": 100, "totalCount": 1},
                    "createdAt": "2022-07-01 10:20:30"
                })),
                ticks: std::sync::Mutex::new(ticks.into()),
                profile_fetches: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
            }
        }

        fn with_bad_profile(mut self) -> Self {
            self.profile = Err(());
            self
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for Arc<ScriptedFetch> {
        async fn fetch_profile(&self) -> Result<Value, Error> {
            self.profile_fetches.fetch_add(1, Ordering::SeqCst);
            match &self.profile {
                Ok(value) => Ok(value.clone()),
                Err(()) => Err(Error::Api {
                    payload: json!({"success": false, "msg": "bad token"}),
                }),
            }
        }

        async fn poll_widget(&self) -> Result<Value, Error> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.ticks
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(json!({})))
        }
    }

    fn engine_with(
        ticks: Vec<Result<Value, Error>>,
    ) -> (Arc<Engine<Arc<ScriptedFetch>>>, Arc<ScriptedFetch>, Arc<Channels>) {
        let fetch = Arc::new(ScriptedFetch::new(ticks));
        let channels = Arc::new(Channels::new());
        let engine = Arc::new(Engine::new(
            fetch.clone(),
            channels.clone(),
            Arc::new(std::sync::Mutex::new(None)),
            Duration::from_millis(1),
        ));
        (engine, fetch, channels)
    }

    async fn collect_error_payloads(channels: &Channels) -> Arc<std::sync::Mutex<Vec<String>>> {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_inner = seen.clone();
        channels.error.add_listener(move |err: Arc<Error>| {
            let seen_inner = seen_inner.clone();
            async move {
                let rendered = match err.payload() {
                    Some(payload) => payload.to_string(),
                    None => err.to_string(),
                };
                seen_inner.lock().unwrap().push(rendered);
                Ok(())
            }
        });
        seen
    }

    #[tokio::test]
    async fn api_error_tick_emits_one_error_and_loop_continues() {
        let (engine, fetch, channels) = engine_with(vec![Err(Error::Api {
            payload: json!({"success": false, "msg": "bad token"}),
        })]);
        let errors = collect_error_payloads(&channels).await;

        engine.spawn();
        sleep(Duration::from_millis(80)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        let seen = errors.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            serde_json::from_str::<Value>(&seen[0]).unwrap(),
            json!({"success": false, "msg": "bad token"})
        );
        // The loop kept going after the bad tick.
        assert!(fetch.poll_count() > 1);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn malformed_donation_emits_one_error_and_next_iteration_runs() {
        let mut broken = longpoll_json();
        broken.as_object_mut().unwrap().remove("amount");
        let (engine, fetch, channels) = engine_with(vec![Ok(broken)]);
        let errors = collect_error_payloads(&channels).await;

        engine.spawn();
        sleep(Duration::from_millis(80)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        assert_eq!(errors.lock().unwrap().len(), 1);
        assert!(fetch.poll_count() > 1);
    }

    #[tokio::test]
    async fn donation_tick_reaches_donate_listeners() {
        let (engine, _fetch, channels) = engine_with(vec![Ok(longpoll_json())]);

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_inner = seen.clone();
        channels
            .donate
            .add_listener(move |donate: LongpollDonate| {
                let seen_inner = seen_inner.clone();
                async move {
                    seen_inner
                        .lock()
                        .unwrap()
                        .push((donate.client_name, donate.amount));
                    Ok(())
                }
            });

        engine.spawn();
        sleep(Duration::from_millis(50)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("Alice".to_string(), "10".to_string())]);
    }

    #[tokio::test]
    async fn donate_listener_can_remove_itself_and_polling_continues() {
        let (engine, fetch, channels) = engine_with(vec![
            Ok(longpoll_json()),
            Ok(longpoll_json()),
        ]);

        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<std::sync::Mutex<Option<crate::events::ListenerHandle>>> =
            Arc::new(std::sync::Mutex::new(None));
        let calls_inner = calls.clone();
        let slot_inner = slot.clone();
        let channels_inner = channels.clone();
        let handle = channels.donate.add_listener(move |_donate: LongpollDonate| {
            let calls = calls_inner.clone();
            let slot = slot_inner.clone();
            let channels = channels_inner.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(handle) = slot.lock().unwrap().take() {
                    channels.donate.remove_listener(handle)?;
                }
                Ok(())
            }
        });
        *slot.lock().unwrap() = Some(handle);

        engine.spawn();
        sleep(Duration::from_millis(80)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        // The listener fired once, unhooked itself without wedging the
        // loop, and missed the second donation.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(fetch.poll_count() > 2);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn ready_fires_before_any_donation() {
        let (engine, _fetch, channels) = engine_with(vec![Ok(longpoll_json())]);

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let on_ready = order.clone();
        channels.ready.add_listener(move |user: User| {
            let on_ready = on_ready.clone();
            async move {
                on_ready.lock().unwrap().push(format!("ready:{}", user.nickname));
                Ok(())
            }
        });
        let on_donate = order.clone();
        channels
            .donate
            .add_listener(move |donate: LongpollDonate| {
                let on_donate = on_donate.clone();
                async move {
                    on_donate
                        .lock()
                        .unwrap()
                        .push(format!("donate:{}", donate.client_name));
                    Ok(())
                }
            });

        engine.spawn();
        sleep(Duration::from_millis(50)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        let order = order.lock().unwrap().clone();
        assert_eq!(order[0], "ready:streamer");
        assert_eq!(order[1], "donate:Alice");
    }

    #[tokio::test]
    async fn failing_donate_listener_degrades_to_error_events() {
        let (engine, fetch, channels) = engine_with(vec![
            Ok(longpoll_json()),
            Ok(longpoll_json()),
        ]);
        channels
            .donate
            .add_listener(|_donate: LongpollDonate| async {
                Err(anyhow::anyhow!("listener broke"))
            });
        let errors = collect_error_payloads(&channels).await;

        engine.spawn();
        sleep(Duration::from_millis(80)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        // One error event per bad iteration, and the loop survived both.
        assert_eq!(errors.lock().unwrap().len(), 2);
        assert!(fetch.poll_count() > 2);
    }

    #[tokio::test]
    async fn failed_ready_fetch_goes_to_error_channel_and_loop_runs() {
        let fetch = Arc::new(ScriptedFetch::new(vec![]).with_bad_profile());
        let channels = Arc::new(Channels::new());
        let engine = Arc::new(Engine::new(
            fetch.clone(),
            channels.clone(),
            Arc::new(std::sync::Mutex::new(None)),
            Duration::from_millis(1),
        ));
        let errors = collect_error_payloads(&channels).await;

        engine.spawn();
        sleep(Duration::from_millis(50)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        assert_eq!(errors.lock().unwrap().len(), 1);
        // Donation polling still started despite the failed ready fetch.
        assert!(fetch.poll_count() > 0);
    }

    #[tokio::test]
    async fn double_start_is_a_no_op() {
        let (engine, fetch, _channels) = engine_with(vec![]);

        engine.spawn();
        engine.spawn();
        sleep(Duration::from_millis(30)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        assert_eq!(fetch.profile_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_when_stopped_is_a_no_op_and_engine_restarts() {
        let (engine, fetch, _channels) = engine_with(vec![]);

        engine.stop();
        engine.stop();

        engine.spawn();
        sleep(Duration::from_millis(30)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;
        assert!(!engine.is_running());

        engine.spawn();
        sleep(Duration::from_millis(30)).await;
        engine.stop();
        sleep(Duration::from_millis(20)).await;

        assert_eq!(fetch.profile_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ready_tick_updates_profile_cache() {
        let fetch = Arc::new(ScriptedFetch::new(vec![]));
        let channels = Arc::new(Channels::new());
        let profile = Arc::new(std::sync::Mutex::new(None));
        let engine = Arc::new(Engine::new(
            fetch,
            channels,
            profile.clone(),
            Duration::from_millis(1),
        ));

        engine.spawn();
        sleep(Duration::from_millis(30)).await;
        engine.stop();

        let cached = profile.lock().unwrap().clone();
        assert_eq!(cached.unwrap().nickname, "streamer");
    }
}
