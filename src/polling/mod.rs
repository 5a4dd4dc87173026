//! The long-polling state machine.
//!
//! One engine repeatedly fetches the widget status endpoint, classifies each
//! decoded tick, and drives the event buses.  The loop logic is identical in
//! both client modes; only the driver differs:
//!
//! * [`engine::Engine`] — a tokio task, paced with `tokio::time::sleep`,
//!   stopped through a `watch` flag.
//! * [`blocking::Engine`] — a dedicated worker thread, paced with
//!   `std::thread::sleep`, stopped through an atomic flag.
//!
//! Both observe the stop flag at the top of each iteration (cooperative
//! cancellation — an in-flight request is never aborted) and route every
//! per-iteration failure to the `error` channel so that a single bad tick
//! never terminates the loop.

#[cfg(feature = "blocking")]
pub(crate) mod blocking;
pub(crate) mod engine;

use serde_json::Value;

use crate::error::Error;
use crate::models::{self, LongpollDonate};

/// Outcome of classifying one successfully decoded polling tick.
#[derive(Debug)]
pub(crate) enum Tick {
    /// The tick carries a donation event.
    Donation(Box<LongpollDonate>),
    /// Benign no-op tick (empty heartbeat); ignored.
    Heartbeat,
}

/// Decide what one polling tick is.
///
/// The protocol has no event-type discriminator; a donation is recognized
/// purely by shape.  The rule here: no `success` key *and* a `clientName`
/// key present.  `success: false` bodies never reach this function — the
/// transport already classified them as [`Error::Api`].  A donation-shaped
/// tick that fails to parse is a validation error carrying the raw payload.
pub(crate) fn classify_tick(value: &Value) -> Result<Tick, Error> {
    if value.get("success").is_none() && value.get("clientName").is_some() {
        return Ok(Tick::Donation(Box::new(models::parse(value)?)));
    }
    Ok(Tick::Heartbeat)
}
