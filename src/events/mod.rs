//! Ordered listener registries for the client event channels.
//!
//! The client exposes exactly three channels — `ready`, `donate` and
//! `error` — each backed by one bus.  Listeners are invoked strictly in
//! registration order, one at a time; the bus never runs them in parallel
//! and never swallows a listener failure.
//!
//! Two variants exist, mirroring the two client modes:
//!
//! * [`bus::EventBus`] — listeners are async; each returned future is
//!   awaited to completion before the next listener starts.
//! * [`blocking::EventBus`] — listeners are plain closures run on the
//!   polling worker thread.

#[cfg(feature = "blocking")]
pub mod blocking;
pub mod bus;

/// Opaque handle identifying one registered listener.
///
/// Returned by `add_listener`; the only way to remove a listener again.
/// Registering the same closure twice yields two distinct handles, and both
/// registrations fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// The handle passed to `remove_listener` was never registered on this bus,
/// or has already been removed.
#[derive(Debug, thiserror::Error)]
#[error("listener not found")]
pub struct ListenerNotFound;
