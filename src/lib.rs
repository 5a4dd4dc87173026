//! Client SDK for the [Donatello](https://donatello.to) donation platform.
//!
//! Two client flavors share the same behavior:
//!
//! * [`Donatello`] — async, for tokio applications; polling runs as a
//!   cooperative task on the caller's runtime.
//! * [`blocking::Donatello`] — synchronous, with the polling loop on a
//!   dedicated worker thread (requires the default `blocking` feature).
//!
//! Both expose the data endpoints (`get_me`, `get_donates`, `get_clients`)
//! and a long-polling notifier with three event channels: `ready` (fires
//! once per start with the profile), `donate` (fires per detected donation)
//! and `error` (fires per classified failure).
//!
//! The SDK emits diagnostics through [`tracing`]; it never installs a
//! subscriber itself, so verbosity is entirely up to the embedding
//! application.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod client;
mod config;
mod error;
pub mod events;
pub mod models;
mod polling;
mod transport;

pub use client::{ClientBuilder, Donatello};
pub use config::API_VERSION;
pub use error::Error;
pub use events::{ListenerHandle, ListenerNotFound};
pub use models::{
    Client, ClientList, Donation, DonationList, DonationSummary, LongpollDonate, User,
};

/// Blocking client, mirroring [`Donatello`] on a worker thread.
#[cfg(feature = "blocking")]
pub mod blocking {
    pub use crate::client::blocking::Donatello;
    pub use crate::events::blocking::EventBus;
}
