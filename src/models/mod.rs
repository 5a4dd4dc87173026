//! Typed response models for the Donatello API.
//!
//! Every model maps a camelCase wire object onto a snake_case Rust struct
//! via serde renames.  Parsing is all-or-nothing: a missing required field
//! or a malformed timestamp fails the whole entity with
//! [`Error::Validation`](crate::Error::Validation), never a partial value.

mod client;
pub(crate) mod datetime;
mod donation;
pub(crate) mod longpoll;
mod user;

pub use client::{Client, ClientList};
pub use donation::{Donation, DonationList};
pub use longpoll::LongpollDonate;
pub use user::{DonationSummary, User};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Parse a decoded response body into a typed model.
///
/// On failure the offending payload is attached to the error so polling
/// can forward it to error listeners.
pub(crate) fn parse<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    T::deserialize(value).map_err(|source| Error::Validation {
        source,
        payload: value.clone(),
    })
}
