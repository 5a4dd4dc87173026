//! The donation-event shape returned by the widget polling endpoint.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use super::datetime;

/// A donation event from the widget polling endpoint.
///
/// Richer than [`Donation`](super::Donation): it carries the media
/// attachments and moderation flags the alert widget needs.  The two shapes
/// are deliberately separate types; the server never mixes them.
///
/// Note that `amount` is a string here — that is what the polling endpoint
/// sends, unlike the integer amounts of the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongpollDonate {
    #[serde(rename = "clientName")]
    pub client_name: String,
    pub message: String,
    pub amount: String,
    pub currency: String,
    pub source: String,
    pub image: String,
    pub sound: String,
    pub video: String,
    #[serde(rename = "interactionMedia")]
    pub interaction_media: String,
    #[serde(rename = "interactionMediaStartTime")]
    pub interaction_media_start_time: String,
    #[serde(rename = "goalWidgetName")]
    pub goal_widget_name: String,
    #[serde(rename = "manuallyApproved")]
    pub manually_approved: bool,
    pub ban: bool,
    #[serde(rename = "isPublished")]
    pub is_published: bool,
    #[serde(rename = "createdAt", with = "datetime::wire")]
    pub created_at: PrimitiveDateTime,
    #[serde(rename = "isSubscription")]
    pub is_subscription: bool,
    #[serde(rename = "uploadedVoice")]
    pub uploaded_voice: String,
    pub name: String,
}

impl PartialOrd for LongpollDonate {
    /// Compares the wire `amount` strings lexicographically, as the server
    /// sends them.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for LongpollDonate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "donation from {}: {} {} at {}",
            self.client_name,
            self.amount,
            self.currency,
            datetime::format(&self.created_at)
        )
    }
}
