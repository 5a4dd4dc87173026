//! Donation history entities returned by `GET /donates`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use super::datetime;

/// A single donation from the paginated history endpoint.
///
/// Distinct from [`LongpollDonate`](super::LongpollDonate): the history
/// endpoint and the polling endpoint return different shapes for the same
/// underlying event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    #[serde(rename = "pubId")]
    pub id: String,
    #[serde(rename = "clientName")]
    pub client_name: String,
    pub message: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub goal: String,
    #[serde(rename = "isPublished")]
    pub is_published: bool,
    #[serde(rename = "createdAt", with = "datetime::wire")]
    pub created_at: PrimitiveDateTime,
}

impl PartialOrd for Donation {
    /// Compares by `amount` only; no secondary key.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Donation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "donation {} from {}: {} {} at {}",
            self.id,
            self.client_name,
            self.amount,
            self.currency,
            datetime::format(&self.created_at)
        )
    }
}

/// One page of donation history, in server-provided order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationList {
    #[serde(default)]
    pub content: Vec<Donation>,
    /// Zero-based page index that was requested.
    #[serde(default)]
    pub page: i64,
    /// Requested page size.
    #[serde(default = "default_page_size")]
    pub size: i64,
    /// Number of the current page.
    #[serde(default)]
    pub num: i64,
    pub first: bool,
    pub last: bool,
    /// Total number of donations across all pages.
    pub total: i64,
}

fn default_page_size() -> i64 {
    20
}

impl DonationList {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Donation> {
        self.content.iter()
    }
}

impl Index<usize> for DonationList {
    type Output = Donation;

    fn index(&self, index: usize) -> &Donation {
        &self.content[index]
    }
}

impl IntoIterator for DonationList {
    type Item = Donation;
    type IntoIter = std::vec::IntoIter<Donation>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

impl<'a> IntoIterator for &'a DonationList {
    type Item = &'a Donation;
    type IntoIter = std::slice::Iter<'a, Donation>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}
