//! Account profile returned by `GET /me`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use super::datetime;

/// Lifetime donation totals nested inside a [`User`] profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSummary {
    #[serde(rename = "totalAmount")]
    pub total_amount: i64,
    #[serde(rename = "totalCount")]
    pub total_count: i64,
}

impl PartialOrd for DonationSummary {
    /// Compares by `total_amount` only.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.total_amount.cmp(&other.total_amount))
    }
}

impl fmt::Display for DonationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} across {} donations",
            self.total_amount, self.total_count
        )
    }
}

/// Account profile snapshot.
///
/// Immutable once parsed; every profile fetch replaces the snapshot
/// wholesale rather than patching fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub nickname: String,
    #[serde(rename = "pubId")]
    pub public_id: String,
    pub page: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    pub donates: DonationSummary,
    #[serde(rename = "createdAt", with = "datetime::wire")]
    pub created_at: PrimitiveDateTime,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user {} ({}), page {}, {}",
            self.nickname,
            self.public_id,
            self.page,
            self.donates
        )
    }
}
