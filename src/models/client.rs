//! Supporter aggregates returned by `GET /clients`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// One supporter and their cumulative donation total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "clientName")]
    pub client_name: String,
    #[serde(rename = "totalAmount")]
    pub total_amount: i64,
}

impl PartialOrd for Client {
    /// Compares by `total_amount` only.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.total_amount.cmp(&other.total_amount))
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.client_name, self.total_amount)
    }
}

/// All supporters of the account, in server-provided order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientList {
    #[serde(default)]
    pub clients: Vec<Client>,
}

impl ClientList {
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Client> {
        self.clients.iter()
    }
}

impl Index<usize> for ClientList {
    type Output = Client;

    fn index(&self, index: usize) -> &Client {
        &self.clients[index]
    }
}

impl IntoIterator for ClientList {
    type Item = Client;
    type IntoIter = std::vec::IntoIter<Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.clients.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClientList {
    type Item = &'a Client;
    type IntoIter = std::slice::Iter<'a, Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.clients.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_aliased_fields() {
        let list: ClientList = serde_json::from_value(json!({
            "clients": [
                {"clientName": "Alice", "totalAmount": 300},
                {"clientName": "Bob", "totalAmount": 100}
            ]
        }))
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].client_name, "Alice");
        assert_eq!(list[1].total_amount, 100);
    }

    #[test]
    fn defaults_to_empty_when_field_absent() {
        let list: ClientList = serde_json::from_value(json!({})).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn sorts_by_total_amount() {
        let mut clients = vec![
            Client {
                client_name: "Bob".into(),
                total_amount: 300,
            },
            Client {
                client_name: "Alice".into(),
                total_amount: 100,
            },
        ];
        clients.sort_by(|a, b| a.total_amount.cmp(&b.total_amount));
        assert_eq!(clients[0].client_name, "Alice");
    }
}
