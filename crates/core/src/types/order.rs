//! Order records created at checkout.
//!
//! Orders live in the backend's `orders` table. The store only creates them
//! and lists a customer's history; it never edits them.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CustomerId, OrderId};
use super::price::Price;

/// Order status as stored by the backend.
///
/// New orders are written as `"en cours"`. The shop moves them through
/// `"expédiée"`, `"livrée"` or `"annulée"`; any other value it sets is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    const PENDING: &'static str = "en cours";
    const SHIPPED: &'static str = "expédiée";
    const DELIVERED: &'static str = "livrée";
    const CANCELLED: &'static str = "annulée";

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => Self::PENDING,
            Self::Shipped => Self::SHIPPED,
            Self::Delivered => Self::DELIVERED,
            Self::Cancelled => Self::CANCELLED,
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            Self::PENDING => Self::Pending,
            Self::SHIPPED => Self::Shipped,
            Self::DELIVERED => Self::Delivered,
            Self::CANCELLED => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub user_id: CustomerId,
    pub total: Price,
    pub status: OrderStatus,
}

/// An order row returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: CustomerId,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_status_wire_value() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"en cours\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::Pending);
    }

    #[test]
    fn test_lifecycle_statuses_decode() {
        for (wire, status) in [
            ("expédiée", OrderStatus::Shipped),
            ("livrée", OrderStatus::Delivered),
            ("annulée", OrderStatus::Cancelled),
        ] {
            let decoded: OrderStatus = serde_json::from_str(&format!("\"{wire}\"")).unwrap();
            assert_eq!(decoded, status);
            assert_eq!(String::from(status), wire);
        }
    }

    #[test]
    fn test_unknown_status_kept_verbatim() {
        let status: OrderStatus = serde_json::from_str("\"en préparation\"").unwrap();
        assert_eq!(status, OrderStatus::Other("en préparation".to_string()));
        assert_eq!(status.to_string(), "en préparation");
    }

    #[test]
    fn test_order_row_decodes() {
        let row = r#"{
            "id": 12,
            "user_id": "6f1c1a38-0f0e-4a37-9b53-1c1f7f0c2a10",
            "total": 4500,
            "status": "en cours",
            "created_at": "2025-07-08T10:00:00+00:00"
        }"#;
        let order: OrderRecord = serde_json::from_str(row).unwrap();
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.total, Price::from_minor_units(450_000));
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
