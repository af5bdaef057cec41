//! Display shapes of backend records.
//!
//! The backend owns these entities; the client mirrors only the fields the
//! dashboards show or edit. Every field except `id` is optional: missing,
//! null, blank and unparseable values all deserialize to `None`, so one odd
//! cell never rejects a whole page.

use serde::{Deserialize, Serialize};

use crate::list_state::Identified;
use crate::types::{EntityId, Timestamp};

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> EntityId {
                    self.id
                }
            }
        )*
    };
}

/// Helpdesk ticket (complaint).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub ticket_number: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub heading: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category_type: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub sub_category_type: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub issue_status: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub priority: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub assigned_to: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub building_name: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_golden_ticket: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_flagged: Option<bool>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryItem {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub asset_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub quantity: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub min_stock_level: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub unit: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
}

impl InventoryItem {
    /// True when stock is known and at or below the minimum level.
    pub fn is_low_stock(&self) -> bool {
        matches!((self.quantity, self.min_stock_level), (Some(q), Some(min)) if q <= min)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseOrder {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub reference_number: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub supplier_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub approval_status: Option<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Booking {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub facility_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub booked_by: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub startdate: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub slot: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub current_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolRoute {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub building_name: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub checkpoints_count: Option<u32>,
    #[serde(deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterTemplate {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub shift: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub department: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub allocation_type: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub roster_type: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visitor {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub guest_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub guest_number: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub guest_type: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub visit_purpose: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub host_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub expected_at: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub checked_in_at: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permit {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient::string")]
    pub permit_type: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub permit_for: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub vendor_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
}

/// Forgiving deserializers for optional backend fields.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::form::parse_datetime;
    use crate::types::Timestamp;

    fn text(value: &Value) -> Option<&str> {
        value.as_str().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value
            .as_f64()
            .or_else(|| text(&value).and_then(|s| s.parse().ok())))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| text(&value).and_then(|s| s.parse().ok())))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(text(&value)
            .and_then(parse_datetime)
            .map(|dt| dt.and_utc()))
    }
}

identified!(
    Ticket,
    InventoryItem,
    PurchaseOrder,
    Booking,
    PatrolRoute,
    RosterTemplate,
    Visitor,
    Permit,
);
