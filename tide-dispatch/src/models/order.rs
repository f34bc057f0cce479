//! Order document model
//!
//! Orders are owned by the order store and written by other services, so
//! every field is optional on the wire and numeric fields tolerate strings,
//! blanks and nulls.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// One kitchen/bar/service ticket
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub order_number: Option<String>,
    pub guest_name: Option<String>,
    pub waiter_name: Option<String>,
    pub items: Vec<OrderItem>,

    // Totals
    #[serde(deserialize_with = "lenient_decimal")]
    pub subtotal: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub tax: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub discount: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub total_amount: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub paid_amount: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub due_amount: Decimal,
    pub payment_method: Option<String>,

    // Placement and routing
    #[serde(deserialize_with = "lenient_string")]
    pub room_or_table: Option<String>,
    pub order_type: Option<String>,
    /// Which station should print this order
    pub print_target: Option<String>,

    pub prepared_by: Option<String>,
    pub printed_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,

    // Print state
    pub printed: bool,
    pub printed_at: Option<DateTime<Utc>>,
    pub reprint_requested: bool,
    #[serde(deserialize_with = "lenient_count")]
    pub reprint_count: u32,
    pub last_reprint_at: Option<DateTime<Utc>>,
    pub kitchen_printed: bool,
    pub kitchen_printed_at: Option<DateTime<Utc>>,
}

/// A line on the order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderItem {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub sku: Option<String>,
    pub variant: Option<ItemVariant>,
    pub add_ons: Vec<AddOn>,
    #[serde(deserialize_with = "lenient_decimal")]
    pub quantity: Decimal,
    /// Unit price
    #[serde(deserialize_with = "lenient_decimal")]
    pub price: Decimal,
    pub notes: Option<String>,
}

impl OrderItem {
    /// Quantity with absent/zero/negative treated as one
    pub fn effective_quantity(&self) -> Decimal {
        if self.quantity <= Decimal::ZERO {
            Decimal::ONE
        } else {
            self.quantity
        }
    }
}

/// Selected size variant
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemVariant {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_decimal")]
    pub price: Decimal,
}

/// Selected add-on
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddOn {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_decimal")]
    pub price: Decimal,
}

/// How the order is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderType {
    #[default]
    WalkIn,
    Takeaway,
    RoomService,
    Delivery,
}

impl OrderType {
    /// Map the free-text order-type attribute
    ///
    /// Missing or unrecognized values are walk-in.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return OrderType::WalkIn;
        };
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "takeaway" | "takeout" | "togo" => OrderType::Takeaway,
            "roomservice" | "inroom" | "inroomdining" => OrderType::RoomService,
            "delivery" | "inroomdelivery" => OrderType::Delivery,
            _ => OrderType::WalkIn,
        }
    }

    /// Receipt banner text
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::WalkIn => "WALK-IN",
            OrderType::Takeaway => "TAKEAWAY",
            OrderType::RoomService => "ROOM SERVICE",
            OrderType::Delivery => "DELIVERY",
        }
    }

    /// Whether the location is a room rather than a table
    pub fn is_in_room(&self) -> bool {
        matches!(self, OrderType::RoomService | OrderType::Delivery)
    }
}

impl Order {
    pub fn order_type(&self) -> OrderType {
        OrderType::parse(self.order_type.as_deref())
    }
}

// ============================================================================
// Lenient field decoding
// ============================================================================

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_from_value(&value))
}

/// Numbers and numeric strings parse; anything else is zero
pub(crate) fn decimal_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
                .unwrap_or_default()
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .unwrap_or_default()
        }
        _ => Decimal::ZERO,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}
