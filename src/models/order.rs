use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::lenient;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Created,
    Assigned,
    OutForDelivery,
    FirstAttempt,
    SecondAttempt,
    ThirdAttempt,
    Failed,
    Delivered,
    Returned,
    /// A code this service does not know about, kept verbatim for display.
    Unknown(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::FirstAttempt => "FIRST_ATTEMPT",
            OrderStatus::SecondAttempt => "SECOND_ATTEMPT",
            OrderStatus::ThirdAttempt => "THIRD_ATTEMPT",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Unknown(raw) => raw,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Unknown(String::new())
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => OrderStatus::Created,
            "ASSIGNED" => OrderStatus::Assigned,
            "OUT_FOR_DELIVERY" => OrderStatus::OutForDelivery,
            "FIRST_ATTEMPT" => OrderStatus::FirstAttempt,
            "SECOND_ATTEMPT" => OrderStatus::SecondAttempt,
            "THIRD_ATTEMPT" => OrderStatus::ThirdAttempt,
            "FAILED" => OrderStatus::Failed,
            "DELIVERED" => OrderStatus::Delivered,
            "RETURNED" => OrderStatus::Returned,
            _ => OrderStatus::Unknown(raw),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        OrderStatus::from(raw.to_string())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentType {
    Cod,
    Advance,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingState {
    Booked,
    Unbooked,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub timestamp: Option<String>,
}

/// An order as the backend returns it. Every field tolerates absence, `null`
/// and wrongly typed scalars so a partial record never fails a whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub booking_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tracking_id: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub shopify_order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub source_provider_order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub external_order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub consignee_name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub consignee_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub consignee_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub destination_city: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub cod_amount: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub service_charges: f64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub delivered_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub booking_state: Option<BookingState>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_integrated: bool,
}

/// `null` or a non-scalar status is an empty unknown code.
fn lenient_status<'de, D>(deserializer: D) -> Result<OrderStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::text(Value::deserialize(deserializer)?)
        .map(OrderStatus::from)
        .unwrap_or_default())
}
