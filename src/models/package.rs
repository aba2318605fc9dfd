use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    FailedDelivery,
    Cancelled,
}

impl PackageStatus {
    pub const ALL: [PackageStatus; 8] = [
        PackageStatus::Pending,
        PackageStatus::Assigned,
        PackageStatus::PickedUp,
        PackageStatus::InTransit,
        PackageStatus::OutForDelivery,
        PackageStatus::Delivered,
        PackageStatus::FailedDelivery,
        PackageStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Pending => "PENDING",
            PackageStatus::Assigned => "ASSIGNED",
            PackageStatus::PickedUp => "PICKED_UP",
            PackageStatus::InTransit => "IN_TRANSIT",
            PackageStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            PackageStatus::Delivered => "DELIVERED",
            PackageStatus::FailedDelivery => "FAILED_DELIVERY",
            PackageStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PackageStatus::Delivered | PackageStatus::Cancelled)
    }

    /// Assigned to a driver but not yet collected.
    pub fn awaits_pickup(&self) -> bool {
        matches!(self, PackageStatus::Assigned)
    }

    /// Collected and riding in the driver's vehicle.
    pub fn in_vehicle(&self) -> bool {
        matches!(
            self,
            PackageStatus::PickedUp
                | PackageStatus::InTransit
                | PackageStatus::OutForDelivery
                | PackageStatus::FailedDelivery
        )
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: u64,
    pub tracking_number: String,
    pub sender_ref: Option<String>,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub pickup: Address,
    pub delivery: Address,
    pub weight_kg: f64,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub shipping_cost: Option<f64>,
    pub status: PackageStatus,
    pub assigned_driver: Option<Uuid>,
    /// Bumped by the store on every committed update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub collection_code: Option<String>,
    #[serde(skip_serializing)]
    pub drop_off_code: Option<String>,
}

impl Package {
    pub fn is_assigned_to(&self, driver_id: Uuid) -> bool {
        self.assigned_driver == Some(driver_id)
    }
}

/// Booking data for a new package. Codes and tracking number are generated
/// when left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPackage {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub sender_ref: Option<String>,
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    pub pickup: Address,
    pub delivery: Address,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shipping_cost: Option<f64>,
    #[serde(default)]
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collection_code: Option<String>,
    #[serde(default)]
    pub drop_off_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::PackageStatus;

    #[test]
    fn status_serializes_in_screaming_snake_case() {
        let json = serde_json::to_string(&PackageStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");

        let parsed: PackageStatus = serde_json::from_str("\"FAILED_DELIVERY\"").unwrap();
        assert_eq!(parsed, PackageStatus::FailedDelivery);
    }

    #[test]
    fn only_delivered_and_cancelled_are_terminal() {
        let terminal: Vec<_> = PackageStatus::ALL
            .iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![&PackageStatus::Delivered, &PackageStatus::Cancelled]
        );
    }
}
