use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryOutcome {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    HandToRecipient,
    LeaveAtDoor,
    Neighbour,
    Reception,
}

/// Evidence captured for one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOfDelivery {
    pub id: u64,
    pub package_id: u64,
    pub driver_id: Uuid,
    pub delivery_location: Option<String>,
    pub signature_required: bool,
    pub photo_required: bool,
    pub id_verification_required: bool,
    pub signature: Option<String>,
    pub delivery_photo_ref: Option<String>,
    pub package_photo_ref: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_id_number: Option<String>,
    pub delivery_method: Option<DeliveryMethod>,
    pub notes: Option<String>,
    pub outcome: DeliveryOutcome,
    pub failure_reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProofOfDelivery {
    pub fn is_active(&self) -> bool {
        self.outcome == DeliveryOutcome::InProgress
    }
}

/// Who received the package, captured when the delivery completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub method: Option<DeliveryMethod>,
}

/// Artifacts a driver hands in with a delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryEvidence {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub delivery_photo_ref: Option<String>,
    #[serde(default)]
    pub package_photo_ref: Option<String>,
}
