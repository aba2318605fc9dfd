use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::package::PackageStatus;

/// Audit trail entry written once per status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub id: u64,
    pub package_id: u64,
    pub status: PackageStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
