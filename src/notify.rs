use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::package::{Package, PackageStatus};
use crate::models::proof::ProofOfDelivery;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    ChannelClosed,

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Outbound customer/staff notifications. Best effort: callers log failures
/// and carry on.
pub trait Notifier: Send + Sync {
    fn notify_status_change(
        &self,
        package: &Package,
        old_status: PackageStatus,
        new_status: PackageStatus,
        location: Option<&str>,
    ) -> Result<(), NotifyError>;

    fn notify_assigned(&self, package: &Package, driver_id: Uuid) -> Result<(), NotifyError>;

    fn notify_pickup(&self, package: &Package) -> Result<(), NotifyError>;

    fn notify_delivered(
        &self,
        package: &Package,
        proof: &ProofOfDelivery,
    ) -> Result<(), NotifyError>;

    fn notify_failed(&self, package: &Package, reason: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    StatusChanged {
        package_id: u64,
        tracking_number: String,
        from: PackageStatus,
        to: PackageStatus,
        location: Option<String>,
    },
    Assigned {
        package_id: u64,
        tracking_number: String,
        driver_id: Uuid,
    },
    PickedUp {
        package_id: u64,
        tracking_number: String,
        recipient_phone: Option<String>,
    },
    Delivered {
        package_id: u64,
        tracking_number: String,
        proof_id: u64,
        recipient_name: Option<String>,
    },
    Failed {
        package_id: u64,
        tracking_number: String,
        reason: String,
    },
}

/// Fans notifications out to live subscribers (the `/ws` endpoint).
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    fn publish(&self, notification: Notification) -> Result<(), NotifyError> {
        // A send error only means nobody is listening right now.
        if self.tx.send(notification).is_err() {
            debug!("no notification subscribers");
        }
        Ok(())
    }
}

impl Notifier for BroadcastNotifier {
    fn notify_status_change(
        &self,
        package: &Package,
        old_status: PackageStatus,
        new_status: PackageStatus,
        location: Option<&str>,
    ) -> Result<(), NotifyError> {
        self.publish(Notification::StatusChanged {
            package_id: package.id,
            tracking_number: package.tracking_number.clone(),
            from: old_status,
            to: new_status,
            location: location.map(str::to_string),
        })
    }

    fn notify_assigned(&self, package: &Package, driver_id: Uuid) -> Result<(), NotifyError> {
        self.publish(Notification::Assigned {
            package_id: package.id,
            tracking_number: package.tracking_number.clone(),
            driver_id,
        })
    }

    fn notify_pickup(&self, package: &Package) -> Result<(), NotifyError> {
        self.publish(Notification::PickedUp {
            package_id: package.id,
            tracking_number: package.tracking_number.clone(),
            recipient_phone: package.recipient_phone.clone(),
        })
    }

    fn notify_delivered(
        &self,
        package: &Package,
        proof: &ProofOfDelivery,
    ) -> Result<(), NotifyError> {
        self.publish(Notification::Delivered {
            package_id: package.id,
            tracking_number: package.tracking_number.clone(),
            proof_id: proof.id,
            recipient_name: proof.recipient_name.clone(),
        })
    }

    fn notify_failed(&self, package: &Package, reason: &str) -> Result<(), NotifyError> {
        self.publish(Notification::Failed {
            package_id: package.id,
            tracking_number: package.tracking_number.clone(),
            reason: reason.to_string(),
        })
    }
}
