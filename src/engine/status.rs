use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::package::{Package, PackageStatus};
use crate::models::tracking::TrackingEvent;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::store::PersistenceStore;

use PackageStatus::*;

/// Statuses reachable in one step from `from`.
pub fn allowed_targets(from: PackageStatus) -> &'static [PackageStatus] {
    match from {
        Pending => &[Assigned, Cancelled],
        Assigned => &[PickedUp, Pending, Cancelled],
        PickedUp => &[InTransit, Cancelled],
        InTransit => &[OutForDelivery, Cancelled],
        OutForDelivery => &[Delivered, FailedDelivery, Cancelled],
        FailedDelivery => &[OutForDelivery, Assigned, Cancelled],
        Delivered | Cancelled => &[],
    }
}

pub fn can_transition(from: PackageStatus, to: PackageStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Commits status changes: validates against the transition table, writes the
/// package with a version check, appends the tracking event and tells the notifier.
pub struct StatusMachine {
    store: Arc<dyn PersistenceStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl StatusMachine {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            metrics,
        }
    }

    pub async fn transition(
        &self,
        package: &Package,
        target: PackageStatus,
        location: Option<&str>,
        notes: Option<&str>,
    ) -> AppResult<Package> {
        self.transition_with(package, target, location, notes, |_| {})
            .await
    }

    /// Like `transition`, with extra field edits committed in the same write.
    pub async fn transition_with<F>(
        &self,
        package: &Package,
        target: PackageStatus,
        location: Option<&str>,
        notes: Option<&str>,
        edit: F,
    ) -> AppResult<Package>
    where
        F: FnOnce(&mut Package) + Send,
    {
        let from = package.status;
        if !can_transition(from, target) {
            return Err(AppError::InvalidTransition { from, to: target });
        }

        let now = self.clock.now();
        let mut next = package.clone();
        edit(&mut next);
        next.status = target;
        next.updated_at = now;
        match target {
            Pending => next.assigned_driver = None,
            Delivered => next.delivered_at = Some(now),
            _ => {}
        }

        let committed = self.store.update_package(next, package.version).await?;

        self.store
            .append_tracking_event(TrackingEvent {
                id: 0,
                package_id: committed.id,
                status: target,
                location: location.map(str::to_string),
                notes: notes.map(str::to_string),
                created_at: now,
            })
            .await?;

        self.metrics
            .status_transitions_total
            .with_label_values(&[target.as_str()])
            .inc();

        info!(
            package_id = committed.id,
            tracking_number = %committed.tracking_number,
            from = %from,
            to = %target,
            version = committed.version,
            "package status changed"
        );

        if let Err(err) = self
            .notifier
            .notify_status_change(&committed, from, target, location)
        {
            warn!(package_id = committed.id, error = %err, "status notification failed");
        }

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::{allowed_targets, can_transition, StatusMachine};
    use crate::clock::ManualClock;
    use crate::error::AppError;
    use crate::models::location::Address;
    use crate::models::package::{Package, PackageStatus};
    use crate::notify::BroadcastNotifier;
    use crate::observability::metrics::Metrics;
    use crate::store::{MemoryStore, PersistenceStore};

    fn machine(store: Arc<MemoryStore>) -> StatusMachine {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap());
        StatusMachine::new(
            store,
            Arc::new(BroadcastNotifier::new(16)),
            Arc::new(clock),
            Metrics::new(),
        )
    }

    async fn stored_package(store: &MemoryStore, tracking: &str, status: PackageStatus) -> Package {
        let now = Utc::now();
        store
            .insert_package(Package {
                id: 0,
                tracking_number: tracking.to_string(),
                sender_ref: None,
                recipient_name: "Jane".to_string(),
                recipient_phone: None,
                pickup: Address::new("1 Pickup St"),
                delivery: Address::new("2 Delivery Ave"),
                weight_kg: 2.0,
                dimensions: None,
                description: None,
                shipping_cost: None,
                status,
                assigned_driver: None,
                version: 0,
                created_at: now,
                updated_at: now,
                estimated_delivery_at: None,
                delivered_at: None,
                collection_code: None,
                drop_off_code: None,
            })
            .await
            .unwrap()
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(allowed_targets(PackageStatus::Delivered).is_empty());
        assert!(allowed_targets(PackageStatus::Cancelled).is_empty());
    }

    #[test]
    fn every_non_terminal_state_can_be_cancelled() {
        for status in PackageStatus::ALL {
            if !status.is_terminal() {
                assert!(can_transition(status, PackageStatus::Cancelled), "{status}");
            }
        }
    }

    #[test]
    fn failed_delivery_can_retry_or_be_reassigned() {
        assert!(can_transition(
            PackageStatus::FailedDelivery,
            PackageStatus::OutForDelivery
        ));
        assert!(can_transition(
            PackageStatus::FailedDelivery,
            PackageStatus::Assigned
        ));
        assert!(!can_transition(
            PackageStatus::FailedDelivery,
            PackageStatus::Delivered
        ));
    }

    #[tokio::test]
    async fn every_pair_either_commits_one_event_or_none() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());
        let mut seq = 0;

        for from in PackageStatus::ALL {
            for to in PackageStatus::ALL {
                seq += 1;
                let package = stored_package(&store, &format!("RC{seq:08}"), from).await;
                let result = machine.transition(&package, to, Some("depot"), None).await;
                let events = store.tracking_events(package.id).await.unwrap();

                if can_transition(from, to) {
                    let updated = result.unwrap();
                    assert_eq!(updated.status, to);
                    assert_eq!(updated.version, package.version + 1);
                    assert_eq!(events.len(), 1, "{from} -> {to}");
                    assert_eq!(events[0].status, to);
                } else {
                    assert!(
                        matches!(result, Err(AppError::InvalidTransition { .. })),
                        "{from} -> {to}"
                    );
                    assert!(events.is_empty(), "{from} -> {to}");
                }
            }
        }
    }

    #[tokio::test]
    async fn delivered_sets_timestamp_and_pending_clears_driver() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());

        let out = stored_package(&store, "RC00000001", PackageStatus::OutForDelivery).await;
        let delivered = machine
            .transition(&out, PackageStatus::Delivered, None, None)
            .await
            .unwrap();
        assert_eq!(
            delivered.delivered_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap())
        );

        let assigned = stored_package(&store, "RC00000002", PackageStatus::Assigned).await;
        let assigned = store
            .update_package(
                Package {
                    assigned_driver: Some(uuid::Uuid::new_v4()),
                    ..assigned.clone()
                },
                assigned.version,
            )
            .await
            .unwrap();
        let pending = machine
            .transition(&assigned, PackageStatus::Pending, None, Some("driver declined"))
            .await
            .unwrap();
        assert_eq!(pending.assigned_driver, None);
    }

    #[tokio::test]
    async fn stale_package_snapshot_conflicts_without_event() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());

        let package = stored_package(&store, "RC00000001", PackageStatus::Pending).await;
        machine
            .transition(&package, PackageStatus::Cancelled, None, None)
            .await
            .unwrap();

        let stale = machine
            .transition(&package, PackageStatus::Assigned, None, None)
            .await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));
        assert_eq!(store.tracking_events(package.id).await.unwrap().len(), 1);
    }
}
