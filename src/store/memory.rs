use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::driver::Driver;
use crate::models::location::DriverLocation;
use crate::models::package::{Package, PackageStatus};
use crate::models::proof::ProofOfDelivery;
use crate::models::tracking::TrackingEvent;
use crate::store::PersistenceStore;

/// In-process store. Package updates are serialised per key by the map
/// shard lock, which is what makes the version check atomic.
#[derive(Default)]
pub struct MemoryStore {
    packages: DashMap<u64, Package>,
    tracking_index: DashMap<String, u64>,
    drivers: DashMap<Uuid, Driver>,
    proofs: DashMap<u64, ProofOfDelivery>,
    events: DashMap<u64, Vec<TrackingEvent>>,
    locations: DashMap<Uuid, Vec<DriverLocation>>,
    next_package_id: AtomicU64,
    next_proof_id: AtomicU64,
    next_event_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    fn next_id(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn sorted_by_id(mut packages: Vec<Package>) -> Vec<Package> {
    packages.sort_by_key(|package| package.id);
    packages
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn insert_package(&self, mut package: Package) -> AppResult<Package> {
        let id = Self::next_id(&self.next_package_id);

        match self.tracking_index.entry(package.tracking_number.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "tracking number {} already exists",
                    package.tracking_number
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        package.id = id;
        package.version = 1;
        self.packages.insert(id, package.clone());
        Ok(package)
    }

    async fn get_package(&self, id: u64) -> AppResult<Option<Package>> {
        Ok(self.packages.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_package_by_tracking(
        &self,
        tracking_number: &str,
    ) -> AppResult<Option<Package>> {
        let Some(id) = self.tracking_index.get(tracking_number).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.get_package(id).await
    }

    async fn packages_by_driver(&self, driver_id: Uuid) -> AppResult<Vec<Package>> {
        Ok(sorted_by_id(
            self.packages
                .iter()
                .filter(|entry| entry.value().assigned_driver == Some(driver_id))
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    async fn packages_by_status(&self, status: PackageStatus) -> AppResult<Vec<Package>> {
        Ok(sorted_by_id(
            self.packages
                .iter()
                .filter(|entry| entry.value().status == status)
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    async fn update_package(
        &self,
        mut package: Package,
        expected_version: u64,
    ) -> AppResult<Package> {
        let mut current = self
            .packages
            .get_mut(&package.id)
            .ok_or_else(|| AppError::NotFound(format!("package {} not found", package.id)))?;

        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "package {} was modified concurrently (expected version {}, found {})",
                package.id, expected_version, current.version
            )));
        }

        if current.tracking_number != package.tracking_number {
            return Err(AppError::BadRequest(
                "tracking number cannot be changed".to_string(),
            ));
        }

        package.version = expected_version + 1;
        *current = package.clone();
        Ok(package)
    }

    async fn insert_driver(&self, driver: Driver) -> AppResult<Driver> {
        match self.drivers.entry(driver.id) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "driver {} already registered",
                driver.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(driver.clone());
                Ok(driver)
            }
        }
    }

    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.drivers.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by(|a, b| a.registered_at.cmp(&b.registered_at).then(a.id.cmp(&b.id)));
        Ok(drivers)
    }

    async fn insert_proof(&self, mut proof: ProofOfDelivery) -> AppResult<ProofOfDelivery> {
        proof.id = Self::next_id(&self.next_proof_id);
        self.proofs.insert(proof.id, proof.clone());
        Ok(proof)
    }

    async fn get_proof(&self, id: u64) -> AppResult<Option<ProofOfDelivery>> {
        Ok(self.proofs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update_proof(&self, proof: ProofOfDelivery) -> AppResult<ProofOfDelivery> {
        let mut current = self.proofs.get_mut(&proof.id).ok_or_else(|| {
            AppError::NotFound(format!("proof of delivery {} not found", proof.id))
        })?;
        // Finished records are immutable.
        if !current.is_active() {
            return Err(AppError::Conflict(format!(
                "proof of delivery {} is already finalised",
                proof.id
            )));
        }
        *current = proof.clone();
        Ok(proof)
    }

    async fn proofs_by_package(&self, package_id: u64) -> AppResult<Vec<ProofOfDelivery>> {
        let mut proofs: Vec<ProofOfDelivery> = self
            .proofs
            .iter()
            .filter(|entry| entry.value().package_id == package_id)
            .map(|entry| entry.value().clone())
            .collect();
        proofs.sort_by_key(|proof| proof.id);
        Ok(proofs)
    }

    async fn proofs_by_driver(&self, driver_id: Uuid) -> AppResult<Vec<ProofOfDelivery>> {
        let mut proofs: Vec<ProofOfDelivery> = self
            .proofs
            .iter()
            .filter(|entry| entry.value().driver_id == driver_id)
            .map(|entry| entry.value().clone())
            .collect();
        proofs.sort_by_key(|proof| proof.id);
        Ok(proofs)
    }

    async fn append_tracking_event(&self, mut event: TrackingEvent) -> AppResult<TrackingEvent> {
        event.id = Self::next_id(&self.next_event_id);
        self.events
            .entry(event.package_id)
            .or_default()
            .push(event.clone());
        Ok(event)
    }

    async fn tracking_events(&self, package_id: u64) -> AppResult<Vec<TrackingEvent>> {
        let mut events = self
            .events
            .get(&package_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn append_location(&self, location: DriverLocation) -> AppResult<DriverLocation> {
        self.locations
            .entry(location.driver_id)
            .or_default()
            .push(location.clone());
        Ok(location)
    }

    async fn latest_location(&self, driver_id: Uuid) -> AppResult<Option<DriverLocation>> {
        Ok(self.locations.get(&driver_id).and_then(|entry| {
            entry
                .value()
                .iter()
                .max_by_key(|location| location.recorded_at)
                .cloned()
        }))
    }

    async fn location_history(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DriverLocation>> {
        let mut history: Vec<DriverLocation> = self
            .locations
            .get(&driver_id)
            .map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|location| location.recorded_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        history.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(history)
    }
}
