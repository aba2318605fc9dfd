pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::driver::Driver;
use crate::models::location::DriverLocation;
use crate::models::package::{Package, PackageStatus};
use crate::models::proof::ProofOfDelivery;
use crate::models::tracking::TrackingEvent;

pub use memory::MemoryStore;

/// Persistence boundary for the dispatch core. Every call is a potential
/// blocking I/O point; implementations surface backend trouble as
/// `AppError::StorageFailure`.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Stores a new package, assigning its id and version 1.
    async fn insert_package(&self, package: Package) -> AppResult<Package>;
    async fn get_package(&self, id: u64) -> AppResult<Option<Package>>;
    async fn find_package_by_tracking(&self, tracking_number: &str)
        -> AppResult<Option<Package>>;
    async fn packages_by_driver(&self, driver_id: Uuid) -> AppResult<Vec<Package>>;
    async fn packages_by_status(&self, status: PackageStatus) -> AppResult<Vec<Package>>;
    /// Compare-and-swap on `version`: fails with `Conflict` when the stored
    /// version is not `expected_version`, otherwise commits with the version bumped.
    async fn update_package(&self, package: Package, expected_version: u64)
        -> AppResult<Package>;

    async fn insert_driver(&self, driver: Driver) -> AppResult<Driver>;
    async fn get_driver(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn list_drivers(&self) -> AppResult<Vec<Driver>>;

    async fn insert_proof(&self, proof: ProofOfDelivery) -> AppResult<ProofOfDelivery>;
    async fn get_proof(&self, id: u64) -> AppResult<Option<ProofOfDelivery>>;
    async fn update_proof(&self, proof: ProofOfDelivery) -> AppResult<ProofOfDelivery>;
    async fn proofs_by_package(&self, package_id: u64) -> AppResult<Vec<ProofOfDelivery>>;
    async fn proofs_by_driver(&self, driver_id: Uuid) -> AppResult<Vec<ProofOfDelivery>>;

    async fn append_tracking_event(&self, event: TrackingEvent) -> AppResult<TrackingEvent>;
    /// Newest first.
    async fn tracking_events(&self, package_id: u64) -> AppResult<Vec<TrackingEvent>>;

    async fn append_location(&self, location: DriverLocation) -> AppResult<DriverLocation>;
    async fn latest_location(&self, driver_id: Uuid) -> AppResult<Option<DriverLocation>>;
    /// Samples recorded at or after `since`, newest first.
    async fn location_history(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DriverLocation>>;
}
