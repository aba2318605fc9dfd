use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::DispatchPolicy;
use crate::engine::proof::{missing_evidence, DeliveryRequirements, ProofRecorder};
use crate::engine::status::StatusMachine;
use crate::engine::verification::{verify_collection, verify_drop_off, VerificationResult};
use crate::error::{AppError, AppResult};
use crate::geocode::GeocodeProvider;
use crate::models::driver::Driver;
use crate::models::location::{DriverLocation, LocationFix};
use crate::models::package::{NewPackage, Package, PackageStatus};
use crate::models::proof::{DeliveryEvidence, ProofOfDelivery, RecipientDetails};
use crate::models::tracking::TrackingEvent;
use crate::notify::{Notifier, NotifyError};
use crate::observability::metrics::Metrics;
use crate::store::PersistenceStore;

const TRACKING_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct PickupRequest {
    pub package_id: u64,
    pub driver_id: Uuid,
    pub collection_code: Option<String>,
    pub location: Option<LocationFix>,
}

#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub package_id: u64,
    pub driver_id: Uuid,
    pub drop_off_code: Option<String>,
    pub recipient: RecipientDetails,
    pub evidence: DeliveryEvidence,
    pub location: Option<LocationFix>,
}

#[derive(Debug, Clone)]
pub struct FailureRequest {
    pub package_id: u64,
    pub driver_id: Uuid,
    pub reason: String,
    pub notes: Option<String>,
    pub photo_ref: Option<String>,
    pub location: Option<LocationFix>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub package: Package,
    pub proof: ProofOfDelivery,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageDetails {
    pub package: Package,
    pub proofs: Vec<ProofOfDelivery>,
    pub history: Vec<TrackingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchPickupItem {
    pub package_id: u64,
    #[serde(default)]
    pub collection_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchDeliveryItem {
    pub package_id: u64,
    #[serde(default)]
    pub drop_off_code: Option<String>,
    pub recipient: RecipientDetails,
    #[serde(default)]
    pub evidence: DeliveryEvidence,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub package_id: u64,
    pub code: &'static str,
    pub error: String,
}

impl BatchFailure {
    fn new(package_id: u64, err: &AppError) -> Self {
        Self {
            package_id,
            code: err.kind(),
            error: err.to_string(),
        }
    }
}

/// Per-item outcome of a batch call; one bad item never sinks the rest.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchFailure>,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Orchestrates the driver-facing delivery lifecycle on top of the status
/// machine, proof recorder, code guard and route sequencer.
pub struct DispatchEngine {
    pub(super) store: Arc<dyn PersistenceStore>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) geocoder: Arc<dyn GeocodeProvider>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) metrics: Metrics,
    pub(super) policy: DispatchPolicy,
    pub(super) status: Arc<StatusMachine>,
    pub(super) recorder: ProofRecorder,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        notifier: Arc<dyn Notifier>,
        geocoder: Arc<dyn GeocodeProvider>,
        clock: Arc<dyn Clock>,
        metrics: Metrics,
        policy: DispatchPolicy,
    ) -> Self {
        let status = Arc::new(StatusMachine::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            metrics.clone(),
        ));
        let recorder =
            ProofRecorder::new(store.clone(), status.clone(), clock.clone(), policy.proof);

        Self {
            store,
            notifier,
            geocoder,
            clock,
            metrics,
            policy,
            status,
            recorder,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    pub async fn create_package(&self, new: NewPackage) -> AppResult<Package> {
        if new.recipient_name.trim().is_empty() {
            return Err(AppError::BadRequest("recipient_name cannot be empty".to_string()));
        }
        if !new.weight_kg.is_finite() || new.weight_kg < 0.0 {
            return Err(AppError::BadRequest("weight_kg must be >= 0".to_string()));
        }

        let now = self.clock.now();
        let supplied_tracking = new.tracking_number.clone().filter(|t| !t.trim().is_empty());
        let attempts = if supplied_tracking.is_some() {
            1
        } else {
            TRACKING_NUMBER_ATTEMPTS
        };

        let mut last_err = None;
        for _ in 0..attempts {
            let candidate = Package {
                id: 0,
                tracking_number: supplied_tracking.clone().unwrap_or_else(generate_tracking_number),
                sender_ref: new.sender_ref.clone(),
                recipient_name: new.recipient_name.clone(),
                recipient_phone: new.recipient_phone.clone(),
                pickup: new.pickup.clone(),
                delivery: new.delivery.clone(),
                weight_kg: new.weight_kg,
                dimensions: new.dimensions.clone(),
                description: new.description.clone(),
                shipping_cost: new.shipping_cost,
                status: PackageStatus::Pending,
                assigned_driver: None,
                version: 0,
                created_at: now,
                updated_at: now,
                estimated_delivery_at: new.estimated_delivery_at,
                delivered_at: None,
                collection_code: new.collection_code.clone().or_else(|| Some(generate_code())),
                drop_off_code: new.drop_off_code.clone().or_else(|| Some(generate_code())),
            };

            match self.store.insert_package(candidate).await {
                Ok(package) => {
                    self.store
                        .append_tracking_event(TrackingEvent {
                            id: 0,
                            package_id: package.id,
                            status: PackageStatus::Pending,
                            location: Some(package.pickup.address.clone()),
                            notes: Some("Package booked".to_string()),
                            created_at: now,
                        })
                        .await?;
                    info!(
                        package_id = package.id,
                        tracking_number = %package.tracking_number,
                        "package created"
                    );
                    return Ok(package);
                }
                Err(AppError::Conflict(msg)) => last_err = Some(AppError::Conflict(msg)),
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::Internal("package was not created".to_string())))
    }

    pub async fn get_package(&self, package_id: u64) -> AppResult<Package> {
        self.store
            .get_package(package_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("package {package_id} not found")))
    }

    pub async fn package_by_tracking(&self, tracking_number: &str) -> AppResult<Package> {
        self.store
            .find_package_by_tracking(tracking_number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("package {tracking_number} not found")))
    }

    pub async fn package_details(&self, package_id: u64) -> AppResult<PackageDetails> {
        let package = self.get_package(package_id).await?;
        let proofs = self.store.proofs_by_package(package_id).await?;
        let history = self.store.tracking_events(package_id).await?;
        Ok(PackageDetails {
            package,
            proofs,
            history,
        })
    }

    pub async fn tracking_history(&self, package_id: u64) -> AppResult<Vec<TrackingEvent>> {
        self.get_package(package_id).await?;
        self.store.tracking_events(package_id).await
    }

    pub async fn register_driver(&self, name: &str, phone: Option<String>) -> AppResult<Driver> {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }

        let driver = self
            .store
            .insert_driver(Driver {
                id: Uuid::new_v4(),
                name: name.trim().to_string(),
                phone,
                registered_at: self.clock.now(),
            })
            .await?;

        info!(driver_id = %driver.id, "driver registered");
        Ok(driver)
    }

    pub async fn get_driver(&self, driver_id: Uuid) -> AppResult<Driver> {
        self.store
            .get_driver(driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))
    }

    pub async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        self.store.list_drivers().await
    }

    pub async fn assign(&self, package_id: u64, driver_id: Uuid) -> AppResult<Package> {
        self.observe("assign", async {
            self.get_driver(driver_id).await?;
            let package = self.get_package(package_id).await?;

            if package.assigned_driver.is_some_and(|current| current != driver_id) {
                return Err(AppError::AlreadyAssignedElsewhere { package_id });
            }
            if package.status == PackageStatus::Assigned {
                debug!(package_id, driver_id = %driver_id, "package already assigned to driver");
                return Ok(package);
            }
            if package.status != PackageStatus::Pending {
                return Err(AppError::NotAvailable {
                    package_id,
                    status: package.status,
                });
            }

            let assigned = self
                .status
                .transition_with(
                    &package,
                    PackageStatus::Assigned,
                    None,
                    Some("Assigned to driver"),
                    |p| p.assigned_driver = Some(driver_id),
                )
                .await?;

            self.notify(assigned.id, "assigned", self.notifier.notify_assigned(&assigned, driver_id));
            Ok(assigned)
        })
        .await
    }

    /// Returns an ASSIGNED package to the pool. Any other status is left alone.
    pub async fn unassign(&self, package_id: u64) -> AppResult<Package> {
        let package = self.get_package(package_id).await?;
        if package.status != PackageStatus::Assigned {
            debug!(package_id, status = %package.status, "unassign ignored");
            return Ok(package);
        }

        self.status
            .transition(&package, PackageStatus::Pending, None, Some("Unassigned by dispatch"))
            .await
    }

    /// Driver declines a package they were given.
    pub async fn reject(&self, package_id: u64, driver_id: Uuid, reason: &str) -> AppResult<Package> {
        let package = self.get_package(package_id).await?;
        ensure_assigned(&package, driver_id)?;

        let notes = format!("Rejected by driver: {reason}");
        self.status
            .transition(&package, PackageStatus::Pending, None, Some(&notes))
            .await
    }

    /// Hands a failed delivery to a (possibly different) driver.
    pub async fn reassign(&self, package_id: u64, driver_id: Uuid) -> AppResult<Package> {
        self.observe("reassign", async {
            self.get_driver(driver_id).await?;
            let package = self.get_package(package_id).await?;
            if package.status != PackageStatus::FailedDelivery {
                return Err(AppError::NotAvailable {
                    package_id,
                    status: package.status,
                });
            }

            let assigned = self
                .status
                .transition_with(
                    &package,
                    PackageStatus::Assigned,
                    None,
                    Some("Reassigned after failed delivery"),
                    |p| p.assigned_driver = Some(driver_id),
                )
                .await?;

            self.notify(assigned.id, "assigned", self.notifier.notify_assigned(&assigned, driver_id));
            Ok(assigned)
        })
        .await
    }

    pub async fn cancel(&self, package_id: u64, reason: &str) -> AppResult<Package> {
        let package = self.get_package(package_id).await?;
        let cancelled = self
            .status
            .transition(&package, PackageStatus::Cancelled, None, Some(reason))
            .await?;
        self.recorder
            .abandon_active(package_id, &format!("Cancelled: {reason}"))
            .await?;
        Ok(cancelled)
    }

    /// Collects a package and sets off: PICKED_UP then IN_TRANSIT in one call.
    pub async fn pickup(&self, request: PickupRequest) -> AppResult<Package> {
        self.observe("pickup", async {
            if let Some(fix) = &request.location {
                validate_fix(fix)?;
            }
            let package = self.get_package(request.package_id).await?;
            ensure_assigned(&package, request.driver_id)?;

            let check = verify_collection(&package, request.collection_code.as_deref());
            self.enforce_code(&check, &package)?;

            let label = request
                .location
                .as_ref()
                .map(LocationFix::label)
                .unwrap_or_else(|| package.pickup.address.clone());

            // A previous call may have died between the two steps.
            let picked = if package.status == PackageStatus::PickedUp {
                package
            } else {
                self.status
                    .transition(
                        &package,
                        PackageStatus::PickedUp,
                        Some(&label),
                        Some("Collected by driver"),
                    )
                    .await?
            };
            let moving = self
                .status
                .transition(&picked, PackageStatus::InTransit, Some(&label), Some("In transit"))
                .await?;

            if let Some(fix) = &request.location {
                self.log_fix(request.driver_id, fix).await;
            }

            self.notify(moving.id, "pickup", self.notifier.notify_pickup(&moving));
            Ok(moving)
        })
        .await
    }

    /// Opens the delivery leg explicitly; `deliver` does this itself when needed.
    pub async fn start_delivery(
        &self,
        package_id: u64,
        driver_id: Uuid,
        location: Option<LocationFix>,
    ) -> AppResult<ProofOfDelivery> {
        if let Some(fix) = &location {
            validate_fix(fix)?;
        }
        let package = self.get_package(package_id).await?;
        ensure_assigned(&package, driver_id)?;

        let label = location.as_ref().map(LocationFix::label);
        let (proof, _) = self
            .recorder
            .begin(&package, driver_id, label.as_deref())
            .await?;

        if let Some(fix) = &location {
            self.log_fix(driver_id, fix).await;
        }
        Ok(proof)
    }

    pub async fn attach_signature(
        &self,
        package_id: u64,
        driver_id: Uuid,
        signature: &str,
    ) -> AppResult<ProofOfDelivery> {
        let proof = self.active_proof_for(package_id, driver_id).await?;
        self.recorder.attach_signature(proof.id, signature).await
    }

    pub async fn attach_delivery_photo(
        &self,
        package_id: u64,
        driver_id: Uuid,
        photo_ref: &str,
    ) -> AppResult<ProofOfDelivery> {
        let proof = self.active_proof_for(package_id, driver_id).await?;
        self.recorder.attach_delivery_photo(proof.id, photo_ref).await
    }

    pub async fn attach_package_photo(
        &self,
        package_id: u64,
        driver_id: Uuid,
        photo_ref: &str,
    ) -> AppResult<ProofOfDelivery> {
        let proof = self.active_proof_for(package_id, driver_id).await?;
        self.recorder.attach_package_photo(proof.id, photo_ref).await
    }

    pub async fn delivery_requirements(&self, package_id: u64) -> AppResult<DeliveryRequirements> {
        self.get_package(package_id).await?;
        self.recorder.requirements(package_id).await
    }

    pub async fn deliver(&self, request: DeliveryRequest) -> AppResult<DeliveryReceipt> {
        self.observe("deliver", async {
            if let Some(fix) = &request.location {
                validate_fix(fix)?;
            }
            let package = self.get_package(request.package_id).await?;
            ensure_assigned(&package, request.driver_id)?;

            let check = verify_drop_off(&package, request.drop_off_code.as_deref());
            self.enforce_code(&check, &package)?;

            let proof = match self.recorder.active_record(package.id).await? {
                Some(proof) => proof,
                None => {
                    self.precheck_evidence(&request.evidence, &request.recipient)?;
                    let label = request.location.as_ref().map(LocationFix::label);
                    let (proof, _) = self
                        .recorder
                        .begin(&package, request.driver_id, label.as_deref())
                        .await?;
                    proof
                }
            };

            let proof = self.attach_evidence(proof, &request.evidence).await?;
            let (proof, package) = self.recorder.complete(proof.id, &request.recipient).await?;

            if let Some(fix) = &request.location {
                self.log_fix(request.driver_id, fix).await;
            }

            self.notify(package.id, "delivered", self.notifier.notify_delivered(&package, &proof));
            Ok(DeliveryReceipt { package, proof })
        })
        .await
    }

    pub async fn mark_failed(&self, request: FailureRequest) -> AppResult<DeliveryReceipt> {
        self.observe("mark_failed", async {
            if request.reason.trim().is_empty() {
                return Err(AppError::BadRequest("a failure reason is required".to_string()));
            }
            if let Some(fix) = &request.location {
                validate_fix(fix)?;
            }

            let package = self.get_package(request.package_id).await?;
            ensure_assigned(&package, request.driver_id)?;

            let (proof, package) = self
                .recorder
                .fail(
                    &package,
                    request.driver_id,
                    &request.reason,
                    request.notes.as_deref(),
                    request.photo_ref.as_deref(),
                )
                .await?;

            if let Some(fix) = &request.location {
                self.log_fix(request.driver_id, fix).await;
            }

            self.notify(package.id, "failed", self.notifier.notify_failed(&package, &request.reason));
            Ok(DeliveryReceipt { package, proof })
        })
        .await
    }

    pub async fn verify_collection_code(
        &self,
        package_id: u64,
        code: Option<&str>,
    ) -> AppResult<VerificationResult> {
        let package = self.get_package(package_id).await?;
        let result = verify_collection(&package, code);
        self.count_check(&result);
        Ok(result)
    }

    pub async fn verify_drop_off_code(
        &self,
        package_id: u64,
        code: Option<&str>,
    ) -> AppResult<VerificationResult> {
        let package = self.get_package(package_id).await?;
        let result = verify_drop_off(&package, code);
        self.count_check(&result);
        Ok(result)
    }

    pub async fn batch_pickup(
        &self,
        driver_id: Uuid,
        items: Vec<BatchPickupItem>,
        location: Option<LocationFix>,
    ) -> BatchReport<Package> {
        let mut report = BatchReport::new();

        for item in items {
            let request = PickupRequest {
                package_id: item.package_id,
                driver_id,
                collection_code: item.collection_code,
                location: location.clone(),
            };
            match self.pickup(request).await {
                Ok(package) => report.succeeded.push(package),
                Err(err) => {
                    error!(
                        package_id = item.package_id,
                        driver_id = %driver_id,
                        error = %err,
                        "batch pickup item failed"
                    );
                    report.failed.push(BatchFailure::new(item.package_id, &err));
                }
            }
        }

        info!(
            driver_id = %driver_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch pickup finished"
        );
        report
    }

    pub async fn batch_deliver(
        &self,
        driver_id: Uuid,
        items: Vec<BatchDeliveryItem>,
        location: Option<LocationFix>,
    ) -> BatchReport<DeliveryReceipt> {
        let mut report = BatchReport::new();

        for item in items {
            let package_id = item.package_id;
            let request = DeliveryRequest {
                package_id,
                driver_id,
                drop_off_code: item.drop_off_code,
                recipient: item.recipient,
                evidence: item.evidence,
                location: location.clone(),
            };
            match self.deliver(request).await {
                Ok(receipt) => report.succeeded.push(receipt),
                Err(err) => {
                    error!(
                        package_id,
                        driver_id = %driver_id,
                        error = %err,
                        "batch delivery item failed"
                    );
                    report.failed.push(BatchFailure::new(package_id, &err));
                }
            }
        }

        info!(
            driver_id = %driver_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch delivery finished"
        );
        report
    }

    pub async fn record_location(&self, driver_id: Uuid, fix: LocationFix) -> AppResult<DriverLocation> {
        validate_fix(&fix)?;
        self.get_driver(driver_id).await?;
        self.append_fix(driver_id, &fix).await
    }

    pub async fn current_location(&self, driver_id: Uuid) -> AppResult<Option<DriverLocation>> {
        self.get_driver(driver_id).await?;
        self.store.latest_location(driver_id).await
    }

    pub async fn location_history(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DriverLocation>> {
        self.get_driver(driver_id).await?;
        self.store.location_history(driver_id, since).await
    }

    async fn observe<T, F>(&self, operation: &'static str, work: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let start = Instant::now();
        let result = work.await;
        self.metrics
            .record_operation(operation, result.is_ok(), start.elapsed().as_secs_f64());
        result
    }

    fn notify(&self, package_id: u64, what: &'static str, outcome: Result<(), NotifyError>) {
        if let Err(err) = outcome {
            warn!(package_id, notification = what, error = %err, "notification failed");
        }
    }

    fn count_check(&self, result: &VerificationResult) {
        let outcome = if result.valid { "valid" } else { "invalid" };
        self.metrics
            .verification_checks_total
            .with_label_values(&[result.kind.as_str(), outcome])
            .inc();
    }

    fn enforce_code(&self, result: &VerificationResult, package: &Package) -> AppResult<()> {
        self.count_check(result);
        match result.to_error() {
            None => Ok(()),
            Some(err) if self.policy.strict_verification => Err(err),
            Some(_) => {
                warn!(
                    package_id = package.id,
                    tracking_number = %package.tracking_number,
                    kind = result.kind.as_str(),
                    reason = %result.message,
                    "proceeding without a verified code"
                );
                Ok(())
            }
        }
    }

    /// Rejects a delivery up front when the supplied evidence cannot satisfy
    /// policy, so the package is not moved out for delivery for nothing.
    fn precheck_evidence(
        &self,
        evidence: &DeliveryEvidence,
        recipient: &RecipientDetails,
    ) -> AppResult<()> {
        let policy = self.recorder.policy();

        if evidence.signature.is_some() && !policy.signature_required {
            return Err(AppError::RequirementNotApplicable("signature"));
        }
        if evidence.delivery_photo_ref.is_some() && !policy.photo_required {
            return Err(AppError::RequirementNotApplicable("delivery photo"));
        }
        if evidence.package_photo_ref.is_some() && !policy.photo_required {
            return Err(AppError::RequirementNotApplicable("package photo"));
        }

        match missing_evidence(
            policy.signature_required,
            policy.photo_required,
            policy.id_required,
            evidence.signature.is_some(),
            evidence.delivery_photo_ref.is_some(),
            recipient.id_number.as_deref(),
        ) {
            Some(missing) => Err(AppError::MissingRequiredEvidence(missing)),
            None => Ok(()),
        }
    }

    async fn attach_evidence(
        &self,
        mut proof: ProofOfDelivery,
        evidence: &DeliveryEvidence,
    ) -> AppResult<ProofOfDelivery> {
        if let Some(signature) = &evidence.signature {
            proof = self.recorder.attach_signature(proof.id, signature).await?;
        }
        if let Some(photo) = &evidence.delivery_photo_ref {
            proof = self.recorder.attach_delivery_photo(proof.id, photo).await?;
        }
        if let Some(photo) = &evidence.package_photo_ref {
            proof = self.recorder.attach_package_photo(proof.id, photo).await?;
        }
        Ok(proof)
    }

    async fn active_proof_for(&self, package_id: u64, driver_id: Uuid) -> AppResult<ProofOfDelivery> {
        let package = self.get_package(package_id).await?;
        ensure_assigned(&package, driver_id)?;
        self.recorder.active_record(package_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("no delivery in progress for package {package_id}"))
        })
    }

    async fn append_fix(&self, driver_id: Uuid, fix: &LocationFix) -> AppResult<DriverLocation> {
        self.store
            .append_location(DriverLocation {
                driver_id,
                point: fix.point(),
                address: fix.address.clone(),
                speed_kmh: fix.speed_kmh,
                recorded_at: self.clock.now(),
            })
            .await
    }

    /// Location sample taken alongside a committed action; the action stands
    /// even if the sample cannot be stored.
    async fn log_fix(&self, driver_id: Uuid, fix: &LocationFix) {
        if let Err(err) = self.append_fix(driver_id, fix).await {
            warn!(driver_id = %driver_id, error = %err, "failed to record driver location");
        }
    }
}

/// Checked before any state change.
fn validate_fix(fix: &LocationFix) -> AppResult<()> {
    if (-90.0..=90.0).contains(&fix.lat) && (-180.0..=180.0).contains(&fix.lng) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "coordinates out of range: {},{}",
            fix.lat, fix.lng
        )))
    }
}

fn ensure_assigned(package: &Package, driver_id: Uuid) -> AppResult<()> {
    if package.is_assigned_to(driver_id) {
        Ok(())
    } else {
        Err(AppError::NotAuthorizedDriver {
            package_id: package.id,
            driver_id,
        })
    }
}

fn generate_tracking_number() -> String {
    format!("RC{:08}", Uuid::new_v4().as_u128() % 100_000_000)
}

fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}
