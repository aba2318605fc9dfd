use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::ProofPolicy;
use crate::engine::status::StatusMachine;
use crate::error::{AppError, AppResult};
use crate::models::package::{Package, PackageStatus};
use crate::models::proof::{DeliveryOutcome, ProofOfDelivery, RecipientDetails};
use crate::store::PersistenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Artifact {
    Signature,
    DeliveryPhoto,
    PackagePhoto,
}

impl Artifact {
    fn name(&self) -> &'static str {
        match self {
            Artifact::Signature => "signature",
            Artifact::DeliveryPhoto => "delivery photo",
            Artifact::PackagePhoto => "package photo",
        }
    }

    fn applies(&self, proof: &ProofOfDelivery) -> bool {
        match self {
            Artifact::Signature => proof.signature_required,
            Artifact::DeliveryPhoto | Artifact::PackagePhoto => proof.photo_required,
        }
    }
}

/// What a delivery still needs, as reported to the driver's client.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRequirements {
    pub package_id: u64,
    pub signature_required: bool,
    pub photo_required: bool,
    pub id_verification_required: bool,
    pub active_proof_id: Option<u64>,
    pub has_signature: bool,
    pub has_delivery_photo: bool,
    pub has_package_photo: bool,
}

/// First piece of required evidence that is absent, if any.
pub fn missing_evidence(
    signature_required: bool,
    photo_required: bool,
    id_required: bool,
    has_signature: bool,
    has_photo: bool,
    recipient_id: Option<&str>,
) -> Option<&'static str> {
    if signature_required && !has_signature {
        return Some("signature");
    }
    if photo_required && !has_photo {
        return Some("delivery photo");
    }
    if id_required && recipient_id.is_none_or(|id| id.trim().is_empty()) {
        return Some("recipient id number");
    }
    None
}

/// Captures completion evidence and finalises deliveries and failures.
pub struct ProofRecorder {
    store: Arc<dyn PersistenceStore>,
    status: Arc<StatusMachine>,
    clock: Arc<dyn Clock>,
    policy: ProofPolicy,
}

impl ProofRecorder {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        status: Arc<StatusMachine>,
        clock: Arc<dyn Clock>,
        policy: ProofPolicy,
    ) -> Self {
        Self {
            store,
            status,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> ProofPolicy {
        self.policy
    }

    pub async fn get(&self, proof_id: u64) -> AppResult<ProofOfDelivery> {
        self.store
            .get_proof(proof_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("proof of delivery {proof_id} not found")))
    }

    pub async fn active_record(&self, package_id: u64) -> AppResult<Option<ProofOfDelivery>> {
        Ok(self
            .store
            .proofs_by_package(package_id)
            .await?
            .into_iter()
            .find(ProofOfDelivery::is_active))
    }

    pub async fn requirements(&self, package_id: u64) -> AppResult<DeliveryRequirements> {
        let active = self.active_record(package_id).await?;
        let (signature, photo, id) = match &active {
            Some(proof) => (
                proof.signature_required,
                proof.photo_required,
                proof.id_verification_required,
            ),
            None => (
                self.policy.signature_required,
                self.policy.photo_required,
                self.policy.id_required,
            ),
        };

        Ok(DeliveryRequirements {
            package_id,
            signature_required: signature,
            photo_required: photo,
            id_verification_required: id,
            active_proof_id: active.as_ref().map(|proof| proof.id),
            has_signature: active.as_ref().is_some_and(|p| p.signature.is_some()),
            has_delivery_photo: active.as_ref().is_some_and(|p| p.delivery_photo_ref.is_some()),
            has_package_photo: active.as_ref().is_some_and(|p| p.package_photo_ref.is_some()),
        })
    }

    /// Opens the delivery leg: one in-progress record per package, package
    /// moves to OUT_FOR_DELIVERY.
    pub async fn begin(
        &self,
        package: &Package,
        driver_id: Uuid,
        location: Option<&str>,
    ) -> AppResult<(ProofOfDelivery, Package)> {
        if self.active_record(package.id).await?.is_some() {
            return Err(AppError::DuplicateActiveRecord {
                package_id: package.id,
            });
        }

        let updated = self
            .status
            .transition(
                package,
                PackageStatus::OutForDelivery,
                location,
                Some("Out for delivery"),
            )
            .await?;

        let now = self.clock.now();
        let proof = self
            .store
            .insert_proof(ProofOfDelivery {
                id: 0,
                package_id: package.id,
                driver_id,
                delivery_location: location
                    .map(str::to_string)
                    .or_else(|| Some(package.delivery.address.clone())),
                signature_required: self.policy.signature_required,
                photo_required: self.policy.photo_required,
                id_verification_required: self.policy.id_required,
                signature: None,
                delivery_photo_ref: None,
                package_photo_ref: None,
                recipient_name: None,
                recipient_phone: None,
                recipient_id_number: None,
                delivery_method: None,
                notes: None,
                outcome: DeliveryOutcome::InProgress,
                failure_reason: None,
                started_at: now,
                updated_at: now,
                finished_at: None,
            })
            .await?;

        info!(
            package_id = package.id,
            proof_id = proof.id,
            driver_id = %driver_id,
            "delivery started"
        );

        Ok((proof, updated))
    }

    pub async fn attach_signature(&self, proof_id: u64, data: &str) -> AppResult<ProofOfDelivery> {
        self.attach(proof_id, Artifact::Signature, data).await
    }

    pub async fn attach_delivery_photo(
        &self,
        proof_id: u64,
        photo_ref: &str,
    ) -> AppResult<ProofOfDelivery> {
        self.attach(proof_id, Artifact::DeliveryPhoto, photo_ref)
            .await
    }

    pub async fn attach_package_photo(
        &self,
        proof_id: u64,
        photo_ref: &str,
    ) -> AppResult<ProofOfDelivery> {
        self.attach(proof_id, Artifact::PackagePhoto, photo_ref)
            .await
    }

    async fn attach(
        &self,
        proof_id: u64,
        artifact: Artifact,
        value: &str,
    ) -> AppResult<ProofOfDelivery> {
        let mut proof = self.get(proof_id).await?;
        ensure_open(&proof)?;

        if !artifact.applies(&proof) {
            return Err(AppError::RequirementNotApplicable(artifact.name()));
        }
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{} is empty", artifact.name())));
        }

        let value = Some(value.to_string());
        match artifact {
            Artifact::Signature => proof.signature = value,
            Artifact::DeliveryPhoto => proof.delivery_photo_ref = value,
            Artifact::PackagePhoto => proof.package_photo_ref = value,
        }
        proof.updated_at = self.clock.now();

        self.store.update_proof(proof).await
    }

    /// Finalises a delivery. The record is immutable afterwards.
    pub async fn complete(
        &self,
        proof_id: u64,
        recipient: &RecipientDetails,
    ) -> AppResult<(ProofOfDelivery, Package)> {
        let mut proof = self.get(proof_id).await?;
        ensure_open(&proof)?;

        if let Some(missing) = missing_evidence(
            proof.signature_required,
            proof.photo_required,
            proof.id_verification_required,
            proof.signature.is_some(),
            proof.delivery_photo_ref.is_some(),
            recipient.id_number.as_deref(),
        ) {
            return Err(AppError::MissingRequiredEvidence(missing));
        }

        let package = self.load_package(proof.package_id).await?;
        let updated = self
            .status
            .transition(
                &package,
                PackageStatus::Delivered,
                proof.delivery_location.as_deref(),
                recipient.notes.as_deref(),
            )
            .await?;

        let now = self.clock.now();
        proof.recipient_name = Some(recipient.name.clone());
        proof.recipient_phone = recipient.phone.clone();
        proof.recipient_id_number = recipient.id_number.clone();
        proof.notes = recipient.notes.clone();
        proof.delivery_method = recipient.method;
        proof.outcome = DeliveryOutcome::Completed;
        proof.updated_at = now;
        proof.finished_at = Some(now);

        let proof = self.store.update_proof(proof).await?;
        info!(package_id = package.id, proof_id = proof.id, "delivery completed");

        Ok((proof, updated))
    }

    /// Records a failed attempt against the active record (or a fresh one when
    /// none is open) and moves the package to FAILED_DELIVERY.
    pub async fn fail(
        &self,
        package: &Package,
        driver_id: Uuid,
        reason: &str,
        notes: Option<&str>,
        photo_ref: Option<&str>,
    ) -> AppResult<(ProofOfDelivery, Package)> {
        let active = self.active_record(package.id).await?;

        let updated = self
            .status
            .transition(
                package,
                PackageStatus::FailedDelivery,
                active
                    .as_ref()
                    .and_then(|proof| proof.delivery_location.as_deref()),
                Some(reason),
            )
            .await?;

        let now = self.clock.now();
        let mut proof = match active {
            Some(proof) => proof,
            None => ProofOfDelivery {
                id: 0,
                package_id: package.id,
                driver_id,
                delivery_location: Some(package.delivery.address.clone()),
                signature_required: self.policy.signature_required,
                photo_required: self.policy.photo_required,
                id_verification_required: self.policy.id_required,
                signature: None,
                delivery_photo_ref: None,
                package_photo_ref: None,
                recipient_name: None,
                recipient_phone: None,
                recipient_id_number: None,
                delivery_method: None,
                notes: None,
                outcome: DeliveryOutcome::InProgress,
                failure_reason: None,
                started_at: now,
                updated_at: now,
                finished_at: None,
            },
        };

        proof.outcome = DeliveryOutcome::Failed;
        proof.failure_reason = Some(reason.to_string());
        if let Some(notes) = notes {
            proof.notes = Some(notes.to_string());
        }
        if let Some(photo_ref) = photo_ref {
            proof.delivery_photo_ref = Some(photo_ref.to_string());
        }
        proof.updated_at = now;
        proof.finished_at = Some(now);

        let proof = if proof.id == 0 {
            self.store.insert_proof(proof).await?
        } else {
            self.store.update_proof(proof).await?
        };

        info!(package_id = package.id, proof_id = proof.id, reason, "delivery failed");
        Ok((proof, updated))
    }

    /// Closes an open record when its package leaves the delivery flow
    /// some other way (cancellation).
    pub async fn abandon_active(&self, package_id: u64, reason: &str) -> AppResult<()> {
        if let Some(mut proof) = self.active_record(package_id).await? {
            let now = self.clock.now();
            proof.outcome = DeliveryOutcome::Failed;
            proof.failure_reason = Some(reason.to_string());
            proof.updated_at = now;
            proof.finished_at = Some(now);
            self.store.update_proof(proof).await?;
        }
        Ok(())
    }

    async fn load_package(&self, package_id: u64) -> AppResult<Package> {
        self.store
            .get_package(package_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("package {package_id} not found")))
    }
}

fn ensure_open(proof: &ProofOfDelivery) -> AppResult<()> {
    if proof.is_active() {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "proof of delivery {} is already finalised",
            proof.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::{missing_evidence, ProofRecorder};
    use crate::clock::SystemClock;
    use crate::config::ProofPolicy;
    use crate::engine::status::StatusMachine;
    use crate::error::AppError;
    use crate::models::location::Address;
    use crate::models::package::{Package, PackageStatus};
    use crate::models::proof::{DeliveryOutcome, RecipientDetails};
    use crate::notify::BroadcastNotifier;
    use crate::observability::metrics::Metrics;
    use crate::store::{MemoryStore, PersistenceStore};

    fn recorder(store: Arc<MemoryStore>, policy: ProofPolicy) -> ProofRecorder {
        let clock = Arc::new(SystemClock);
        let status = Arc::new(StatusMachine::new(
            store.clone(),
            Arc::new(BroadcastNotifier::new(8)),
            clock.clone(),
            Metrics::new(),
        ));
        ProofRecorder::new(store, status, clock, policy)
    }

    async fn in_transit(store: &MemoryStore, driver_id: Uuid) -> Package {
        let now = Utc::now();
        store
            .insert_package(Package {
                id: 0,
                tracking_number: "RC12345678".to_string(),
                sender_ref: None,
                recipient_name: "Jane".to_string(),
                recipient_phone: None,
                pickup: Address::new("1 Pickup St"),
                delivery: Address::new("2 Delivery Ave"),
                weight_kg: 3.5,
                dimensions: None,
                description: None,
                shipping_cost: None,
                status: PackageStatus::InTransit,
                assigned_driver: Some(driver_id),
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

    fn signature_only() -> ProofPolicy {
        ProofPolicy {
            signature_required: true,
            photo_required: false,
            id_required: false,
        }
    }

    fn jane() -> RecipientDetails {
        RecipientDetails {
            name: "Jane".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_evidence_reports_first_gap() {
        assert_eq!(
            missing_evidence(true, true, true, false, true, Some("800101")),
            Some("signature")
        );
        assert_eq!(
            missing_evidence(true, true, false, true, false, None),
            Some("delivery photo")
        );
        assert_eq!(
            missing_evidence(false, false, true, false, false, Some("  ")),
            Some("recipient id number")
        );
        assert_eq!(missing_evidence(false, false, false, false, false, None), None);
    }

    #[tokio::test]
    async fn second_begin_while_in_progress_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(store.clone(), signature_only());
        let driver = Uuid::new_v4();
        let package = in_transit(&store, driver).await;

        let (proof, out) = recorder.begin(&package, driver, None).await.unwrap();
        assert_eq!(out.status, PackageStatus::OutForDelivery);
        assert_eq!(proof.outcome, DeliveryOutcome::InProgress);
        assert!(proof.signature_required);

        let again = recorder.begin(&out, driver, None).await;
        assert!(matches!(again, Err(AppError::DuplicateActiveRecord { .. })));
    }

    #[tokio::test]
    async fn attaching_evidence_that_is_not_required_fails() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(store.clone(), signature_only());
        let driver = Uuid::new_v4();
        let package = in_transit(&store, driver).await;
        let (proof, _) = recorder.begin(&package, driver, None).await.unwrap();

        let photo = recorder.attach_delivery_photo(proof.id, "photos/1.jpg").await;
        assert!(matches!(
            photo,
            Err(AppError::RequirementNotApplicable("delivery photo"))
        ));

        let signed = recorder.attach_signature(proof.id, "sig-blob").await.unwrap();
        assert_eq!(signed.signature.as_deref(), Some("sig-blob"));
    }

    #[tokio::test]
    async fn complete_requires_signature_even_with_other_evidence() {
        let store = Arc::new(MemoryStore::new());
        let policy = ProofPolicy {
            signature_required: true,
            photo_required: true,
            id_required: true,
        };
        let recorder = recorder(store.clone(), policy);
        let driver = Uuid::new_v4();
        let package = in_transit(&store, driver).await;
        let (proof, _) = recorder.begin(&package, driver, None).await.unwrap();

        recorder
            .attach_delivery_photo(proof.id, "photos/door.jpg")
            .await
            .unwrap();
        recorder
            .attach_package_photo(proof.id, "photos/box.jpg")
            .await
            .unwrap();

        let recipient = RecipientDetails {
            id_number: Some("8001015009087".to_string()),
            ..jane()
        };
        let result = recorder.complete(proof.id, &recipient).await;
        assert!(matches!(
            result,
            Err(AppError::MissingRequiredEvidence("signature"))
        ));

        let package = store.get_package(package.id).await.unwrap().unwrap();
        assert_eq!(package.status, PackageStatus::OutForDelivery);
    }

    #[tokio::test]
    async fn completed_record_is_immutable() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(store.clone(), signature_only());
        let driver = Uuid::new_v4();
        let package = in_transit(&store, driver).await;
        let (proof, _) = recorder.begin(&package, driver, None).await.unwrap();

        recorder.attach_signature(proof.id, "sig-blob").await.unwrap();
        let (done, delivered) = recorder.complete(proof.id, &jane()).await.unwrap();
        assert_eq!(done.outcome, DeliveryOutcome::Completed);
        assert_eq!(done.recipient_name.as_deref(), Some("Jane"));
        assert_eq!(delivered.status, PackageStatus::Delivered);
        assert!(delivered.delivered_at.is_some());

        let tamper = recorder.attach_signature(proof.id, "forged").await;
        assert!(matches!(tamper, Err(AppError::Conflict(_))));
        let twice = recorder.complete(proof.id, &jane()).await;
        assert!(matches!(twice, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn failure_allows_a_later_retry() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(store.clone(), signature_only());
        let driver = Uuid::new_v4();
        let package = in_transit(&store, driver).await;
        let (_, out) = recorder.begin(&package, driver, None).await.unwrap();

        let (failed, package) = recorder
            .fail(&out, driver, "Recipient not home", None, Some("photos/door.jpg"))
            .await
            .unwrap();
        assert_eq!(failed.outcome, DeliveryOutcome::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("Recipient not home"));
        assert_eq!(package.status, PackageStatus::FailedDelivery);

        let (retry, package) = recorder.begin(&package, driver, None).await.unwrap();
        assert_ne!(retry.id, failed.id);
        assert_eq!(package.status, PackageStatus::OutForDelivery);
        assert_eq!(store.proofs_by_package(package.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stale_snapshot_cannot_overwrite_a_completed_record() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder(store.clone(), signature_only());
        let driver = Uuid::new_v4();
        let package = in_transit(&store, driver).await;
        let (proof, _) = recorder.begin(&package, driver, None).await.unwrap();
        let signed = recorder.attach_signature(proof.id, "sig-blob").await.unwrap();

        let mut stale = signed;
        recorder.complete(proof.id, &jane()).await.unwrap();

        stale.signature = Some("forged".to_string());
        let overwrite = store.update_proof(stale).await;
        assert!(matches!(overwrite, Err(AppError::Conflict(_))));

        let stored = recorder.get(proof.id).await.unwrap();
        assert_eq!(stored.outcome, DeliveryOutcome::Completed);
        assert_eq!(stored.signature.as_deref(), Some("sig-blob"));
        assert!(stored.finished_at.is_some());
    }
}
