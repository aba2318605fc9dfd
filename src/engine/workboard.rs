use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::EarningsPolicy;
use crate::engine::dispatch::DispatchEngine;
use crate::engine::route::{priority_order, total_distance, SequencedStop, Stop, StopKind};
use crate::error::{AppError, AppResult};
use crate::geo::{distance_between, eta_minutes};
use crate::geocode::locate;
use crate::models::location::{Address, GeoPoint};
use crate::models::package::{Package, PackageStatus};
use crate::models::proof::DeliveryOutcome;

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct WorkboardStats {
    pub driver_id: Uuid,
    pub to_pickup: usize,
    pub in_vehicle: usize,
    pub delivered_today: usize,
    pub failed_today: usize,
    pub carried_weight_kg: f64,
    pub total_stops: usize,
    pub completed_stops: usize,
    pub route_distance_km: Option<f64>,
    pub eta_minutes: Option<u32>,
    pub estimated_earnings: f64,
    pub earned_today: f64,
    pub current_location: Option<GeoPoint>,
}

#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pub driver_id: Uuid,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub page: usize,
    pub size: usize,
}

impl AvailabilityQuery {
    pub fn for_driver(driver_id: Uuid) -> Self {
        Self {
            driver_id,
            lat: None,
            lng: None,
            max_distance_km: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailablePackage {
    #[serde(flatten)]
    pub package: Package,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailablePage {
    pub items: Vec<AvailablePackage>,
    pub page: usize,
    pub size: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub deliveries_completed: usize,
    pub deliveries_failed: usize,
    pub pickups_completed: usize,
    pub distance_km: f64,
    pub earnings: f64,
}

impl DispatchEngine {
    pub async fn workboard_stats(
        &self,
        driver_id: Uuid,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> AppResult<WorkboardStats> {
        self.get_driver(driver_id).await?;
        let start = self.driver_position(driver_id, lat, lng).await?;
        let since = self.clock.start_of_today();

        let packages = self.store.packages_by_driver(driver_id).await?;
        let open: Vec<&Package> = packages.iter().filter(|p| is_open(p.status)).collect();
        let delivered_today: Vec<&Package> = packages
            .iter()
            .filter(|p| delivered_since(p, since))
            .collect();

        let failed_today = self
            .store
            .proofs_by_driver(driver_id)
            .await?
            .into_iter()
            .filter(|proof| {
                proof.outcome == DeliveryOutcome::Failed
                    && proof.finished_at.is_some_and(|at| at >= since)
            })
            .count();

        let to_pickup = open.iter().filter(|p| p.status.awaits_pickup()).count();
        let in_vehicle: Vec<&&Package> = open.iter().filter(|p| p.status.in_vehicle()).collect();
        let carried_weight_kg = in_vehicle.iter().map(|p| p.weight_kg).sum::<f64>();

        let stops = priority_order(self.stops_for(&open), start);
        let route_distance_km = start.map(|origin| total_distance(&stops, origin));

        let earnings = self.policy.earnings;
        let estimated_earnings =
            round2(open.iter().map(|p| self.package_earnings(p, &earnings)).sum());
        let earned_today = round2(
            delivered_today
                .iter()
                .map(|p| self.package_earnings(p, &earnings))
                .sum(),
        );

        Ok(WorkboardStats {
            driver_id,
            to_pickup,
            in_vehicle: in_vehicle.len(),
            delivered_today: delivered_today.len(),
            failed_today,
            carried_weight_kg,
            total_stops: stops.len() + delivered_today.len(),
            completed_stops: delivered_today.len(),
            route_distance_km,
            eta_minutes: route_distance_km.map(eta_minutes),
            estimated_earnings,
            earned_today,
            current_location: start,
        })
    }

    /// The driver's open packages as an ordered run of stops.
    pub async fn assigned_stops(
        &self,
        driver_id: Uuid,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> AppResult<Vec<SequencedStop>> {
        self.get_driver(driver_id).await?;
        let start = self.driver_position(driver_id, lat, lng).await?;

        let packages = self.store.packages_by_driver(driver_id).await?;
        let open: Vec<&Package> = packages.iter().filter(|p| is_open(p.status)).collect();

        Ok(priority_order(self.stops_for(&open), start))
    }

    /// Packages a driver could take on next, nearest first.
    pub async fn available_for_pickup(&self, query: AvailabilityQuery) -> AppResult<AvailablePage> {
        if query.size == 0 {
            return Err(AppError::BadRequest("size must be greater than 0".to_string()));
        }
        self.get_driver(query.driver_id).await?;
        let position = self
            .driver_position(query.driver_id, query.lat, query.lng)
            .await?;

        let mut candidates: Vec<Package> = self
            .store
            .packages_by_status(PackageStatus::Pending)
            .await?
            .into_iter()
            .filter(|p| p.assigned_driver.is_none())
            .collect();

        if candidates.is_empty() {
            debug!(driver_id = %query.driver_id, "no unassigned packages, offering assigned ones");
            candidates = self
                .store
                .packages_by_status(PackageStatus::Assigned)
                .await?
                .into_iter()
                .filter(|p| !p.is_assigned_to(query.driver_id))
                .collect();
        }

        let mut available: Vec<AvailablePackage> = candidates
            .into_iter()
            .map(|package| {
                let distance_km = distance_between(position, self.point_of(&package.pickup));
                AvailablePackage {
                    package,
                    distance_km,
                    eta_minutes: distance_km.map(eta_minutes),
                }
            })
            .filter(|candidate| match (position, query.max_distance_km) {
                (Some(_), Some(max)) => candidate.distance_km.is_some_and(|km| km <= max),
                _ => true,
            })
            .collect();

        // Unknown distances sort last; the sort is stable so ties keep id order.
        available.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let total = available.len();
        let items = available
            .into_iter()
            .skip(query.page.saturating_mul(query.size))
            .take(query.size)
            .collect();

        Ok(AvailablePage {
            items,
            page: query.page,
            size: query.size,
            total,
        })
    }

    pub async fn today_summary(&self, driver_id: Uuid) -> AppResult<TodaySummary> {
        self.get_driver(driver_id).await?;
        let since = self.clock.start_of_today();
        let earnings = self.policy.earnings;

        let packages = self.store.packages_by_driver(driver_id).await?;
        let delivered: Vec<&Package> = packages.iter().filter(|p| delivered_since(p, since)).collect();

        let deliveries_failed = self
            .store
            .proofs_by_driver(driver_id)
            .await?
            .into_iter()
            .filter(|proof| {
                proof.outcome == DeliveryOutcome::Failed
                    && proof.finished_at.is_some_and(|at| at >= since)
            })
            .count();

        let mut pickups_completed = 0;
        for package in &packages {
            let picked_today = self
                .store
                .tracking_events(package.id)
                .await?
                .iter()
                .any(|event| event.status == PackageStatus::PickedUp && event.created_at >= since);
            if picked_today {
                pickups_completed += 1;
            }
        }

        let distance_km = delivered
            .iter()
            .filter_map(|p| self.trip_distance(p))
            .sum::<f64>();

        Ok(TodaySummary {
            driver_id,
            date: since.date_naive(),
            deliveries_completed: delivered.len(),
            deliveries_failed,
            pickups_completed,
            distance_km: round2(distance_km),
            earnings: round2(delivered.iter().map(|p| self.package_earnings(p, &earnings)).sum()),
        })
    }

    /// Explicit coordinates win; otherwise the driver's last reported fix.
    async fn driver_position(
        &self,
        driver_id: Uuid,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> AppResult<Option<GeoPoint>> {
        if let (Some(lat), Some(lng)) = (lat, lng) {
            return Ok(Some(GeoPoint::new(lat, lng)));
        }
        Ok(self
            .store
            .latest_location(driver_id)
            .await?
            .map(|location| location.point))
    }

    fn stops_for(&self, packages: &[&Package]) -> Vec<Stop> {
        packages
            .iter()
            .map(|package| {
                let (kind, address) = if package.status.awaits_pickup() {
                    (StopKind::Pickup, &package.pickup)
                } else {
                    (StopKind::Delivery, &package.delivery)
                };
                Stop {
                    package_id: package.id,
                    tracking_number: package.tracking_number.clone(),
                    kind,
                    address: address.address.clone(),
                    point: self.point_of(address),
                    weight_kg: package.weight_kg,
                }
            })
            .collect()
    }

    fn point_of(&self, address: &Address) -> Option<GeoPoint> {
        locate(self.geocoder.as_ref(), address)
    }

    fn trip_distance(&self, package: &Package) -> Option<f64> {
        distance_between(self.point_of(&package.pickup), self.point_of(&package.delivery))
    }

    fn package_earnings(&self, package: &Package, policy: &EarningsPolicy) -> f64 {
        policy.base_rate
            + policy.per_km * self.trip_distance(package).unwrap_or(0.0)
            + policy.per_kg * package.weight_kg
    }
}

fn is_open(status: PackageStatus) -> bool {
    status.awaits_pickup() || status.in_vehicle()
}

fn delivered_since(package: &Package, since: DateTime<Utc>) -> bool {
    package.status == PackageStatus::Delivered && package.delivered_at.is_some_and(|at| at >= since)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
