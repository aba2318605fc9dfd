use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A postal address with coordinates when they are known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(default)]
    pub point: Option<GeoPoint>,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            point: None,
        }
    }

    pub fn with_point(address: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            address: address.into(),
            point: Some(point),
        }
    }
}

/// A position report sent by a driver's client. Never mutated once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverLocation {
    pub driver_id: Uuid,
    pub point: GeoPoint,
    pub address: Option<String>,
    pub speed_kmh: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Where a driver says they are while performing an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub speed_kmh: Option<f64>,
}

impl LocationFix {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Label used on tracking events: the address if given, otherwise the raw coordinates.
    pub fn label(&self) -> String {
        match &self.address {
            Some(address) if !address.trim().is_empty() => address.clone(),
            _ => format!("{:.5},{:.5}", self.lat, self.lng),
        }
    }
}
