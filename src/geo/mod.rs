use crate::models::location::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const AVERAGE_URBAN_SPEED_KMH: f64 = 30.0;

pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + phi1.cos() * phi2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}

/// Distance between two possibly-unresolved points. Unknown stays unknown.
pub fn distance_between(a: Option<GeoPoint>, b: Option<GeoPoint>) -> Option<f64> {
    Some(haversine_km(&a?, &b?))
}

/// Minutes to cover `distance_km` at an average urban speed of 30 km/h.
pub fn eta_minutes(distance_km: f64) -> u32 {
    (distance_km.max(0.0) / AVERAGE_URBAN_SPEED_KMH * 60.0).round() as u32
}
