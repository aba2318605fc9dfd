use dashmap::DashMap;

use crate::models::location::{Address, GeoPoint};

/// Resolves free-text addresses to coordinates. `None` means unknown and
/// callers must leave the address out of distance-based work.
pub trait GeocodeProvider: Send + Sync {
    fn resolve(&self, address: &str) -> Option<GeoPoint>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeocoder;

impl GeocodeProvider for NoGeocoder {
    fn resolve(&self, _address: &str) -> Option<GeoPoint> {
        None
    }
}

/// Lookup table keyed by normalised address text.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    entries: DashMap<String, GeoPoint>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: &str, point: GeoPoint) {
        self.entries.insert(normalise(address), point);
    }
}

impl GeocodeProvider for StaticGeocoder {
    fn resolve(&self, address: &str) -> Option<GeoPoint> {
        self.entries.get(&normalise(address)).map(|entry| *entry.value())
    }
}

fn normalise(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Coordinates carried on the address win; otherwise ask the provider.
pub fn locate(geocoder: &dyn GeocodeProvider, address: &Address) -> Option<GeoPoint> {
    address.point.or_else(|| {
        let text = address.address.trim();
        if text.is_empty() {
            None
        } else {
            geocoder.resolve(text)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{locate, GeocodeProvider, NoGeocoder, StaticGeocoder};
    use crate::models::location::{Address, GeoPoint};

    #[test]
    fn static_geocoder_ignores_case_and_spacing() {
        let geocoder = StaticGeocoder::new();
        geocoder.insert("12 Main Rd,  Sandton", GeoPoint::new(-26.1, 28.05));

        assert_eq!(
            geocoder.resolve("12 main rd, sandton"),
            Some(GeoPoint::new(-26.1, 28.05))
        );
        assert_eq!(geocoder.resolve("13 Main Rd, Sandton"), None);
    }

    #[test]
    fn explicit_coordinates_skip_the_provider() {
        let geocoder = StaticGeocoder::new();
        geocoder.insert("depot", GeoPoint::new(1.0, 1.0));

        let address = Address::with_point("depot", GeoPoint::new(2.0, 2.0));
        assert_eq!(locate(&geocoder, &address), Some(GeoPoint::new(2.0, 2.0)));
    }

    #[test]
    fn unresolvable_address_is_unknown() {
        assert_eq!(locate(&NoGeocoder, &Address::new("somewhere")), None);
        assert_eq!(locate(&NoGeocoder, &Address::default()), None);
    }
}
