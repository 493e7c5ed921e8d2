//! Delivery zone geometry
//!
//! Zones are radius bands around the configured center point. A point
//! belongs to the zone whose band contains its haversine distance, with
//! half-open semantics `[inner_radius, outer_radius)` so adjacent bands
//! never overlap.

use shared::models::{DeliveryZone, GeoPoint};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Find the zone whose band contains `point`, measured from `center`.
pub fn resolve_zone<'a>(
    zones: &'a [DeliveryZone],
    center: GeoPoint,
    point: GeoPoint,
) -> Option<&'a DeliveryZone> {
    let distance = haversine_km(center, point);
    zones
        .iter()
        .find(|z| distance >= z.inner_radius && distance < z.outer_radius)
}

/// Delivery cost for a zone given the item subtotal. Free above the zone
/// threshold; a threshold of 0 means delivery is never free.
pub fn delivery_cost(zone: &DeliveryZone, items_subtotal: f64) -> f64 {
    if zone.free_order_price > 0.0 && items_subtotal >= zone.free_order_price {
        0.0
    } else {
        zone.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, inner: f64, outer: f64, price: f64, free_above: f64) -> DeliveryZone {
        DeliveryZone {
            name: name.into(),
            price,
            free_order_price: free_above,
            inner_radius: inner,
            outer_radius: outer,
        }
    }

    // ~1 degree of latitude is ~111.2 km; offsets below give controlled
    // distances from the center.
    const CENTER: GeoPoint = GeoPoint { lat: 50.0, lng: 30.0 };

    fn point_at_km(km: f64) -> GeoPoint {
        GeoPoint {
            lat: 50.0 + km / 111.19,
            lng: 30.0,
        }
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        assert!(haversine_km(CENTER, CENTER) < 1e-9);
    }

    #[test]
    fn inner_boundary_belongs_to_the_outer_band() {
        let zones = vec![zone("near", 0.0, 3.0, 50.0, 0.0), zone("far", 3.0, 6.0, 90.0, 0.0)];
        // Just outside 3 km must already be in the far band.
        let z = resolve_zone(&zones, CENTER, point_at_km(3.001)).unwrap();
        assert_eq!(z.name, "far");
        // Just under 3 km stays in the near band.
        let z = resolve_zone(&zones, CENTER, point_at_km(2.999)).unwrap();
        assert_eq!(z.name, "near");
    }

    #[test]
    fn outside_every_band_matches_nothing() {
        let zones = vec![zone("near", 0.0, 3.0, 50.0, 0.0)];
        assert!(resolve_zone(&zones, CENTER, point_at_km(10.0)).is_none());
    }

    #[test]
    fn free_delivery_above_threshold() {
        let z = zone("near", 0.0, 3.0, 60.0, 800.0);
        assert_eq!(delivery_cost(&z, 850.0), 0.0);
        assert_eq!(delivery_cost(&z, 750.0), 60.0);
        assert_eq!(delivery_cost(&z, 800.0), 0.0);
    }

    #[test]
    fn zero_threshold_never_waives_delivery() {
        let z = zone("near", 0.0, 3.0, 60.0, 0.0);
        assert_eq!(delivery_cost(&z, 10_000.0), 60.0);
    }
}
