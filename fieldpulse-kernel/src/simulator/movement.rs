//! Position updates for mobile assets.
//!
//! Small random perturbation per tick, clamped to the demo region's
//! bounding box so trucks never drift off the map. Fixed-site assets
//! are never moved.

use crate::config::BoundingBox;
use crate::models::GeoPoint;
use rand::Rng;

/// One movement step: uniform lat/lon perturbation clamped to the region
pub fn advance(
    position: GeoPoint,
    region: &BoundingBox,
    max_step_deg: f64,
    rng: &mut impl Rng,
) -> GeoPoint {
    let lat = position.lat + rng.gen_range(-max_step_deg..=max_step_deg);
    let lon = position.lon + rng.gen_range(-max_step_deg..=max_step_deg);
    GeoPoint {
        lat: lat.clamp(region.min_lat, region.max_lat),
        lon: lon.clamp(region.min_lon, region.max_lon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn region() -> BoundingBox {
        BoundingBox {
            min_lat: 31.2,
            max_lat: 32.8,
            min_lon: -103.1,
            max_lon: -101.1,
        }
    }

    #[test]
    fn test_step_is_bounded() {
        let region = region();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let start = GeoPoint { lat: 32.0, lon: -102.0 };
        let next = advance(start, &region, 0.01, &mut rng);
        assert!((next.lat - start.lat).abs() <= 0.01);
        assert!((next.lon - start.lon).abs() <= 0.01);
    }

    #[test]
    fn test_never_leaves_region() {
        let region = region();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut position = GeoPoint { lat: 31.95, lon: -102.11 };
        for _ in 0..10_000 {
            position = advance(position, &region, 0.01, &mut rng);
            assert!(region.contains(position.lat, position.lon), "escaped at {position:?}");
        }
    }

    #[test]
    fn test_clamped_at_corner() {
        let region = region();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        // départ collé au coin : le pas est clampé, pas réfléchi
        let corner = GeoPoint { lat: region.max_lat, lon: region.min_lon };
        for _ in 0..100 {
            let next = advance(corner, &region, 0.05, &mut rng);
            assert!(region.contains(next.lat, next.lon));
        }
    }
}
