//! Fixtures partagées : actifs et lectures canoniques pour les tests.

use fieldpulse_kernel::models::{
    Asset, AssetStatus, AssetType, GeoPoint, MaintenanceInfo, MetricChannel, SensorReading,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Source aléatoire déterministe pour les tests
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Actif de test positionné au centre de la zone démo
pub fn test_asset(id: &str, asset_type: AssetType) -> Asset {
    Asset {
        id: id.to_string(),
        name: format!("Test {id}"),
        asset_type,
        manufacturer: "Halliburton".to_string(),
        model_number: "HWS-2200".to_string(),
        serial_number: "SN-0".to_string(),
        status: AssetStatus::Active,
        position: GeoPoint { lat: 31.99, lon: -102.08 },
        sensor_id: format!("SEN-{id}"),
        maintenance: MaintenanceInfo {
            install_date: "2023-04-18".to_string(),
            last_service_date: "2026-06-12".to_string(),
            next_service_due: "2026-09-12".to_string(),
            maintenance_team: "Field Ops A".to_string(),
        },
        last_update: OffsetDateTime::UNIX_EPOCH,
    }
}

/// Lecture de test à timestamp explicite
pub fn test_reading(
    sensor_id: &str,
    asset_id: &str,
    ts_secs: i64,
    values: &[(MetricChannel, f64)],
) -> SensorReading {
    SensorReading {
        sensor_id: sensor_id.to_string(),
        asset_id: asset_id.to_string(),
        timestamp: OffsetDateTime::from_unix_timestamp(ts_secs).expect("valid test timestamp"),
        values: values.iter().copied().collect::<BTreeMap<_, _>>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_seeded_rng_reproducible() {
        let mut a = seeded_rng(7);
        let mut b = seeded_rng(7);
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_reading_fixture() {
        let r = test_reading("SEN-X", "X", 100, &[(MetricChannel::Temperature, 150.0)]);
        assert_eq!(r.value(MetricChannel::Temperature), Some(150.0));
        assert_eq!(r.timestamp.unix_timestamp(), 100);
    }
}
