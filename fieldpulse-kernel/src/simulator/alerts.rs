//! Threshold evaluation: turns readings into alerts.
//!
//! One alert at most per triggering channel per reading; several channels
//! may trigger independently on the same reading. Alert ids are derived
//! from (category code, sensor, time bucket) so a sensor stuck at an
//! extreme value upserts the same alert for a whole bucket instead of
//! flooding the collection every tick.

use crate::models::{Alert, AlertCategory, Asset, AssetType, MetricChannel, SensorReading, Severity};
use rand::Rng;
use time::OffsetDateTime;

/// High-side boundaries, non-overlapping: critical > high > warning.
/// A value must exceed a boundary strictly to reach its severity.
#[derive(Debug, Clone, Copy)]
pub struct HighThresholds {
    pub warning: f64,
    pub high: f64,
    pub critical: f64,
}

/// Low-side boundaries for flow: below warning is a warning,
/// below high is high. No critical tier for low flow.
#[derive(Debug, Clone, Copy)]
pub struct LowThresholds {
    pub warning: f64,
    pub high: f64,
}

/// Table des seuils par (canal, type d'actif), défaut générique par canal
/// quand le couple n'est pas réglé (jamais d'échec de tick).
pub fn high_thresholds(channel: MetricChannel, asset_type: AssetType) -> Option<HighThresholds> {
    use AssetType::*;
    match channel {
        MetricChannel::Temperature => Some(match asset_type {
            ProductionWell => HighThresholds { warning: 180.0, high: 190.0, critical: 200.0 },
            DrillingRig => HighThresholds { warning: 170.0, high: 185.0, critical: 195.0 },
            Compressor => HighThresholds { warning: 195.0, high: 210.0, critical: 220.0 },
            _ => HighThresholds { warning: 170.0, high: 185.0, critical: 200.0 },
        }),
        MetricChannel::Pressure => Some(match asset_type {
            ProductionWell => HighThresholds { warning: 2800.0, high: 3000.0, critical: 3200.0 },
            DrillingRig => HighThresholds { warning: 2400.0, high: 2700.0, critical: 2900.0 },
            Compressor => HighThresholds { warning: 1000.0, high: 1150.0, critical: 1250.0 },
            Separator => HighThresholds { warning: 700.0, high: 800.0, critical: 850.0 },
            TankBattery => HighThresholds { warning: 220.0, high: 260.0, critical: 290.0 },
            _ => HighThresholds { warning: 2800.0, high: 3000.0, critical: 3200.0 },
        }),
        MetricChannel::Vibration => Some(match asset_type {
            DrillingRig => HighThresholds { warning: 3.5, high: 4.5, critical: 5.5 },
            Compressor => HighThresholds { warning: 4.0, high: 5.0, critical: 6.0 },
            PumpJack => HighThresholds { warning: 2.5, high: 3.5, critical: 4.5 },
            ServiceTruck => HighThresholds { warning: 5.0, high: 6.0, critical: 7.0 },
            _ => HighThresholds { warning: 2.5, high: 3.0, critical: 4.0 },
        }),
        MetricChannel::FlowRate => None, // low-side rule only
    }
}

pub fn flow_low_thresholds(asset_type: AssetType) -> LowThresholds {
    use AssetType::*;
    match asset_type {
        ProductionWell => LowThresholds { warning: 60.0, high: 45.0 },
        PumpJack => LowThresholds { warning: 50.0, high: 38.0 },
        Separator => LowThresholds { warning: 90.0, high: 70.0 },
        _ => LowThresholds { warning: 15.0, high: 10.0 },
    }
}

fn grade_high(value: f64, t: &HighThresholds) -> Option<Severity> {
    if value > t.critical {
        Some(Severity::Critical)
    } else if value > t.high {
        Some(Severity::High)
    } else if value > t.warning {
        Some(Severity::Warning)
    } else {
        None
    }
}

fn grade_low(value: f64, t: &LowThresholds) -> Option<Severity> {
    if value < t.high {
        Some(Severity::High)
    } else if value < t.warning {
        Some(Severity::Warning)
    } else {
        None
    }
}

pub struct AlertEvaluator {
    bucket_secs: i64,
}

impl AlertEvaluator {
    pub fn new(bucket_secs: i64) -> Self {
        assert!(bucket_secs > 0);
        Self { bucket_secs }
    }

    /// Début de la fenêtre de déduplication contenant `ts`
    fn bucket_start(&self, ts: OffsetDateTime) -> i64 {
        ts.unix_timestamp().div_euclid(self.bucket_secs) * self.bucket_secs
    }

    fn alert_id(&self, category: AlertCategory, sensor_id: &str, ts: OffsetDateTime) -> String {
        format!("{}_{}_{}", category.code(), sensor_id, self.bucket_start(ts))
    }

    /// Zéro ou une alerte par canal en dépassement
    pub fn evaluate(&self, reading: &SensorReading, asset: &Asset) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for (&channel, &value) in &reading.values {
            let graded = match channel {
                MetricChannel::FlowRate => {
                    grade_low(value, &flow_low_thresholds(asset.asset_type))
                        .map(|severity| (AlertCategory::FlowLow, severity))
                }
                _ => high_thresholds(channel, asset.asset_type)
                    .and_then(|t| grade_high(value, &t))
                    .map(|severity| (category_for(channel), severity)),
            };

            if let Some((category, severity)) = graded {
                alerts.push(Alert {
                    id: self.alert_id(category, &reading.sensor_id, reading.timestamp),
                    category,
                    message: message_for(category).to_string(),
                    details: details_for(channel, value),
                    severity,
                    location: asset.id.clone(),
                    sensor_id: reading.sensor_id.clone(),
                    timestamp: reading.timestamp,
                });
            }
        }

        alerts
    }

    /// Alerte système occasionnelle (maintenance, météo...), émise par le
    /// simulateur indépendamment des lectures capteurs
    pub fn system_alert(&self, now: OffsetDateTime, rng: &mut impl Rng) -> Alert {
        const KINDS: &[(AlertCategory, &str, &str, Severity)] = &[
            (AlertCategory::MaintenanceDue, "Scheduled Maintenance Due", "Preventive maintenance window approaching", Severity::Warning),
            (AlertCategory::CommunicationIssue, "Communication Timeout", "Intermittent connection to remote sensors", Severity::Warning),
            (AlertCategory::ProductionAnomaly, "Production Rate Anomaly", "Output variance detected across multiple wells", Severity::High),
            (AlertCategory::WeatherWarning, "Weather Advisory", "High winds forecasted - secure equipment", Severity::Warning),
        ];
        const LOCATIONS: &[&str] = &["FIELD-NORTH", "FIELD-SOUTH", "FIELD-CENTRAL", "OPERATIONS-HQ"];

        let (category, message, details, severity) = KINDS[rng.gen_range(0..KINDS.len())];
        let location = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
        Alert {
            id: self.alert_id(category, "SYSTEM", now),
            category,
            message: message.to_string(),
            details: details.to_string(),
            severity,
            location: location.to_string(),
            sensor_id: "SYSTEM".to_string(),
            timestamp: now,
        }
    }
}

fn category_for(channel: MetricChannel) -> AlertCategory {
    match channel {
        MetricChannel::Temperature => AlertCategory::TemperatureHigh,
        MetricChannel::Pressure => AlertCategory::PressureHigh,
        MetricChannel::Vibration => AlertCategory::VibrationHigh,
        MetricChannel::FlowRate => AlertCategory::FlowLow,
    }
}

fn message_for(category: AlertCategory) -> &'static str {
    match category {
        AlertCategory::TemperatureHigh => "High Temperature Detected",
        AlertCategory::PressureHigh => "Pressure Threshold Exceeded",
        AlertCategory::VibrationHigh => "Excessive Vibration Detected",
        AlertCategory::FlowLow => "Low Flow Rate Alert",
        _ => "System Alert",
    }
}

fn details_for(channel: MetricChannel, value: f64) -> String {
    match channel {
        MetricChannel::Temperature => format!("{value:.1}°F exceeds normal operating range"),
        MetricChannel::Pressure => format!("{value:.0} psi above safe operating limits"),
        MetricChannel::Vibration => format!("{value:.1} mm/s indicates potential equipment issue"),
        MetricChannel::FlowRate => format!("{value:.1} bbl/d below expected production levels"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetStatus, GeoPoint, MaintenanceInfo};
    use std::collections::BTreeMap;

    fn well() -> Asset {
        Asset {
            id: "WELL-001".to_string(),
            name: "Production Well Alpha".to_string(),
            asset_type: AssetType::ProductionWell,
            manufacturer: "Halliburton".to_string(),
            model_number: "HWS-2200".to_string(),
            serial_number: "SN-1".to_string(),
            status: AssetStatus::Active,
            position: GeoPoint { lat: 31.99, lon: -102.08 },
            sensor_id: "SEN-WELL-001".to_string(),
            maintenance: MaintenanceInfo {
                install_date: "2023-04-18".to_string(),
                last_service_date: "2026-06-12".to_string(),
                next_service_due: "2026-09-12".to_string(),
                maintenance_team: "Field Ops A".to_string(),
            },
            last_update: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn reading(ts_secs: i64, values: &[(MetricChannel, f64)]) -> SensorReading {
        SensorReading {
            sensor_id: "SEN-WELL-001".to_string(),
            asset_id: "WELL-001".to_string(),
            timestamp: OffsetDateTime::from_unix_timestamp(ts_secs).unwrap(),
            values: values.iter().copied().collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_normal_reading_no_alert() {
        let eval = AlertEvaluator::new(10);
        let r = reading(1000, &[
            (MetricChannel::Temperature, 150.0),
            (MetricChannel::Pressure, 2500.0),
            (MetricChannel::FlowRate, 180.0),
        ]);
        assert!(eval.evaluate(&r, &well()).is_empty());
    }

    #[test]
    fn test_well_critical_temperature_scenario() {
        // 205°F sur WELL-001 : exactement une alerte temperature_high critique
        let eval = AlertEvaluator::new(10);
        let r = reading(1000, &[(MetricChannel::Temperature, 205.0)]);
        let alerts = eval.evaluate(&r, &well());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::TemperatureHigh);
        assert_eq!(alerts[0].severity, Severity::Critical);

        // id stable dans la même fenêtre
        let again = eval.evaluate(&reading(1009, &[(MetricChannel::Temperature, 207.0)]), &well());
        assert_eq!(alerts[0].id, again[0].id);
        // fenêtre suivante : id différent
        let later = eval.evaluate(&reading(1010, &[(MetricChannel::Temperature, 207.0)]), &well());
        assert_ne!(alerts[0].id, later[0].id);
    }

    #[test]
    fn test_severity_grading_tiers() {
        let eval = AlertEvaluator::new(10);
        let sev = |temp: f64| {
            eval.evaluate(&reading(0, &[(MetricChannel::Temperature, temp)]), &well())
                .first()
                .map(|a| a.severity)
        };
        assert_eq!(sev(175.0), None);
        assert_eq!(sev(185.0), Some(Severity::Warning));
        assert_eq!(sev(195.0), Some(Severity::High));
        assert_eq!(sev(205.0), Some(Severity::Critical));
        // borne exacte : il faut dépasser strictement
        assert_eq!(sev(200.0), Some(Severity::High));
    }

    #[test]
    fn test_multiple_channels_alert_independently() {
        let eval = AlertEvaluator::new(10);
        let r = reading(1000, &[
            (MetricChannel::Temperature, 205.0),
            (MetricChannel::Pressure, 3300.0),
            (MetricChannel::FlowRate, 40.0),
        ]);
        let mut categories: Vec<_> = eval.evaluate(&r, &well()).iter().map(|a| a.category).collect();
        categories.sort_by_key(|c| c.code());
        assert_eq!(categories.len(), 3);
        assert!(categories.contains(&AlertCategory::TemperatureHigh));
        assert!(categories.contains(&AlertCategory::PressureHigh));
        assert!(categories.contains(&AlertCategory::FlowLow));
    }

    #[test]
    fn test_flow_low_grading() {
        let eval = AlertEvaluator::new(10);
        let sev = |flow: f64| {
            eval.evaluate(&reading(0, &[(MetricChannel::FlowRate, flow)]), &well())
                .first()
                .map(|a| a.severity)
        };
        assert_eq!(sev(100.0), None);
        assert_eq!(sev(55.0), Some(Severity::Warning));
        assert_eq!(sev(40.0), Some(Severity::High));
    }

    #[test]
    fn test_alert_id_format() {
        let eval = AlertEvaluator::new(10);
        let alerts = eval.evaluate(&reading(1234, &[(MetricChannel::Temperature, 205.0)]), &well());
        // 1234 -> fenêtre démarrant à 1230
        assert_eq!(alerts[0].id, "TEMP_HIGH_SEN-WELL-001_1230");
    }

    #[test]
    fn test_system_alert_id_bucketed() {
        use rand::SeedableRng;
        let eval = AlertEvaluator::new(10);
        let now = OffsetDateTime::from_unix_timestamp(5000).unwrap();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(4);
        let alert = eval.system_alert(now, &mut rng);
        assert!(alert.id.starts_with("SYS_"));
        assert!(alert.id.ends_with("_5000"));
        assert_eq!(alert.sensor_id, "SYSTEM");
    }
}
