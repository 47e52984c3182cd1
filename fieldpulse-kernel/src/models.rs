/**
 * MODÈLES FIELDPULSE - Vocabulaire de types du domaine terrain
 *
 * RÔLE : Actifs de terrain (puits, pompes, camions...), lectures capteurs,
 * alertes à seuils. Structures basées sur les documents JSON du store.
 *
 * ARCHITECTURE : serde partout, enums sérialisés en snake_case pour l'API.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Types d'actifs simulés. Les sites fixes ne bougent jamais ;
/// seuls les camions de service sont mobiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    ProductionWell,
    DrillingRig,
    PumpJack,
    Compressor,
    Separator,
    TankBattery,
    ServiceTruck,
}

impl AssetType {
    pub fn is_mobile(&self) -> bool {
        matches!(self, AssetType::ServiceTruck)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::ProductionWell => "production_well",
            AssetType::DrillingRig => "drilling_rig",
            AssetType::PumpJack => "pump_jack",
            AssetType::Compressor => "compressor",
            AssetType::Separator => "separator",
            AssetType::TankBattery => "tank_battery",
            AssetType::ServiceTruck => "service_truck",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Active,
    Maintenance,
    Offline,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Active => "active",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Offline => "offline",
        }
    }
}

/// Position géographique (degrés décimaux)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Métadonnées de maintenance portées par le document actif
/// (dates au format YYYY-MM-DD comme dans les fiches terrain)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceInfo {
    pub install_date: String,
    pub last_service_date: String,
    pub next_service_due: String,
    pub maintenance_team: String,
}

/// Document actif complet : créé une fois au démarrage du simulateur,
/// muté à chaque tick (statut, position pour les mobiles, last_update).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub manufacturer: String,
    pub model_number: String,
    pub serial_number: String,
    pub status: AssetStatus,
    pub position: GeoPoint,
    pub sensor_id: String,
    pub maintenance: MaintenanceInfo,
    #[serde(with = "time::serde::rfc3339")]
    pub last_update: OffsetDateTime,
}

/// Canaux de mesure. Chaque type d'actif n'en expose qu'un sous-ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricChannel {
    /// °F
    Temperature,
    /// psi
    Pressure,
    /// bbl/jour
    FlowRate,
    /// mm/s
    Vibration,
}

impl MetricChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricChannel::Temperature => "temperature",
            MetricChannel::Pressure => "pressure",
            MetricChannel::FlowRate => "flow_rate",
            MetricChannel::Vibration => "vibration",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricChannel::Temperature => "°F",
            MetricChannel::Pressure => "psi",
            MetricChannel::FlowRate => "bbl/d",
            MetricChannel::Vibration => "mm/s",
        }
    }
}

/// Lecture capteur : immuable une fois produite. Ajoutée au log ordonné
/// du capteur, et recopiée dans le snapshot "dernière valeur".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub asset_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub values: BTreeMap<MetricChannel, f64>,
}

impl SensorReading {
    pub fn value(&self, channel: MetricChannel) -> Option<f64> {
        self.values.get(&channel).copied()
    }
}

/// Sévérité ordonnée : l'ordre des variants définit l'ordre de tri.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    TemperatureHigh,
    PressureHigh,
    VibrationHigh,
    FlowLow,
    MaintenanceDue,
    CommunicationIssue,
    ProductionAnomaly,
    WeatherWarning,
}

impl AlertCategory {
    /// Code stable utilisé dans l'identifiant déterministe des alertes
    pub fn code(&self) -> &'static str {
        match self {
            AlertCategory::TemperatureHigh => "TEMP_HIGH",
            AlertCategory::PressureHigh => "PRESS_HIGH",
            AlertCategory::VibrationHigh => "VIB_HIGH",
            AlertCategory::FlowLow => "FLOW_LOW",
            AlertCategory::MaintenanceDue => "SYS_MAINTENANCE_DUE",
            AlertCategory::CommunicationIssue => "SYS_COMMUNICATION_ISSUE",
            AlertCategory::ProductionAnomaly => "SYS_PRODUCTION_ANOMALY",
            AlertCategory::WeatherWarning => "SYS_WEATHER_WARNING",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::TemperatureHigh => "temperature_high",
            AlertCategory::PressureHigh => "pressure_high",
            AlertCategory::VibrationHigh => "vibration_high",
            AlertCategory::FlowLow => "flow_low",
            AlertCategory::MaintenanceDue => "maintenance_due",
            AlertCategory::CommunicationIssue => "communication_issue",
            AlertCategory::ProductionAnomaly => "production_anomaly",
            AlertCategory::WeatherWarning => "weather_warning",
        }
    }
}

/// Alerte dérivée d'une lecture qui franchit un seuil. L'identifiant est
/// déterministe (catégorie + capteur + fenêtre de temps) : ré-émettre la
/// même alerte dans la même fenêtre écrase l'entrée au lieu de la dupliquer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub category: AlertCategory,
    pub message: String,
    pub details: String,
    pub severity: Severity,
    /// Identifiant de l'actif source (champ `location` côté API)
    pub location: String,
    pub sensor_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_mobile_types() {
        assert!(AssetType::ServiceTruck.is_mobile());
        assert!(!AssetType::ProductionWell.is_mobile());
        assert!(!AssetType::TankBattery.is_mobile());
    }

    #[test]
    fn test_channel_serialized_as_snake_case() {
        let json = serde_json::to_string(&MetricChannel::FlowRate).unwrap();
        assert_eq!(json, "\"flow_rate\"");
    }
}
