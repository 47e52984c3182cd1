//! Fixed asset catalog for the demo field.
//!
//! Twelve assets spread over the Permian-basin demo region, seeded once at
//! startup and mutated only by the tick pipeline afterwards. Also owns the
//! per-type channel sets and nominal value ranges the generator samples in.

use crate::models::{Asset, AssetStatus, AssetType, GeoPoint, MaintenanceInfo, MetricChannel};
use time::OffsetDateTime;

/// Nominal range of one metric channel for one asset type:
/// values live in `[min, max]`, one tick moves them by at most `max_delta`.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRange {
    pub min: f64,
    pub max: f64,
    pub max_delta: f64,
}

/// Channels exposed by each asset type
pub fn channels_for(asset_type: AssetType) -> &'static [MetricChannel] {
    use MetricChannel::*;
    match asset_type {
        AssetType::ProductionWell => &[Temperature, Pressure, FlowRate],
        AssetType::DrillingRig => &[Temperature, Pressure, Vibration],
        AssetType::PumpJack => &[Temperature, FlowRate, Vibration],
        AssetType::Compressor => &[Temperature, Pressure, Vibration],
        AssetType::Separator => &[Temperature, Pressure, FlowRate],
        AssetType::TankBattery => &[Temperature, Pressure],
        AssetType::ServiceTruck => &[Temperature, Vibration],
    }
}

/// Nominal range per (type, channel). Combinations without a tuned entry
/// fall back to a generic per-channel default instead of failing the tick.
pub fn nominal_range(asset_type: AssetType, channel: MetricChannel) -> ChannelRange {
    use AssetType::*;
    match channel {
        MetricChannel::Temperature => match asset_type {
            ProductionWell => ChannelRange { min: 100.0, max: 220.0, max_delta: 5.0 },
            DrillingRig => ChannelRange { min: 80.0, max: 200.0, max_delta: 6.0 },
            PumpJack => ChannelRange { min: 70.0, max: 180.0, max_delta: 5.0 },
            Compressor => ChannelRange { min: 90.0, max: 230.0, max_delta: 6.0 },
            Separator => ChannelRange { min: 80.0, max: 190.0, max_delta: 5.0 },
            TankBattery => ChannelRange { min: 60.0, max: 140.0, max_delta: 4.0 },
            ServiceTruck => ChannelRange { min: 40.0, max: 130.0, max_delta: 5.0 },
        },
        MetricChannel::Pressure => match asset_type {
            ProductionWell => ChannelRange { min: 1500.0, max: 3500.0, max_delta: 60.0 },
            DrillingRig => ChannelRange { min: 1000.0, max: 3000.0, max_delta: 80.0 },
            Compressor => ChannelRange { min: 400.0, max: 1300.0, max_delta: 40.0 },
            Separator => ChannelRange { min: 200.0, max: 900.0, max_delta: 30.0 },
            TankBattery => ChannelRange { min: 50.0, max: 300.0, max_delta: 15.0 },
            _ => ChannelRange { min: 500.0, max: 3000.0, max_delta: 50.0 },
        },
        MetricChannel::FlowRate => match asset_type {
            ProductionWell => ChannelRange { min: 40.0, max: 320.0, max_delta: 12.0 },
            PumpJack => ChannelRange { min: 30.0, max: 250.0, max_delta: 10.0 },
            Separator => ChannelRange { min: 60.0, max: 400.0, max_delta: 15.0 },
            _ => ChannelRange { min: 20.0, max: 300.0, max_delta: 10.0 },
        },
        MetricChannel::Vibration => match asset_type {
            DrillingRig => ChannelRange { min: 0.3, max: 6.0, max_delta: 0.35 },
            PumpJack => ChannelRange { min: 0.2, max: 5.0, max_delta: 0.3 },
            Compressor => ChannelRange { min: 0.5, max: 7.0, max_delta: 0.4 },
            ServiceTruck => ChannelRange { min: 0.5, max: 8.0, max_delta: 0.6 },
            _ => ChannelRange { min: 0.1, max: 6.0, max_delta: 0.4 },
        },
    }
}

struct AssetSpec {
    id: &'static str,
    name: &'static str,
    asset_type: AssetType,
    manufacturer: &'static str,
    model_number: &'static str,
    serial_number: &'static str,
    lat: f64,
    lon: f64,
    team: &'static str,
}

const ASSET_SPECS: &[AssetSpec] = &[
    AssetSpec { id: "WELL-001", name: "Production Well Alpha", asset_type: AssetType::ProductionWell, manufacturer: "Halliburton", model_number: "HWS-2200", serial_number: "SN-48210331", lat: 31.99, lon: -102.08, team: "Field Ops A" },
    AssetSpec { id: "WELL-002", name: "Production Well Bravo", asset_type: AssetType::ProductionWell, manufacturer: "Schlumberger", model_number: "REDA-9000", serial_number: "SN-51873902", lat: 32.21, lon: -101.94, team: "Field Ops A" },
    AssetSpec { id: "WELL-003", name: "Production Well Charlie", asset_type: AssetType::ProductionWell, manufacturer: "Baker Hughes", model_number: "CENT-6100", serial_number: "SN-60924815", lat: 31.78, lon: -102.43, team: "Field Ops B" },
    AssetSpec { id: "RIG-ALPHA", name: "Drilling Rig Alpha", asset_type: AssetType::DrillingRig, manufacturer: "Nabors", model_number: "PACE-X800", serial_number: "SN-33018274", lat: 32.35, lon: -102.55, team: "Drilling Crew 12" },
    AssetSpec { id: "RIG-BRAVO", name: "Drilling Rig Bravo", asset_type: AssetType::DrillingRig, manufacturer: "Helmerich & Payne", model_number: "FlexRig-5", serial_number: "SN-77120943", lat: 31.52, lon: -101.73, team: "Drilling Crew 7" },
    AssetSpec { id: "PUMP-001", name: "Pump Jack 001", asset_type: AssetType::PumpJack, manufacturer: "Lufkin", model_number: "C-912", serial_number: "SN-18293047", lat: 32.05, lon: -102.31, team: "Field Ops B" },
    AssetSpec { id: "PUMP-002", name: "Pump Jack 002", asset_type: AssetType::PumpJack, manufacturer: "Weatherford", model_number: "E-640", serial_number: "SN-29104738", lat: 32.48, lon: -101.88, team: "Field Ops A" },
    AssetSpec { id: "COMP-001", name: "Gas Compressor 001", asset_type: AssetType::Compressor, manufacturer: "Ariel", model_number: "JGK-4", serial_number: "SN-84950261", lat: 31.87, lon: -101.52, team: "Compression Team" },
    AssetSpec { id: "SEP-001", name: "Three-Phase Separator 001", asset_type: AssetType::Separator, manufacturer: "Exterran", model_number: "HP-3600", serial_number: "SN-90283746", lat: 32.12, lon: -101.67, team: "Field Ops B" },
    AssetSpec { id: "TANK-001", name: "Tank Battery North", asset_type: AssetType::TankBattery, manufacturer: "Permian Tank", model_number: "PT-500BBL", serial_number: "SN-40561928", lat: 32.61, lon: -102.18, team: "Field Ops A" },
    AssetSpec { id: "TRUCK-001", name: "Field Service Truck 001", asset_type: AssetType::ServiceTruck, manufacturer: "Ford", model_number: "F-350-Tech", serial_number: "SN-11209384", lat: 31.95, lon: -102.11, team: "Field Service Alpha" },
    AssetSpec { id: "TRUCK-002", name: "Field Service Truck 002", asset_type: AssetType::ServiceTruck, manufacturer: "Ford", model_number: "F-350-Tech", serial_number: "SN-11209385", lat: 32.28, lon: -102.02, team: "Field Service Alpha" },
];

/// The full catalog in fixed declaration order. Called once at startup;
/// the store's documents are the source of truth afterwards.
pub fn seed_assets(now: OffsetDateTime) -> Vec<Asset> {
    ASSET_SPECS
        .iter()
        .map(|spec| Asset {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
            asset_type: spec.asset_type,
            manufacturer: spec.manufacturer.to_string(),
            model_number: spec.model_number.to_string(),
            serial_number: spec.serial_number.to_string(),
            status: AssetStatus::Active,
            position: GeoPoint { lat: spec.lat, lon: spec.lon },
            sensor_id: format!("SEN-{}", spec.id),
            maintenance: MaintenanceInfo {
                install_date: "2023-04-18".to_string(),
                last_service_date: "2026-06-12".to_string(),
                next_service_due: "2026-09-12".to_string(),
                maintenance_team: spec.team.to_string(),
            },
            last_update: now,
        })
        .collect()
}
