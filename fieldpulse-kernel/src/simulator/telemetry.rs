//! Telemetry generation: bounded random walk per sensor channel.
//!
//! Values move by at most `max_delta` per tick and never leave the
//! channel's `[min, max]` range, so successive readings look continuous
//! instead of independently resampled noise. The random source is
//! injected, which keeps the walk reproducible under a fixed seed.

use crate::models::{Asset, MetricChannel, SensorReading};
use crate::simulator::registry::{channels_for, nominal_range, ChannelRange};
use rand::Rng;
use std::collections::BTreeMap;
use std::collections::HashMap;
use time::OffsetDateTime;

/// One step of the walk. Pure: same previous value + same rng state
/// give the same next value.
pub fn next_value(prev: Option<f64>, range: &ChannelRange, rng: &mut impl Rng) -> f64 {
    match prev {
        Some(prev) => {
            // delta arrondi à 2 décimales pour que |v' - v| reste <= max_delta
            // après arrondi d'affichage
            let delta = round2(rng.gen_range(-range.max_delta..=range.max_delta));
            (prev + delta).clamp(range.min, range.max)
        }
        None => round2(rng.gen_range(range.min..=range.max)),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Produces one reading per asset sensor per tick, remembering the previous
/// value of every (sensor, channel) pair for walk continuity.
pub struct TelemetryGenerator {
    previous: HashMap<(String, MetricChannel), f64>,
}

impl TelemetryGenerator {
    pub fn new() -> Self {
        Self {
            previous: HashMap::new(),
        }
    }

    pub fn generate(
        &mut self,
        asset: &Asset,
        now: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> SensorReading {
        let mut values = BTreeMap::new();
        for &channel in channels_for(asset.asset_type) {
            let range = nominal_range(asset.asset_type, channel);
            let key = (asset.sensor_id.clone(), channel);
            let value = next_value(self.previous.get(&key).copied(), &range, rng);
            self.previous.insert(key, value);
            values.insert(channel, value);
        }
        SensorReading {
            sensor_id: asset.sensor_id.clone(),
            asset_id: asset.id.clone(),
            timestamp: now,
            values,
        }
    }
}

impl Default for TelemetryGenerator {
    fn default() -> Self {
        Self::new()
    }
}
