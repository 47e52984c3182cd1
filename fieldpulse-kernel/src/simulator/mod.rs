//! Field telemetry simulator: the single tick loop of the demo.
//!
//! One timer drives the whole cycle: every tick produces a reading per
//! sensor, evaluates alert thresholds, moves mobile assets and refreshes
//! the dashboard KPIs. Ticks never overlap; a slow store operation is
//! bounded by a timeout and the remaining work for that asset is skipped,
//! never retried mid-tick. Every store write is traced through the
//! command monitor under the `simulator` context.

pub mod alerts;
pub mod movement;
pub mod registry;
pub mod telemetry;

use crate::config::KernelConfig;
use crate::models::{Asset, AssetStatus};
use crate::monitor::CommandMonitor;
use crate::store::{SharedStore, StoreError};
use alerts::AlertEvaluator;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::future::Future;
use std::time::Duration;
use telemetry::TelemetryGenerator;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const CONTEXT: &str = "simulator";

/// Borne chaque opération store depuis la boucle de tick : un store lent
/// ne doit pas bloquer les ticks suivants indéfiniment.
async fn with_timeout<T>(
    timeout_ms: u64,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

pub struct Simulator {
    store: SharedStore,
    monitor: CommandMonitor,
    cfg: KernelConfig,
    generator: TelemetryGenerator,
    evaluator: AlertEvaluator,
    rng: ChaCha8Rng,
}

impl Simulator {
    pub fn new(store: SharedStore, monitor: CommandMonitor, cfg: KernelConfig) -> Self {
        let rng = match cfg.sim_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let evaluator = AlertEvaluator::new(cfg.alert_bucket_secs);
        Self {
            store,
            monitor,
            cfg,
            generator: TelemetryGenerator::new(),
            evaluator,
            rng,
        }
    }

    /// Enregistrement initial du catalogue dans le store. Une erreur ici est
    /// fatale pour le process : on n'atteint pas la boucle de tick sans
    /// store amorcé.
    pub async fn seed(&self) -> Result<usize, StoreError> {
        let now = OffsetDateTime::now_utc();
        let assets = registry::seed_assets(now);
        let count = assets.len();
        for asset in assets {
            self.store.geo_add(&asset.id, asset.position).await?;
            self.monitor.record(CONTEXT, "GEOADD", "assets:locations");
            let asset_id = asset.id.clone();
            self.store.upsert_asset(asset).await?;
            self.monitor.record(CONTEXT, "JSON.SET", &format!("asset:{asset_id}"));
        }
        info!("seeded {count} field assets");
        Ok(count)
    }

    /// Un tick complet : tous les actifs, tous les capteurs, en lock-step.
    /// Les échecs par actif sont isolés et loggés, jamais propagés au reste
    /// du tick.
    pub async fn tick(&mut self) {
        let assets = match self.store.list_assets().await {
            Ok(assets) => assets,
            Err(e) => {
                warn!("tick aborted, cannot list assets: {e}");
                return;
            }
        };

        for asset in &assets {
            if let Err(e) = self.tick_asset(asset).await {
                warn!("tick skipped for {}: {e}", asset.id);
            }
        }

        self.maybe_system_alert().await;

        if let Err(e) = self.refresh_kpis().await {
            warn!("kpi refresh failed: {e}");
        }
        debug!("tick complete ({} assets)", assets.len());
    }

    async fn tick_asset(&mut self, asset: &Asset) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc();
        let timeout_ms = self.cfg.store_op_timeout_ms;
        let reading = self.generator.generate(asset, now, &mut self.rng);

        // log ordonné du capteur, puis snapshot dernière valeur
        with_timeout(timeout_ms, self.store.stream_add(reading.clone())).await?;
        self.monitor.record(CONTEXT, "XADD", &format!("sensors:{}", reading.sensor_id));
        with_timeout(timeout_ms, self.store.latest_set(reading.clone())).await?;
        self.monitor.record(CONTEXT, "HSET", &format!("sensor:latest:{}", reading.sensor_id));

        // seuils : zéro ou une alerte par canal en dépassement
        for alert in self.evaluator.evaluate(&reading, asset) {
            info!(
                "alert: {} [{}] at {}",
                alert.message,
                alert.severity.as_str(),
                alert.location
            );
            with_timeout(timeout_ms, self.store.alerts_push(alert)).await?;
            self.monitor.record(CONTEXT, "ZADD", "alerts:active");
            self.monitor.record(CONTEXT, "INCR", "alerts:count");
        }

        // mutation du document : position pour les mobiles, statut occasionnel
        let position = asset.asset_type.is_mobile().then(|| {
            movement::advance(
                asset.position,
                &self.cfg.region,
                self.cfg.movement_max_step_deg,
                &mut self.rng,
            )
        });
        let status = self
            .rng
            .gen_bool(self.cfg.status_churn_probability)
            .then(|| self.sample_status());

        if let Some(position) = position {
            with_timeout(timeout_ms, self.store.geo_add(&asset.id, position)).await?;
            self.monitor.record(CONTEXT, "GEOADD", "assets:locations");
        }
        with_timeout(
            timeout_ms,
            self.store.update_asset(&asset.id, |doc| {
                if let Some(position) = position {
                    doc.position = position;
                }
                if let Some(status) = status {
                    doc.status = status;
                }
                doc.last_update = now;
            }),
        )
        .await?;
        self.monitor.record(CONTEXT, "JSON.SET", &format!("asset:{}", asset.id));

        Ok(())
    }

    fn sample_status(&mut self) -> AssetStatus {
        // pondéré vers active : la démo doit rester vivante
        match self.rng.gen_range(0..10) {
            0 => AssetStatus::Maintenance,
            1 => AssetStatus::Offline,
            _ => AssetStatus::Active,
        }
    }

    async fn maybe_system_alert(&mut self) {
        if !self.rng.gen_bool(self.cfg.system_alert_probability) {
            return;
        }
        let alert = self.evaluator.system_alert(OffsetDateTime::now_utc(), &mut self.rng);
        info!("system alert: {} at {}", alert.message, alert.location);
        match with_timeout(self.cfg.store_op_timeout_ms, self.store.alerts_push(alert)).await {
            Ok(()) => {
                self.monitor.record(CONTEXT, "ZADD", "alerts:active");
                self.monitor.record(CONTEXT, "INCR", "alerts:count");
            }
            Err(e) => warn!("system alert dropped: {e}"),
        }
    }

    /// KPIs dashboard recalculés sur les snapshots courants
    async fn refresh_kpis(&mut self) -> Result<(), StoreError> {
        use crate::models::MetricChannel;

        let readings = self.store.latest_all().await?;
        let avg = |channel: MetricChannel| {
            let values: Vec<f64> = readings.iter().filter_map(|r| r.value(channel)).collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        if let Some(avg_temp) = avg(MetricChannel::Temperature) {
            self.store.metric_set("avg_temperature", (avg_temp * 10.0).round() / 10.0).await?;
            self.monitor.record(CONTEXT, "SET", "metrics:avg_temperature");
        }
        if let Some(avg_pressure) = avg(MetricChannel::Pressure) {
            self.store.metric_set("avg_pressure", (avg_pressure * 10.0).round() / 10.0).await?;
            self.monitor.record(CONTEXT, "SET", "metrics:avg_pressure");
        }

        let production = self.rng.gen_range(8500..9500) as f64;
        self.store.metric_set("total_production", production).await?;
        self.monitor.record(CONTEXT, "SET", "metrics:total_production");
        self.store
            .metric_set("system_uptime", OffsetDateTime::now_utc().unix_timestamp() as f64)
            .await?;
        self.monitor.record(CONTEXT, "SET", "system:uptime");

        Ok(())
    }

    /// Démarre la boucle de tick en tâche de fond
    pub fn spawn(mut self) -> JoinHandle<()> {
        info!(
            "simulator started (tick every {}s)",
            self.cfg.tick_interval_secs
        );
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.cfg.tick_interval_secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricChannel;
    use crate::store::FieldStore;

    fn simulator(seed: u64) -> Simulator {
        let cfg = KernelConfig {
            sim_seed: Some(seed),
            system_alert_probability: 0.0,
            status_churn_probability: 0.0,
            ..KernelConfig::default()
        };
        let store = FieldStore::new(cfg.stream_maxlen, cfg.alert_cap);
        let monitor = CommandMonitor::new(cfg.command_log_cap);
        Simulator::new(store, monitor, cfg)
    }

    #[tokio::test]
    async fn test_seed_registers_catalog() {
        let sim = simulator(1);
        let count = sim.seed().await.unwrap();
        assert_eq!(count, 12);
        assert_eq!(sim.store.geo_count().await.unwrap(), 12);
        assert!(sim.store.get_asset("WELL-001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tick_populates_streams_and_snapshots() {
        let mut sim = simulator(2);
        sim.seed().await.unwrap();
        sim.tick().await;

        let latest = sim.store.latest_get("SEN-WELL-001").await.unwrap().unwrap();
        assert!(latest.value(MetricChannel::Temperature).is_some());
        let entries = sim.store.stream_revrange("SEN-WELL-001", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(sim.store.metric_get("avg_temperature").await.unwrap().is_some());
        assert!(sim.monitor.stats(CONTEXT).write_count > 0);
    }

    #[tokio::test]
    async fn test_latest_reflects_newest_stream_entry() {
        let mut sim = simulator(3);
        sim.seed().await.unwrap();
        for _ in 0..5 {
            sim.tick().await;
        }
        let latest = sim.store.latest_get("SEN-PUMP-001").await.unwrap().unwrap();
        let newest = &sim.store.stream_revrange("SEN-PUMP-001", 1).await.unwrap()[0];
        assert_eq!(newest.reading.values, latest.values);
    }

    #[tokio::test]
    async fn test_fixed_sites_never_move() {
        let mut sim = simulator(4);
        sim.seed().await.unwrap();
        let before = sim.store.geo_pos("WELL-001").await.unwrap().unwrap();
        for _ in 0..10 {
            sim.tick().await;
        }
        let after = sim.store.geo_pos("WELL-001").await.unwrap().unwrap();
        assert_eq!(before, after);
    }
}
