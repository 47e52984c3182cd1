/*!
Harness de test pour le pipeline de simulation Fieldpulse

Facilite l'écriture de tests du pipeline avec:
- Setup automatique store + moniteur + simulateur (graine fixe)
- Ticks à la demande, sans timer
- Assertions sur les invariants publiés (caps, zone, fraîcheur)
*/

use anyhow::Result;
use fieldpulse_kernel::config::KernelConfig;
use fieldpulse_kernel::models::{Alert, Asset, SensorReading};
use fieldpulse_kernel::monitor::CommandMonitor;
use fieldpulse_kernel::simulator::Simulator;
use fieldpulse_kernel::store::{FieldStore, SharedStore, StreamEntry};

/// Harness complet : un store amorcé, son moniteur et un simulateur
/// déterministe prêt à ticker.
pub struct SimHarness {
    pub store: SharedStore,
    pub monitor: CommandMonitor,
    pub cfg: KernelConfig,
    simulator: Simulator,
}

impl SimHarness {
    /// Harness avec la config par défaut et la graine donnée
    pub async fn new(seed: u64) -> Result<Self> {
        Self::with_config(seed, KernelConfig::default()).await
    }

    pub async fn with_config(seed: u64, mut cfg: KernelConfig) -> Result<Self> {
        tracing_subscriber::fmt().try_init().ok(); // init logging pour tests
        cfg.sim_seed = Some(seed);

        let store = FieldStore::new(cfg.stream_maxlen, cfg.alert_cap);
        let monitor = CommandMonitor::new(cfg.command_log_cap);
        let simulator = Simulator::new(store.clone(), monitor.clone(), cfg.clone());
        simulator.seed().await?;

        Ok(Self {
            store,
            monitor,
            cfg,
            simulator,
        })
    }

    /// Exécute `n` ticks complets, sans timer entre eux
    pub async fn run_ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.simulator.tick().await;
        }
    }

    pub async fn assets(&self) -> Vec<Asset> {
        self.store.list_assets().await.unwrap_or_default()
    }

    /// Toute la fenêtre d'alertes courante, de la plus récente à la plus vieille
    pub async fn alerts(&self) -> Vec<Alert> {
        self.store.alerts_recent(self.cfg.alert_cap).await.unwrap_or_default()
    }

    pub async fn latest(&self, sensor_id: &str) -> Option<SensorReading> {
        self.store.latest_get(sensor_id).await.ok().flatten()
    }

    /// Historique d'un capteur, de la plus vieille à la plus récente
    pub async fn history(&self, sensor_id: &str) -> Vec<StreamEntry> {
        let mut entries = self
            .store
            .stream_revrange(sensor_id, self.cfg.stream_maxlen)
            .await
            .unwrap_or_default();
        entries.reverse();
        entries
    }

    /// Assert: la collection d'alertes ne déborde jamais de son cap
    pub async fn assert_alerts_capped(&self) {
        let len = self.store.alerts_len().await.unwrap_or(0);
        assert!(
            len <= self.cfg.alert_cap,
            "alert collection holds {len} entries, cap is {}",
            self.cfg.alert_cap
        );
    }

    /// Assert: tous les actifs restent dans la zone démo
    pub async fn assert_assets_in_region(&self) {
        for asset in self.assets().await {
            assert!(
                self.cfg.region.contains(asset.position.lat, asset.position.lon),
                "{} drifted outside the region: {:?}",
                asset.id,
                asset.position
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_seeds_catalog() {
        let harness = SimHarness::new(1).await.unwrap();
        assert_eq!(harness.assets().await.len(), 12);
    }

    #[tokio::test]
    async fn test_same_seed_same_pipeline() {
        let mut a = SimHarness::new(99).await.unwrap();
        let mut b = SimHarness::new(99).await.unwrap();
        a.run_ticks(3).await;
        b.run_ticks(3).await;
        let la = a.latest("SEN-WELL-001").await.unwrap();
        let lb = b.latest("SEN-WELL-001").await.unwrap();
        assert_eq!(la.values, lb.values);
    }
}
