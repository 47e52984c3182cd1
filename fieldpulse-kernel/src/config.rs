use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Zone géographique de la démo. Les actifs mobiles restent dedans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub http_port: u16,
    /// Cadence du simulateur : un tick complet toutes les N secondes
    pub tick_interval_secs: u64,
    /// Timeout appliqué à chaque écriture store depuis la boucle de tick
    pub store_op_timeout_ms: u64,
    /// Taille max de la collection d'alertes (les plus anciennes sont évincées)
    pub alert_cap: usize,
    /// Largeur de la fenêtre de déduplication des identifiants d'alerte.
    /// Plus fin que le tick ça ré-inonde, plus grossier que nécessaire
    /// ça masque ; 10s = deux ticks par fenêtre.
    pub alert_bucket_secs: i64,
    pub system_alert_probability: f64,
    /// Taille max du journal de commandes par contexte
    pub command_log_cap: usize,
    /// Longueur max du log ordonné par capteur
    pub stream_maxlen: usize,
    pub session_ttl_secs: u64,
    /// Graine du générateur aléatoire ; absente = entropie système
    pub sim_seed: Option<u64>,
    pub region: BoundingBox,
    pub movement_max_step_deg: f64,
    pub status_churn_probability: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            tick_interval_secs: 5,
            store_op_timeout_ms: 2000,
            alert_cap: 50,
            alert_bucket_secs: 10,
            system_alert_probability: 0.1,
            command_log_cap: 500,
            stream_maxlen: 1000,
            session_ttl_secs: 604_800, // 7 jours, confort démo
            sim_seed: None,
            // Bassin permien autour de Midland, TX
            region: BoundingBox {
                min_lat: 31.2,
                max_lat: 32.8,
                min_lon: -103.1,
                max_lon: -101.1,
            },
            movement_max_step_deg: 0.01,
            status_churn_probability: 0.02,
        }
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("FIELDPULSE_CONFIG").unwrap_or_else(|_| "fieldpulse.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return KernelConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("config invalide ({path}): {e}");
            KernelConfig::default()
        })
    } else {
        warn!("pas de {path}, usage config par défaut");
        KernelConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = KernelConfig::default();
        assert_eq!(cfg.tick_interval_secs, 5);
        assert_eq!(cfg.alert_cap, 50);
        assert!(cfg.alert_bucket_secs >= cfg.tick_interval_secs as i64);
        assert!(cfg.region.contains(31.99, -102.07)); // Midland
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg: KernelConfig = serde_yaml::from_str("tick_interval_secs: 1\nalert_cap: 5\n").unwrap();
        assert_eq!(cfg.tick_interval_secs, 1);
        assert_eq!(cfg.alert_cap, 5);
        assert_eq!(cfg.http_port, 8080);
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = KernelConfig::default().region;
        assert!(!bbox.contains(33.0, -102.0));
        assert!(!bbox.contains(32.0, -100.0));
    }
}
