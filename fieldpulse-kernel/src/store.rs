/**
 * FIELD STORE - Store in-memory unique du processus de démo
 *
 * RÔLE :
 * Rendu in-process du store de référence : documents actifs (upsert par id),
 * index géospatial, log ordonné par capteur (ids croissants), snapshots
 * "dernière valeur", collection d'alertes bornée, métriques scalaires.
 *
 * FONCTIONNEMENT :
 * - Un seul écrivain logique (la boucle de tick) ; les handlers HTTP lisent.
 * - RwLock tokio : écritures courtes, lectures concurrentes.
 * - Toutes les collections bornées passent par BoundedLog (éviction du plus
 *   ancien, capacité explicite).
 *
 * UTILITÉ :
 * 🎯 Medium partagé entre simulateur et API REST (un seul processus)
 * 🎯 Requêtes dashboard : rayon géo, flux capteur, alertes récentes, KPIs
 */

use crate::bounded::BoundedLog;
use crate::models::{Alert, Asset, GeoPoint, SensorReading};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedStore = Arc<FieldStore>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    #[error("store operation timed out")]
    Timeout,
}

/// Entrée du log ordonné d'un capteur. L'id suit le format `millis-seq`
/// et croît strictement au sein d'un même log.
#[derive(Debug, Clone, Serialize)]
pub struct StreamEntry {
    pub id: String,
    pub reading: SensorReading,
}

/// Résultat d'une requête par rayon
#[derive(Debug, Clone, Serialize)]
pub struct GeoEntry {
    pub id: String,
    pub distance_km: f64,
    pub position: GeoPoint,
}

struct StreamLog {
    entries: BoundedLog<StreamEntry>,
    last_ms: i128,
    last_seq: u64,
}

impl StreamLog {
    fn next_id(&mut self, now_ms: i128) -> String {
        if now_ms > self.last_ms {
            self.last_ms = now_ms;
            self.last_seq = 0;
        } else {
            self.last_seq += 1;
        }
        format!("{}-{}", self.last_ms, self.last_seq)
    }
}

struct StoreInner {
    assets: HashMap<String, Asset>,
    geo: HashMap<String, GeoPoint>,
    streams: HashMap<String, StreamLog>,
    latest: HashMap<String, SensorReading>,
    alerts: BoundedLog<Alert>,
    alerts_total: u64,
    metrics: HashMap<String, f64>,
}

pub struct FieldStore {
    inner: RwLock<StoreInner>,
    stream_maxlen: usize,
}

impl FieldStore {
    pub fn new(stream_maxlen: usize, alert_cap: usize) -> SharedStore {
        Arc::new(Self {
            inner: RwLock::new(StoreInner {
                assets: HashMap::new(),
                geo: HashMap::new(),
                streams: HashMap::new(),
                latest: HashMap::new(),
                alerts: BoundedLog::new(alert_cap),
                alerts_total: 0,
                metrics: HashMap::new(),
            }),
            stream_maxlen,
        })
    }

    // ---- documents actifs ----

    pub async fn upsert_asset(&self, asset: Asset) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.assets.insert(asset.id.clone(), asset);
        Ok(())
    }

    pub async fn get_asset(&self, id: &str) -> Result<Option<Asset>, StoreError> {
        Ok(self.inner.read().await.assets.get(id).cloned())
    }

    /// Liste triée par id : ordre déterministe pour l'API et les tests
    pub async fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let inner = self.inner.read().await;
        let mut assets: Vec<Asset> = inner.assets.values().cloned().collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    /// Mutation en place d'un document actif (statut, position, last_update)
    pub async fn update_asset<F>(&self, id: &str, mutate: F) -> Result<Asset, StoreError>
    where
        F: FnOnce(&mut Asset),
    {
        let mut inner = self.inner.write().await;
        let asset = inner
            .assets
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownAsset(id.to_string()))?;
        mutate(asset);
        Ok(asset.clone())
    }

    // ---- index géospatial ----

    /// Ajoute ou remplace la position d'un membre
    pub async fn geo_add(&self, id: &str, point: GeoPoint) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.geo.insert(id.to_string(), point);
        Ok(())
    }

    pub async fn geo_pos(&self, id: &str) -> Result<Option<GeoPoint>, StoreError> {
        Ok(self.inner.read().await.geo.get(id).copied())
    }

    pub async fn geo_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.geo.len())
    }

    /// Membres dans un rayon donné, triés du plus proche au plus lointain
    pub async fn geo_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> Result<Vec<GeoEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut hits: Vec<GeoEntry> = inner
            .geo
            .iter()
            .filter_map(|(id, point)| {
                let distance_km = haversine_km(lat, lon, point.lat, point.lon);
                (distance_km <= radius_km).then(|| GeoEntry {
                    id: id.clone(),
                    distance_km,
                    position: *point,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(hits)
    }

    // ---- logs capteurs + snapshots ----

    /// Ajoute une lecture au log ordonné du capteur ; retourne l'id d'entrée
    pub async fn stream_add(&self, reading: SensorReading) -> Result<String, StoreError> {
        let now_ms = reading.timestamp.unix_timestamp_nanos() / 1_000_000;
        let maxlen = self.stream_maxlen;
        let mut inner = self.inner.write().await;
        let stream = inner
            .streams
            .entry(reading.sensor_id.clone())
            .or_insert_with(|| StreamLog {
                entries: BoundedLog::new(maxlen),
                last_ms: 0,
                last_seq: 0,
            });
        let id = stream.next_id(now_ms);
        stream.entries.push(StreamEntry {
            id: id.clone(),
            reading,
        });
        Ok(id)
    }

    /// Les `count` entrées les plus récentes, de la plus neuve à la plus vieille
    pub async fn stream_revrange(
        &self,
        sensor_id: &str,
        count: usize,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .streams
            .get(sensor_id)
            .map(|s| s.entries.iter_rev().take(count).cloned().collect())
            .unwrap_or_default())
    }

    pub async fn latest_set(&self, reading: SensorReading) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.latest.insert(reading.sensor_id.clone(), reading);
        Ok(())
    }

    pub async fn latest_get(&self, sensor_id: &str) -> Result<Option<SensorReading>, StoreError> {
        Ok(self.inner.read().await.latest.get(sensor_id).cloned())
    }

    pub async fn latest_all(&self) -> Result<Vec<SensorReading>, StoreError> {
        let inner = self.inner.read().await;
        let mut readings: Vec<SensorReading> = inner.latest.values().cloned().collect();
        readings.sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
        Ok(readings)
    }

    // ---- alertes ----

    /// Insère une alerte. Un id déjà présent est écrasé en place (upsert
    /// idempotent, clé de dédup) ; sinon ajout avec éviction au-delà du cap.
    pub async fn alerts_push(&self, alert: Alert) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let id = alert.id.clone();
        if !inner.alerts.replace_where(|a| a.id == id, alert.clone()) {
            inner.alerts.push(alert);
            inner.alerts_total += 1;
        }
        Ok(())
    }

    pub async fn alerts_recent(&self, count: usize) -> Result<Vec<Alert>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.alerts.iter_rev().take(count).cloned().collect())
    }

    pub async fn alerts_len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.alerts.len())
    }

    /// Compteur monotone : total d'alertes distinctes émises depuis le départ
    pub async fn alerts_total(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.alerts_total)
    }

    // ---- métriques dashboard ----

    pub async fn metric_set(&self, name: &str, value: f64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.metrics.insert(name.to_string(), value);
        Ok(())
    }

    pub async fn metric_get(&self, name: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.inner.read().await.metrics.get(name).copied())
    }
}

/// Distance grand-cercle en kilomètres
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertCategory, MetricChannel, Severity};
    use std::collections::BTreeMap;
    use time::OffsetDateTime;

    fn reading(sensor_id: &str, ts_secs: i64, temp: f64) -> SensorReading {
        let mut values = BTreeMap::new();
        values.insert(MetricChannel::Temperature, temp);
        SensorReading {
            sensor_id: sensor_id.to_string(),
            asset_id: "WELL-001".to_string(),
            timestamp: OffsetDateTime::from_unix_timestamp(ts_secs).unwrap(),
            values,
        }
    }

    fn alert(id: &str, ts_secs: i64) -> Alert {
        Alert {
            id: id.to_string(),
            category: AlertCategory::TemperatureHigh,
            message: "High Temperature Detected".to_string(),
            details: String::new(),
            severity: Severity::Warning,
            location: "WELL-001".to_string(),
            sensor_id: "SEN-WELL-001".to_string(),
            timestamp: OffsetDateTime::from_unix_timestamp(ts_secs).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_stream_ids_monotonic() {
        let store = FieldStore::new(100, 10);
        let mut prev = String::new();
        for i in 0..5 {
            // même seconde : la séquence doit départager
            let id = store.stream_add(reading("SEN-1", 1_700_000_000, 100.0 + i as f64)).await.unwrap();
            assert!(id > prev, "{id} should sort after {prev}");
            prev = id;
        }
    }

    #[tokio::test]
    async fn test_stream_bounded() {
        let store = FieldStore::new(3, 10);
        for i in 0..10 {
            store.stream_add(reading("SEN-1", 1_700_000_000 + i, 100.0)).await.unwrap();
        }
        let entries = store.stream_revrange("SEN-1", 50).await.unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn test_latest_overwritten() {
        let store = FieldStore::new(10, 10);
        store.latest_set(reading("SEN-1", 1, 100.0)).await.unwrap();
        store.latest_set(reading("SEN-1", 2, 110.0)).await.unwrap();
        let latest = store.latest_get("SEN-1").await.unwrap().unwrap();
        assert_eq!(latest.value(MetricChannel::Temperature), Some(110.0));
        assert_eq!(store.latest_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_alerts_trimmed_to_cap() {
        let store = FieldStore::new(10, 5);
        for i in 0..20 {
            store.alerts_push(alert(&format!("TEMP_HIGH_SEN-1_{i}"), i)).await.unwrap();
        }
        assert_eq!(store.alerts_len().await.unwrap(), 5);
        assert_eq!(store.alerts_total().await.unwrap(), 20);
        let recent = store.alerts_recent(2).await.unwrap();
        assert_eq!(recent[0].id, "TEMP_HIGH_SEN-1_19");
    }

    #[tokio::test]
    async fn test_alerts_same_id_upserts() {
        let store = FieldStore::new(10, 5);
        store.alerts_push(alert("TEMP_HIGH_SEN-1_42", 1)).await.unwrap();
        store.alerts_push(alert("TEMP_HIGH_SEN-1_42", 2)).await.unwrap();
        assert_eq!(store.alerts_len().await.unwrap(), 1);
        assert_eq!(store.alerts_total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_geo_radius_sorted() {
        let store = FieldStore::new(10, 5);
        store.geo_add("NEAR", GeoPoint { lat: 32.0, lon: -102.0 }).await.unwrap();
        store.geo_add("FAR", GeoPoint { lat: 32.5, lon: -102.0 }).await.unwrap();
        store.geo_add("OUT", GeoPoint { lat: 40.0, lon: -102.0 }).await.unwrap();
        let hits = store.geo_radius(32.0, -102.0, 100.0).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["NEAR", "FAR"]);
        // ~0.5° de latitude ≈ 55,6 km
        assert!((hits[1].distance_km - 55.6).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_update_unknown_asset() {
        let store = FieldStore::new(10, 5);
        let err = store.update_asset("NOPE", |_| {}).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownAsset(_)));
    }
}
