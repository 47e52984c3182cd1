// API REST FIELDPULSE - Serveur HTTP du kernel de démo
//
// RÔLE :
// Expose les structures publiées par le simulateur pour le dashboard carte :
// actifs + géo, flux capteurs, alertes actives, KPIs, sessions, recherche,
// et le journal de commandes du moniteur.
//
// FONCTIONNEMENT :
// - Serveur Axum, routes /api/*, sérialisation JSON automatique
// - Enveloppe de réponse : {"success": bool, <clé>: payload, "error"?: str}
// - La couche HTTP ne calcule rien : elle lit le store et remet en forme
// - Donnée momentanément absente => succès avec payload vide, pas d'erreur
//   (nature best-effort de la démo)

use crate::config::KernelConfig;
use crate::models::{Asset, AssetStatus, MetricChannel, SensorReading};
use crate::monitor::CommandMonitor;
use crate::search::{self, SearchParams};
use crate::sessions::SessionManager;
use crate::store::SharedStore;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub monitor: CommandMonitor,
    pub sessions: SessionManager,
    pub cfg: KernelConfig,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/assets", get(get_assets))
        .route("/api/assets/nearby", get(get_nearby_assets))
        .route("/api/assets/{id}", get(get_asset_details))
        .route("/api/assets/{id}/update", post(update_asset))
        .route("/api/assets/{id}/sensors", get(get_asset_sensors))
        .route("/api/sensors/data", post(ingest_sensor_data))
        .route("/api/sensors/active", get(get_active_sensors))
        .route("/api/sensors/{id}/stream", get(get_sensor_stream))
        .route("/api/dashboard/alerts", get(get_active_alerts))
        .route("/api/dashboard/kpis", get(get_dashboard_kpis))
        .route("/api/sessions", get(get_sessions).post(create_session))
        .route("/api/sessions/metrics", get(get_session_metrics))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/search/assets", get(search_assets))
        .route("/api/search/suggestions", get(search_suggestions))
        .route("/api/monitoring/commands", get(monitoring_commands))
        .route("/api/monitoring/stats", get(monitoring_stats))
        .route("/api/monitoring/clear", post(monitoring_clear))
        .with_state(app_state)
}

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Vue résumée d'un actif pour la carte (métriques du snapshot courant)
fn asset_view(asset: &Asset, latest: Option<&SensorReading>) -> Value {
    json!({
        "id": asset.id,
        "name": asset.name,
        "type": asset.asset_type.as_str(),
        "status": asset.status.as_str(),
        "latitude": asset.position.lat,
        "longitude": asset.position.lon,
        "temperature": latest.and_then(|r| r.value(MetricChannel::Temperature)),
        "pressure": latest.and_then(|r| r.value(MetricChannel::Pressure)),
        "last_update": rfc3339(asset.last_update),
    })
}

// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "store_connected": true,
        "timestamp": rfc3339(OffsetDateTime::now_utc()),
    }))
}

// GET /api/assets (liste carte)
async fn get_assets(State(app): State<AppState>) -> Json<Value> {
    app.monitor.record("dashboard", "ZRANGE", "assets:locations");
    let Ok(assets) = app.store.list_assets().await else {
        return Json(json!({ "success": true, "assets": [], "count": 0 }));
    };

    let mut views = Vec::with_capacity(assets.len());
    for asset in &assets {
        app.monitor.record("dashboard", "JSON.GET", &format!("asset:{}", asset.id));
        let latest = app.store.latest_get(&asset.sensor_id).await.ok().flatten();
        views.push(asset_view(asset, latest.as_ref()));
    }

    Json(json!({ "success": true, "assets": views, "count": views.len() }))
}

// GET /api/assets/{id} (détail complet)
async fn get_asset_details(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    app.monitor.record("dashboard", "GEOPOS", "assets:locations");
    app.monitor.record("dashboard", "JSON.GET", &format!("asset:{id}"));

    let Ok(Some(asset)) = app.store.get_asset(&id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Asset not found" })),
        );
    };
    let latest = app.store.latest_get(&asset.sensor_id).await.ok().flatten();

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "asset": {
                "id": asset.id,
                "name": asset.name,
                "type": asset.asset_type.as_str(),
                "status": asset.status.as_str(),
                "manufacturer": asset.manufacturer,
                "model_number": asset.model_number,
                "serial_number": asset.serial_number,
                "location": { "latitude": asset.position.lat, "longitude": asset.position.lon },
                "sensor_id": asset.sensor_id,
                "maintenance": asset.maintenance,
                "latest_reading": latest,
                "last_update": rfc3339(asset.last_update),
            }
        })),
    )
}

#[derive(Debug, Deserialize)]
struct NearbyParams {
    lat: f64,
    lon: f64,
    /// rayon en km
    #[serde(default = "default_radius")]
    radius: f64,
}

fn default_radius() -> f64 {
    10.0
}

// GET /api/assets/nearby (requête par rayon)
async fn get_nearby_assets(
    State(app): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Json<Value> {
    app.monitor.record("dashboard", "GEORADIUS", "assets:locations");
    let hits = app
        .store
        .geo_radius(params.lat, params.lon, params.radius)
        .await
        .unwrap_or_default();

    let mut nearby = Vec::with_capacity(hits.len());
    for hit in hits {
        let asset = app.store.get_asset(&hit.id).await.ok().flatten();
        nearby.push(json!({
            "id": hit.id,
            "name": asset.as_ref().map(|a| a.name.clone()).unwrap_or_else(|| hit.id.clone()),
            "type": asset.as_ref().map(|a| a.asset_type.as_str()).unwrap_or("unknown"),
            "distance_km": (hit.distance_km * 100.0).round() / 100.0,
            "latitude": hit.position.lat,
            "longitude": hit.position.lon,
        }));
    }

    Json(json!({
        "success": true,
        "nearby_assets": nearby,
        "search_center": { "lat": params.lat, "lon": params.lon },
        "radius_km": params.radius,
        "count": nearby.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct AssetUpdateBody {
    latitude: f64,
    longitude: f64,
    status: Option<AssetStatus>,
}

// POST /api/assets/{id}/update (repositionnement manuel, outil démo)
async fn update_asset(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AssetUpdateBody>,
) -> (StatusCode, Json<Value>) {
    app.monitor.record("dashboard", "GEOADD", "assets:locations");
    app.monitor.record("dashboard", "JSON.SET", &format!("asset:{id}"));

    let point = crate::models::GeoPoint { lat: body.latitude, lon: body.longitude };
    let updated = app
        .store
        .update_asset(&id, |doc| {
            doc.position = point;
            if let Some(status) = body.status {
                doc.status = status;
            }
            doc.last_update = OffsetDateTime::now_utc();
        })
        .await;

    match updated {
        Ok(_) => {
            let _ = app.store.geo_add(&id, point).await;
            (
                StatusCode::OK,
                Json(json!({ "success": true, "message": format!("Asset {id} updated") })),
            )
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Asset not found" })),
        ),
    }
}

// GET /api/assets/{id}/sensors (snapshots rattachés à un actif)
async fn get_asset_sensors(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    app.monitor.record("dashboard", "KEYS", "sensor:latest:*");
    let readings = app.store.latest_all().await.unwrap_or_default();
    let sensors: Vec<Value> = readings
        .iter()
        .filter(|r| r.asset_id == id)
        .map(|r| {
            app.monitor.record("dashboard", "HGETALL", &format!("sensor:latest:{}", r.sensor_id));
            json!({
                "sensor_id": r.sensor_id,
                "location": r.asset_id,
                "timestamp": rfc3339(r.timestamp),
                "latest_reading": r,
            })
        })
        .collect();

    Json(json!({ "success": true, "asset_id": id, "sensors": sensors, "count": sensors.len() }))
}

#[derive(Debug, Deserialize)]
struct IngestBody {
    sensor_id: String,
    asset_id: Option<String>,
    temperature: Option<f64>,
    pressure: Option<f64>,
    flow_rate: Option<f64>,
    vibration: Option<f64>,
}

// POST /api/sensors/data (ingestion manuelle, chemin edge-to-core de la démo)
async fn ingest_sensor_data(
    State(app): State<AppState>,
    Json(body): Json<IngestBody>,
) -> (StatusCode, Json<Value>) {
    let mut values = std::collections::BTreeMap::new();
    let pairs = [
        (MetricChannel::Temperature, body.temperature),
        (MetricChannel::Pressure, body.pressure),
        (MetricChannel::FlowRate, body.flow_rate),
        (MetricChannel::Vibration, body.vibration),
    ];
    for (channel, value) in pairs {
        if let Some(value) = value {
            values.insert(channel, value);
        }
    }

    let reading = SensorReading {
        sensor_id: body.sensor_id.clone(),
        asset_id: body.asset_id.unwrap_or_default(),
        timestamp: OffsetDateTime::now_utc(),
        values,
    };

    app.monitor.record("dashboard", "XADD", &format!("sensors:{}", body.sensor_id));
    let stream_id = match app.store.stream_add(reading.clone()).await {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            );
        }
    };
    app.monitor.record("dashboard", "HSET", &format!("sensor:latest:{}", body.sensor_id));
    let _ = app.store.latest_set(reading).await;

    (
        StatusCode::OK,
        Json(json!({ "success": true, "stream_id": stream_id, "sensor_id": body.sensor_id })),
    )
}

// GET /api/sensors/active (tous les snapshots courants)
async fn get_active_sensors(State(app): State<AppState>) -> Json<Value> {
    app.monitor.record("dashboard", "KEYS", "sensor:latest:*");
    let readings = app.store.latest_all().await.unwrap_or_default();
    let sensors: Vec<Value> = readings
        .iter()
        .map(|r| {
            json!({
                "sensor_id": r.sensor_id,
                "latest_reading": r,
                "last_update": rfc3339(r.timestamp),
            })
        })
        .collect();

    Json(json!({ "success": true, "sensors": sensors, "count": sensors.len() }))
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    #[serde(default = "default_stream_count")]
    count: usize,
}

fn default_stream_count() -> usize {
    100
}

// GET /api/sensors/{id}/stream (historique récent du log ordonné)
async fn get_sensor_stream(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<StreamParams>,
) -> Json<Value> {
    app.monitor.record("dashboard", "XREVRANGE", &format!("sensors:{id}"));
    let entries = app.store.stream_revrange(&id, params.count).await.unwrap_or_default();
    Json(json!({
        "success": true,
        "sensor_id": id,
        "data": entries,
        "count": entries.len(),
    }))
}

// GET /api/dashboard/alerts (10 alertes les plus récentes)
async fn get_active_alerts(State(app): State<AppState>) -> Json<Value> {
    app.monitor.record("dashboard", "ZREVRANGE", "alerts:active");
    let alerts = app.store.alerts_recent(10).await.unwrap_or_default();
    Json(json!({ "success": true, "alerts": alerts, "count": alerts.len() }))
}

// GET /api/dashboard/kpis
async fn get_dashboard_kpis(State(app): State<AppState>) -> Json<Value> {
    app.monitor.record("dashboard", "ZCARD", "assets:locations");
    app.monitor.record("dashboard", "KEYS", "sensor:latest:*");
    for key in ["alerts:count", "metrics:avg_temperature", "metrics:avg_pressure", "metrics:total_production"] {
        app.monitor.record("dashboard", "GET", key);
    }

    let metric = |name: &'static str| {
        let store = app.store.clone();
        async move { store.metric_get(name).await.ok().flatten().unwrap_or(0.0) }
    };

    let kpis = json!({
        "total_assets": app.store.geo_count().await.unwrap_or(0),
        "active_sensors": app.store.latest_all().await.map(|r| r.len()).unwrap_or(0),
        "total_alerts": app.store.alerts_total().await.unwrap_or(0),
        "avg_temperature": metric("avg_temperature").await,
        "avg_pressure": metric("avg_pressure").await,
        "total_production": metric("total_production").await,
        "system_uptime": metric("system_uptime").await,
    });

    Json(json!({
        "success": true,
        "kpis": kpis,
        "timestamp": rfc3339(OffsetDateTime::now_utc()),
    }))
}

#[derive(Debug, Deserialize)]
struct CreateSessionBody {
    user_id: String,
    #[serde(default)]
    user_data: Value,
}

// POST /api/sessions
async fn create_session(
    State(app): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Json<Value> {
    let session_id = app.sessions.create(&body.user_id, body.user_data).await;
    Json(json!({ "success": true, "session_id": session_id, "user_id": body.user_id }))
}

// GET /api/sessions (sessions actives)
async fn get_sessions(State(app): State<AppState>) -> Json<Value> {
    let sessions = app.sessions.active().await;
    Json(json!({ "success": true, "sessions": sessions, "count": sessions.len() }))
}

// GET /api/sessions/{id}
async fn get_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match app.sessions.get(&id).await {
        Some(session) => (StatusCode::OK, Json(json!({ "success": true, "session": session }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Session not found" })),
        ),
    }
}

// DELETE /api/sessions/{id}
async fn delete_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if app.sessions.delete(&id).await {
        (StatusCode::OK, Json(json!({ "success": true, "message": "Session deleted" })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Session not found" })),
        )
    }
}

// GET /api/sessions/metrics
async fn get_session_metrics(State(app): State<AppState>) -> Json<Value> {
    let metrics = app.sessions.metrics().await;
    Json(json!({ "success": true, "metrics": metrics }))
}

// GET /api/search/assets (plein-texte + filtres)
async fn search_assets(
    State(app): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Value> {
    app.monitor.record("search", "FT.SEARCH", "idx:assets");
    let assets = app.store.list_assets().await.unwrap_or_default();
    let result = search::search_assets(&assets, &params);

    Json(json!({
        "success": true,
        "total": result.total,
        "count": result.assets.len(),
        "assets": result.assets,
        "query": params.q,
        "filters": {
            "type": params.asset_type,
            "manufacturer": params.manufacturer,
            "status": params.status,
            "team": params.team,
        },
    }))
}

#[derive(Debug, Deserialize)]
struct SuggestionParams {
    #[serde(default = "default_suggestion_field")]
    field: String,
}

fn default_suggestion_field() -> String {
    "type".to_string()
}

// GET /api/search/suggestions (autocomplétion des champs filtrables)
async fn search_suggestions(
    State(app): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> (StatusCode, Json<Value>) {
    app.monitor.record("search", "FT.TAGVALS", &format!("idx:assets {}", params.field));
    let assets = app.store.list_assets().await.unwrap_or_default();
    match search::suggestions(&assets, &params.field) {
        Some(values) => (
            StatusCode::OK,
            Json(json!({ "success": true, "field": params.field, "suggestions": values })),
        ),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": format!("Field {} is not available for suggestions", params.field),
            })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct MonitoringParams {
    #[serde(default = "default_context")]
    context: String,
    #[serde(default = "default_command_limit")]
    limit: usize,
}

fn default_context() -> String {
    "dashboard".to_string()
}

fn default_command_limit() -> usize {
    50
}

// GET /api/monitoring/commands (journal récent d'un contexte)
async fn monitoring_commands(
    State(app): State<AppState>,
    Query(params): Query<MonitoringParams>,
) -> Json<Value> {
    let commands = app.monitor.recent(&params.context, params.limit);
    Json(json!({
        "success": true,
        "context": params.context,
        "commands": commands,
        "count": commands.len(),
    }))
}

// GET /api/monitoring/stats (compteurs O(1) d'un contexte)
async fn monitoring_stats(
    State(app): State<AppState>,
    Query(params): Query<MonitoringParams>,
) -> Json<Value> {
    let stats = app.monitor.stats(&params.context);
    Json(json!({
        "success": true,
        "context": params.context,
        "stats": stats,
        "contexts": app.monitor.contexts(),
    }))
}

#[derive(Debug, Deserialize)]
struct ClearParams {
    context: Option<String>,
}

// POST /api/monitoring/clear (reset journal + compteurs)
async fn monitoring_clear(
    State(app): State<AppState>,
    Query(params): Query<ClearParams>,
) -> Json<Value> {
    match params.context {
        Some(context) => app.monitor.clear(&context),
        None => {
            for context in app.monitor.contexts() {
                app.monitor.clear(&context);
            }
        }
    }
    Json(json!({ "success": true, "message": "Command history cleared" }))
}
