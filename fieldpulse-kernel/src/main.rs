/**
 * FIELDPULSE KERNEL - Point d'entrée du processus de démo
 *
 * RÔLE : Bootstrap complet : config, store, amorçage du catalogue d'actifs,
 * sessions de démo, boucle de simulation, serveur HTTP.
 *
 * ORDRE D'AMORÇAGE : l'enregistrement initial des actifs est la seule étape
 * fatale — sans store amorcé on ne démarre ni la boucle de tick ni l'API.
 */

use anyhow::{Context, Result};
use fieldpulse_kernel::config::load_config;
use fieldpulse_kernel::http::{build_router, AppState};
use fieldpulse_kernel::monitor::CommandMonitor;
use fieldpulse_kernel::sessions::{seed_demo_sessions, SessionManager};
use fieldpulse_kernel::simulator::Simulator;
use fieldpulse_kernel::store::FieldStore;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Variables d'environnement depuis .env (ok si absent)
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let cfg = load_config().await;

    let store = FieldStore::new(cfg.stream_maxlen, cfg.alert_cap);
    let monitor = CommandMonitor::new(cfg.command_log_cap);

    // Amorçage du catalogue : fatal si le store n'est pas joignable
    let simulator = Simulator::new(store.clone(), monitor.clone(), cfg.clone());
    let seeded = simulator
        .seed()
        .await
        .context("failed to register field assets, not starting the tick loop")?;
    info!("registered {seeded} assets in the field store");

    // Sessions de démo pour le dashboard
    let sessions = SessionManager::new(cfg.session_ttl_secs, monitor.clone());
    seed_demo_sessions(&sessions).await;

    // Boucle de tick en tâche de fond
    simulator.spawn();

    // HTTP
    let app_state = AppState {
        store,
        monitor,
        sessions,
        cfg: cfg.clone(),
    };
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    info!("kernel listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;

    Ok(())
}
