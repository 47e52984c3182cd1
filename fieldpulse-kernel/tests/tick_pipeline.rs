//! Propriétés du pipeline de tick complet, via le harness du devkit :
//! bornes des valeurs, continuité de la marche, caps des collections,
//! confinement des actifs mobiles.

use fieldpulse_devkit::{test_asset, SimHarness};
use fieldpulse_kernel::config::KernelConfig;
use fieldpulse_kernel::models::AssetType;
use fieldpulse_kernel::search::{search_assets, SearchParams};
use fieldpulse_kernel::simulator::registry::nominal_range;

const EPS: f64 = 1e-9;

#[tokio::test]
async fn readings_stay_within_type_ranges() {
    let mut harness = SimHarness::new(101).await.unwrap();
    harness.run_ticks(30).await;

    for asset in harness.assets().await {
        for entry in harness.history(&asset.sensor_id).await {
            for (&channel, &value) in &entry.reading.values {
                let range = nominal_range(asset.asset_type, channel);
                assert!(
                    value >= range.min - EPS && value <= range.max + EPS,
                    "{} {} = {value} outside [{}, {}]",
                    asset.id,
                    channel.as_str(),
                    range.min,
                    range.max
                );
            }
        }
    }
}

#[tokio::test]
async fn consecutive_readings_respect_max_delta() {
    let mut harness = SimHarness::new(202).await.unwrap();
    harness.run_ticks(30).await;

    for asset in harness.assets().await {
        let history = harness.history(&asset.sensor_id).await;
        for pair in history.windows(2) {
            for (&channel, &value) in &pair[1].reading.values {
                let prev = pair[0].reading.values[&channel];
                let range = nominal_range(asset.asset_type, channel);
                assert!(
                    (value - prev).abs() <= range.max_delta + EPS,
                    "{} {} jumped {prev} -> {value} (max_delta {})",
                    asset.id,
                    channel.as_str(),
                    range.max_delta
                );
            }
        }
    }
}

#[tokio::test]
async fn alert_window_never_exceeds_cap() {
    let cfg = KernelConfig {
        alert_cap: 10,
        system_alert_probability: 1.0,
        ..KernelConfig::default()
    };
    let mut harness = SimHarness::with_config(303, cfg).await.unwrap();

    for _ in 0..10 {
        harness.run_ticks(5).await;
        harness.assert_alerts_capped().await;
    }

    // les ids de la fenêtre restent uniques (upsert, pas de doublon)
    let alerts = harness.alerts().await;
    let mut ids: Vec<_> = alerts.iter().map(|a| a.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), alerts.len());
}

#[tokio::test]
async fn mobile_assets_stay_in_region() {
    // grand pas pour presser contre la frontière
    let cfg = KernelConfig {
        movement_max_step_deg: 0.25,
        ..KernelConfig::default()
    };
    let mut harness = SimHarness::with_config(404, cfg).await.unwrap();

    for _ in 0..10 {
        harness.run_ticks(20).await;
        harness.assert_assets_in_region().await;
    }
}

#[tokio::test]
async fn snapshot_matches_newest_log_entry() {
    let mut harness = SimHarness::new(505).await.unwrap();
    harness.run_ticks(8).await;

    for asset in harness.assets().await {
        let latest = harness.latest(&asset.sensor_id).await.unwrap();
        let history = harness.history(&asset.sensor_id).await;
        let newest = history.last().unwrap();
        assert_eq!(newest.reading.values, latest.values, "{} snapshot is stale", asset.id);
    }
}

#[tokio::test]
async fn sensor_logs_are_bounded() {
    let cfg = KernelConfig {
        stream_maxlen: 5,
        ..KernelConfig::default()
    };
    let mut harness = SimHarness::with_config(606, cfg).await.unwrap();
    harness.run_ticks(20).await;

    for asset in harness.assets().await {
        let history = harness.history(&asset.sensor_id).await;
        assert_eq!(history.len(), 5, "{} log not trimmed", asset.id);
    }
}

#[tokio::test]
async fn command_journal_is_bounded_but_counters_keep_counting() {
    let cfg = KernelConfig {
        command_log_cap: 25,
        ..KernelConfig::default()
    };
    let mut harness = SimHarness::with_config(707, cfg).await.unwrap();
    harness.run_ticks(10).await;

    let recent = harness.monitor.recent("simulator", 10_000);
    assert!(recent.len() <= 25);
    let stats = harness.monitor.stats("simulator");
    assert!(stats.total_count as usize > recent.len());
    assert!(stats.write_count > 0);

    harness.monitor.clear("simulator");
    assert_eq!(harness.monitor.stats("simulator").total_count, 0);
    assert!(harness.monitor.recent("simulator", 10).is_empty());
}

#[tokio::test]
async fn injected_asset_is_searchable_and_nearby() {
    let harness = SimHarness::new(909).await.unwrap();
    let asset = test_asset("WELL-900", AssetType::ProductionWell);
    harness.store.upsert_asset(asset.clone()).await.unwrap();
    harness.store.geo_add(&asset.id, asset.position).await.unwrap();

    let assets = harness.assets().await;
    let result = search_assets(
        &assets,
        &SearchParams { q: "WELL-900".into(), ..Default::default() },
    );
    assert_eq!(result.total, 1);
    assert_eq!(result.assets[0].id, "WELL-900");

    let hits = harness.store.geo_radius(31.99, -102.08, 5.0).await.unwrap();
    assert!(hits.iter().any(|h| h.id == "WELL-900"));
}

#[tokio::test]
async fn tick_refreshes_asset_documents() {
    let mut harness = SimHarness::new(808).await.unwrap();
    let before = harness.assets().await;
    harness.run_ticks(1).await;
    let after = harness.assets().await;

    for (b, a) in before.iter().zip(after.iter()) {
        assert!(a.last_update > b.last_update, "{} not refreshed", a.id);
    }
}
