//! Reconciler integration tests against an in-memory store and fake remote

mod support;

use fleetsync_core::{EntityKind, RideStatus};
use fleetsync_store::{connect_in_memory, queries, DbPool};
use fleetsync_sync_engine::{Reconciler, SweepPolicy, SyncOptions};
use serde_json::json;
use support::FakeRemote;

async fn setup() -> (DbPool, FakeRemote) {
    (connect_in_memory().await.unwrap(), FakeRemote::new())
}

fn remote_station(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "nameAr": name, "nameEn": name, "nameFr": name,
        "lat": 36.75, "lng": 3.05,
        "paths": [], "schedule": [], "changes": {}, "lines": []
    })
}

#[tokio::test]
async fn test_first_pass_creates_then_second_is_idempotent() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Station,
        vec![remote_station(1, "North"), remote_station(2, "South")],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler.run(&[EntityKind::Station]).await.unwrap();
    let counts = report.counts_for(EntityKind::Station);
    assert_eq!(counts.synced, 2);
    assert_eq!(counts.skipped, 0);

    // Unchanged remote: every fingerprint matches, zero local writes
    let report = reconciler.run(&[EntityKind::Station]).await.unwrap();
    let counts = report.counts_for(EntityKind::Station);
    assert_eq!(counts.synced, 0);
    assert_eq!(counts.skipped, 2);

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(queries::stations::list_all(&mut conn).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_changed_record_is_updated() {
    let (pool, remote) = setup().await;
    remote.set_collection(EntityKind::Station, vec![remote_station(1, "North")]);
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());
    reconciler.run(&[EntityKind::Station]).await.unwrap();

    remote.set_collection(EntityKind::Station, vec![remote_station(1, "North Gate")]);
    let report = reconciler.run(&[EntityKind::Station]).await.unwrap();
    assert_eq!(report.counts_for(EntityKind::Station).synced, 1);

    let mut conn = pool.acquire().await.unwrap();
    let station = queries::stations::get_by_external_id(&mut conn, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(station.name_en, "North Gate");
}

#[tokio::test]
async fn test_incomplete_and_test_records_are_filtered() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Station,
        vec![
            remote_station(1, "Real"),
            remote_station(2, "Test station"),
            json!({ "nameAr": "x", "nameEn": "x", "nameFr": "x" }),
            json!({ "id": 4, "nameAr": "", "nameEn": "y", "nameFr": "y" }),
        ],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler.run(&[EntityKind::Station]).await.unwrap();
    let counts = report.counts_for(EntityKind::Station);
    assert_eq!(counts.synced, 1);
    assert_eq!(counts.skipped, 3);
}

#[tokio::test]
async fn test_line_test_sentinel_keyed_on_either_code() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Line,
        vec![
            json!({ "id": 1, "code": "L1", "enterpriseCode": "E1" }),
            json!({ "id": 2, "code": "test L2", "enterpriseCode": "E2" }),
            json!({ "id": 3, "code": "L3", "enterpriseCode": "TEST" }),
        ],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler.run(&[EntityKind::Line]).await.unwrap();
    let counts = report.counts_for(EntityKind::Line);
    assert_eq!(counts.synced, 1);
    assert_eq!(counts.skipped, 2);

    let mut conn = pool.acquire().await.unwrap();
    let lines = queries::lines::list_all(&mut conn).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].external_id, Some(1));
}

#[tokio::test]
async fn test_line_with_unseen_stations_creates_placeholders() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Line,
        vec![json!({
            "id": 7,
            "code": "L7",
            "enterpriseCode": "E7",
            "color": "#FF0000",
            "lineType": 2,
            "departureStation": { "id": 100 },
            "terminusStation": { "id": 200 },
            "schedule": ["08:00"]
        })],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler.run(&[EntityKind::Line]).await.unwrap();
    let counts = report.counts_for(EntityKind::Line);
    assert_eq!(counts.synced, 1);
    assert_eq!(counts.skipped, 0);

    let mut conn = pool.acquire().await.unwrap();
    let stations = queries::stations::list_all(&mut conn).await.unwrap();
    assert_eq!(stations.len(), 2);
    assert!(stations.iter().all(|s| s.name_en.starts_with("Unknown station")));

    let line = queries::lines::get_by_external_id(&mut conn, 7)
        .await
        .unwrap()
        .unwrap();
    assert!(line.departure_station_id.is_some());
    assert!(line.terminus_station_id.is_some());
}

#[tokio::test]
async fn test_placeholder_upgraded_not_duplicated() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Line,
        vec![json!({
            "id": 7, "code": "L7", "enterpriseCode": "E7",
            "departureStation": { "id": 100 }
        })],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());
    reconciler.run(&[EntityKind::Line]).await.unwrap();

    // The proper station sync now delivers external id 100
    remote.set_collection(EntityKind::Station, vec![remote_station(100, "Harbor")]);
    reconciler.run(&[EntityKind::Station]).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let stations = queries::stations::list_all(&mut conn).await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].name_en, "Harbor");
    assert_eq!(stations[0].external_id, Some(100));
}

#[tokio::test]
async fn test_sweep_deletes_unseen_records() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Line,
        vec![
            json!({ "id": 1, "code": "L1", "enterpriseCode": "E1" }),
            json!({ "id": 2, "code": "L2", "enterpriseCode": "E2" }),
        ],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());
    reconciler.run(&[EntityKind::Line]).await.unwrap();

    // Line 2 disappears remotely
    remote.set_collection(
        EntityKind::Line,
        vec![json!({ "id": 1, "code": "L1", "enterpriseCode": "E1" })],
    );
    let report = reconciler.run(&[EntityKind::Line]).await.unwrap();
    // The sweep deletion counts as a synced change
    assert_eq!(report.counts_for(EntityKind::Line).synced, 1);

    let mut conn = pool.acquire().await.unwrap();
    let lines = queries::lines::list_all(&mut conn).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].external_id, Some(1));
}

#[tokio::test]
async fn test_sweep_disabled_keeps_unseen_records() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Line,
        vec![json!({ "id": 1, "code": "L1", "enterpriseCode": "E1" })],
    );
    let options = SyncOptions {
        sweep: SweepPolicy::none(),
        ..Default::default()
    };
    let reconciler = Reconciler::new(pool.clone(), &remote, options);
    reconciler.run(&[EntityKind::Line]).await.unwrap();

    remote.set_collection(EntityKind::Line, vec![]);
    reconciler.run(&[EntityKind::Line]).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(queries::lines::list_all(&mut conn).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_aborts_pass_and_keeps_watermark() {
    let (pool, remote) = setup().await;
    remote.set_collection(EntityKind::Station, vec![remote_station(1, "North")]);
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());
    reconciler.run(&[EntityKind::Station]).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let watermark = queries::watermarks::get(&mut conn, EntityKind::Station)
        .await
        .unwrap()
        .unwrap();
    drop(conn);

    remote.fail_fetches(1);
    let report = reconciler.run(&[EntityKind::Station]).await.unwrap();
    assert!(report.failed);
    assert!(report.messages.iter().any(|m| m.contains("failed")));

    let mut conn = pool.acquire().await.unwrap();
    let after = queries::watermarks::get(&mut conn, EntityKind::Station)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(watermark, after);
}

#[tokio::test]
async fn test_incremental_fetch_sends_watermark_and_skips_sweep() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Line,
        vec![json!({ "id": 1, "code": "L1", "enterpriseCode": "E1" })],
    );
    let options = SyncOptions {
        incremental_fetch: true,
        ..Default::default()
    };
    let reconciler = Reconciler::new(pool.clone(), &remote, options);

    // No watermark yet: the first pass is a full fetch
    reconciler.run(&[EntityKind::Line]).await.unwrap();
    assert!(remote.last_since.lock().unwrap().is_none());

    // Second pass sends the watermark, and an empty slice sweeps nothing
    // even though lines opt into sweeping
    remote.set_collection(EntityKind::Line, vec![]);
    reconciler.run(&[EntityKind::Line]).await.unwrap();
    assert!(remote.last_since.lock().unwrap().is_some());

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(queries::lines::list_all(&mut conn).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_ride_status_and_line_resolution() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Ride,
        vec![json!({
            "id": 50,
            "line": 7,
            "direction": "RETURNING",
            "status": "FINISHED",
            "departureDatetime": "2026-03-14T08:30:00Z",
            "passengers": [1, 2],
            "driver": 9
        })],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler.run(&[EntityKind::Ride]).await.unwrap();
    assert_eq!(report.counts_for(EntityKind::Ride).synced, 1);

    let mut conn = pool.acquire().await.unwrap();
    let ride = queries::rides::get_by_external_id(&mut conn, 50)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ride.status, RideStatus::Completed);
    assert_eq!(ride.driver.as_deref(), Some("9"));
    assert!(ride.departure_at.is_some());

    // The referenced line materialized as a placeholder
    let line = queries::lines::get_by_external_id(&mut conn, 7)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ride.line_id, line.id);
}

#[tokio::test]
async fn test_profiles_sync_into_separate_collections() {
    let (pool, remote) = setup().await;
    let profile = json!({
        "id": 3,
        "firstName": "Amine", "lastName": "B",
        "phoneNumber": "0550", "username": "amine",
        "driverNumber": "D-1", "rides": []
    });
    remote.set_collection(EntityKind::Driver, vec![profile.clone()]);
    remote.set_collection(EntityKind::Passenger, vec![profile]);
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler
        .run(&[EntityKind::Driver, EntityKind::Passenger])
        .await
        .unwrap();
    assert_eq!(report.counts_for(EntityKind::Driver).synced, 1);
    assert_eq!(report.counts_for(EntityKind::Passenger).synced, 1);

    let mut conn = pool.acquire().await.unwrap();
    let drivers = queries::profiles::list_all(&mut conn, fleetsync_core::ProfileKind::Driver)
        .await
        .unwrap();
    assert_eq!(drivers.len(), 1);
    assert!(drivers[0].last_sync.is_some());
}

#[tokio::test]
async fn test_bad_record_is_skipped_not_fatal() {
    let (pool, remote) = setup().await;
    remote.set_collection(
        EntityKind::Station,
        vec![
            json!({ "id": "not a number", "nameAr": 5 }),
            remote_station(2, "Valid"),
        ],
    );
    let reconciler = Reconciler::new(pool.clone(), &remote, SyncOptions::default());

    let report = reconciler.run(&[EntityKind::Station]).await.unwrap();
    let counts = report.counts_for(EntityKind::Station);
    assert!(!report.failed);
    assert_eq!(counts.synced, 1);
    assert_eq!(counts.skipped, 1);
}
