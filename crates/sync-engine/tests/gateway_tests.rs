//! Outbound gateway integration tests

mod support;

use fleetsync_core::{
    Direction, EntityKind, LineFields, LineStationFields, ProfileFields, ProfileKind,
    StationFields, SyncOrigin, VehicleFields,
};
use fleetsync_store::{connect_in_memory, queries, DbPool};
use fleetsync_sync_engine::{Gateway, SyncError};
use support::FakeRemote;

async fn setup() -> (DbPool, FakeRemote) {
    (connect_in_memory().await.unwrap(), FakeRemote::new())
}

fn station_fields(name: &str) -> StationFields {
    StationFields {
        name_ar: name.to_string(),
        name_en: name.to_string(),
        name_fr: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_user_create_pushes_and_stores_external_id() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let id = gateway
        .create_station(&station_fields("Central"), SyncOrigin::User)
        .await
        .unwrap();

    assert_eq!(remote.created_count(), 1);
    let (kind, payload) = remote.created.lock().unwrap()[0].clone();
    assert_eq!(kind, EntityKind::Station);
    assert_eq!(payload["nameEn"], "Central");

    let mut conn = pool.acquire().await.unwrap();
    let station = queries::stations::get(&mut conn, id).await.unwrap();
    assert_eq!(station.external_id, Some(1000));
}

#[tokio::test]
async fn test_reconcile_origin_never_pushes() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    gateway
        .create_station(&station_fields("Mirrored"), SyncOrigin::Reconcile)
        .await
        .unwrap();

    assert_eq!(remote.created_count(), 0);
}

#[tokio::test]
async fn test_failed_push_rolls_back_local_create() {
    let (pool, remote) = setup().await;
    remote.fail_creates(1);
    let gateway = Gateway::new(pool.clone(), &remote);

    let result = gateway
        .create_station(&station_fields("Doomed"), SyncOrigin::User)
        .await;
    assert!(matches!(result, Err(SyncError::Remote(_))));

    // The local insert rolled back with the failed push
    let mut conn = pool.acquire().await.unwrap();
    assert!(queries::stations::list_all(&mut conn)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_update_without_external_id_creates_remotely() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let id = gateway
        .create_station(&station_fields("Local-only"), SyncOrigin::Reconcile)
        .await
        .unwrap();

    let mut fields = station_fields("Renamed");
    gateway
        .update_station(id, &fields, SyncOrigin::User)
        .await
        .unwrap();

    assert_eq!(remote.created_count(), 1);
    assert!(remote.updated.lock().unwrap().is_empty());

    // A later update now goes through PUT
    fields.name_en = "Renamed again".to_string();
    gateway
        .update_station(id, &fields, SyncOrigin::User)
        .await
        .unwrap();
    let updated = remote.updated.lock().unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].1, 1000);
}

#[tokio::test]
async fn test_delete_proceeds_locally_on_remote_failure() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let id = gateway
        .create_station(&station_fields("Fragile"), SyncOrigin::User)
        .await
        .unwrap();

    remote.answer_deletes_with(500);
    gateway.delete_station(id, SyncOrigin::User).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert!(queries::stations::list_all(&mut conn)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_tolerates_already_gone() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let id = gateway
        .create_station(&station_fields("Ghost"), SyncOrigin::User)
        .await
        .unwrap();

    remote.answer_deletes_with(404);
    gateway.delete_station(id, SyncOrigin::User).await.unwrap();

    assert_eq!(remote.deleted.lock().unwrap().len(), 1);
    let mut conn = pool.acquire().await.unwrap();
    assert!(queries::stations::list_all(&mut conn)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_without_external_id_is_local_only() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let id = gateway
        .create_station(&station_fields("Unpushed"), SyncOrigin::Reconcile)
        .await
        .unwrap();
    gateway.delete_station(id, SyncOrigin::User).await.unwrap();

    assert!(remote.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_line_payload_carries_station_references() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let station_id = gateway
        .create_station(&station_fields("Depart"), SyncOrigin::User)
        .await
        .unwrap();

    let fields = LineFields {
        code: "L1".to_string(),
        enterprise_code: "E1".to_string(),
        departure_station_id: Some(station_id),
        ..Default::default()
    };
    gateway.create_line(&fields, SyncOrigin::User).await.unwrap();

    let created = remote.created.lock().unwrap();
    let (_, payload) = &created[1];
    // The station was pushed first, so the line references its external id
    assert_eq!(payload["departureStation"]["id"], 1000);
    assert_eq!(payload["terminusStation"], serde_json::json!({}));
}

#[tokio::test]
async fn test_line_station_duplicate_order_never_reaches_remote() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let station_id = gateway
        .create_station(&station_fields("Stop"), SyncOrigin::User)
        .await
        .unwrap();
    let line_id = gateway
        .create_line(
            &LineFields {
                code: "L1".to_string(),
                enterprise_code: "E1".to_string(),
                ..Default::default()
            },
            SyncOrigin::User,
        )
        .await
        .unwrap();

    let fields = LineStationFields {
        line_id,
        station_id,
        order: 3,
        direction: Direction::Going,
        ..Default::default()
    };
    gateway
        .create_line_station(&fields, SyncOrigin::User)
        .await
        .unwrap();

    let before = remote.created_count();
    let err = gateway
        .create_line_station(&fields, SyncOrigin::User)
        .await
        .unwrap_err();
    assert!(err.user_message().contains("Order 3"));
    assert_eq!(remote.created_count(), before);
}

#[tokio::test]
async fn test_duplicate_profile_business_key_updates_instead() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let mut fields = ProfileFields::new(ProfileKind::Driver);
    fields.first_name = "Amine".to_string();
    fields.last_name = "B".to_string();
    fields.phone_number = "0550".to_string();
    fields.username = "amine".to_string();
    fields.driver_number = "D-1".to_string();

    let first_id = gateway
        .create_profile(&fields, SyncOrigin::User)
        .await
        .unwrap();
    assert_eq!(remote.created_count(), 1);

    // Same business key again: updated, not duplicated
    fields.driver_number = "D-2".to_string();
    let second_id = gateway
        .create_profile(&fields, SyncOrigin::User)
        .await
        .unwrap();
    assert_eq!(first_id, second_id);
    assert_eq!(remote.created_count(), 1);
    assert_eq!(remote.updated.lock().unwrap().len(), 1);

    let mut conn = pool.acquire().await.unwrap();
    let profiles = queries::profiles::list_all(&mut conn, ProfileKind::Driver)
        .await
        .unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].driver_number, "D-2");
}

#[tokio::test]
async fn test_duplicate_vehicle_plate_rejected() {
    let (pool, remote) = setup().await;
    let gateway = Gateway::new(pool.clone(), &remote);

    let fields = VehicleFields {
        plate_number: "16-123-45".to_string(),
        ..Default::default()
    };
    gateway
        .create_vehicle(&fields, SyncOrigin::User)
        .await
        .unwrap();

    let err = gateway
        .create_vehicle(&fields, SyncOrigin::User)
        .await
        .unwrap_err();
    assert!(err.user_message().contains("16-123-45"));
    assert_eq!(remote.created_count(), 1);
}
