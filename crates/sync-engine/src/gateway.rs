//! Outbound sync gateway
//!
//! Mirrors locally-originated writes to the remote services. Every
//! method takes the write's `SyncOrigin`: reconciler writes are applied
//! locally only, user writes are pushed. A user create persists the
//! local row and the remote-assigned external id inside one transaction,
//! so a failed push leaves no half-synced record behind.
//!
//! Deletes prefer local consistency over blocking: a remote 404 means
//! the record is already gone, any other remote failure is logged and
//! the local delete proceeds (accepted drift).

use fleetsync_core::{
    AppError, EntityKind, LineFields, LineStationFields, ProfileFields, ProfileKind, RideFields,
    StationFields, SyncOrigin, VehicleFields,
};
use fleetsync_remote::DeleteOutcome;
use fleetsync_store::{queries, DbPool};
use sqlx::SqliteConnection;

use crate::codec;
use crate::error::{SyncError, SyncResult};
use crate::remote_api::RemoteApi;

pub struct Gateway<R: RemoteApi> {
    pool: DbPool,
    remote: R,
}

impl<R: RemoteApi> Gateway<R> {
    pub fn new(pool: DbPool, remote: R) -> Self {
        Self { pool, remote }
    }

    async fn begin(&self) -> SyncResult<sqlx::Transaction<'_, sqlx::Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| SyncError::App(AppError::database("Failed to begin transaction", e)))
    }

    async fn commit(&self, tx: sqlx::Transaction<'_, sqlx::Sqlite>) -> SyncResult<()> {
        tx.commit()
            .await
            .map_err(|e| SyncError::App(AppError::database("Failed to commit transaction", e)))
    }

    /// Logs and swallows a remote delete failure, 404 included
    fn tolerate_delete_failure(
        kind: EntityKind,
        external_id: i64,
        outcome: Result<DeleteOutcome, fleetsync_remote::RemoteError>,
    ) {
        match outcome {
            Ok(DeleteOutcome::Deleted) => {}
            Ok(DeleteOutcome::NotFound) => {
                log::debug!(
                    "{} {external_id} already gone remotely, deleting locally",
                    kind.label()
                );
            }
            Err(e) => {
                log::warn!(
                    "Remote delete of {} {external_id} failed ({e}), deleting locally anyway",
                    kind.label()
                );
            }
        }
    }

    // -----------------------------------------------------------------
    // Stations

    pub async fn create_station(
        &self,
        fields: &StationFields,
        origin: SyncOrigin,
    ) -> SyncResult<i64> {
        let mut tx = self.begin().await?;
        let id = queries::stations::create(&mut tx, fields).await?;

        if origin == SyncOrigin::User {
            let line_refs = line_external_ids(&mut tx, &fields.line_ids).await?;
            let payload = codec::station_payload(fields, &line_refs)?;
            let external_id = self.remote.create(EntityKind::Station, &payload).await?;
            queries::stations::set_external_id(&mut tx, id, external_id).await?;
            log::info!("Created station {id} remotely as {external_id}");
        }

        self.commit(tx).await?;
        Ok(id)
    }

    pub async fn update_station(
        &self,
        id: i64,
        fields: &StationFields,
        origin: SyncOrigin,
    ) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::stations::get(&mut tx, id).await?;
        queries::stations::update(&mut tx, id, fields).await?;

        if origin == SyncOrigin::User {
            let line_refs = line_external_ids(&mut tx, &fields.line_ids).await?;
            let payload = codec::station_payload(fields, &line_refs)?;
            match existing.external_id {
                Some(external_id) => {
                    self.remote
                        .update(EntityKind::Station, external_id, &payload)
                        .await?;
                }
                None => {
                    // Never pushed; the update doubles as the first push
                    let external_id = self.remote.create(EntityKind::Station, &payload).await?;
                    queries::stations::set_external_id(&mut tx, id, external_id).await?;
                }
            }
        }

        self.commit(tx).await
    }

    pub async fn delete_station(&self, id: i64, origin: SyncOrigin) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::stations::get(&mut tx, id).await?;

        if origin == SyncOrigin::User {
            if let Some(external_id) = existing.external_id {
                let outcome = self.remote.delete(EntityKind::Station, external_id).await;
                Self::tolerate_delete_failure(EntityKind::Station, external_id, outcome);
            }
        }

        queries::stations::delete(&mut tx, id).await?;
        self.commit(tx).await
    }

    // -----------------------------------------------------------------
    // Lines

    pub async fn create_line(&self, fields: &LineFields, origin: SyncOrigin) -> SyncResult<i64> {
        let mut tx = self.begin().await?;
        let id = queries::lines::create(&mut tx, fields).await?;

        if origin == SyncOrigin::User {
            let departure = station_external_id(&mut tx, fields.departure_station_id).await?;
            let terminus = station_external_id(&mut tx, fields.terminus_station_id).await?;
            let payload = codec::line_payload(fields, departure, terminus)?;
            let external_id = self.remote.create(EntityKind::Line, &payload).await?;
            queries::lines::set_external_id(&mut tx, id, external_id).await?;
            log::info!("Created line {id} remotely as {external_id}");
        }

        self.commit(tx).await?;
        Ok(id)
    }

    pub async fn update_line(
        &self,
        id: i64,
        fields: &LineFields,
        origin: SyncOrigin,
    ) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::lines::get(&mut tx, id).await?;
        queries::lines::update(&mut tx, id, fields).await?;

        if origin == SyncOrigin::User {
            let departure = station_external_id(&mut tx, fields.departure_station_id).await?;
            let terminus = station_external_id(&mut tx, fields.terminus_station_id).await?;
            let payload = codec::line_payload(fields, departure, terminus)?;
            match existing.external_id {
                Some(external_id) => {
                    self.remote
                        .update(EntityKind::Line, external_id, &payload)
                        .await?;
                }
                None => {
                    let external_id = self.remote.create(EntityKind::Line, &payload).await?;
                    queries::lines::set_external_id(&mut tx, id, external_id).await?;
                }
            }
        }

        self.commit(tx).await
    }

    pub async fn delete_line(&self, id: i64, origin: SyncOrigin) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::lines::get(&mut tx, id).await?;

        if origin == SyncOrigin::User {
            if let Some(external_id) = existing.external_id {
                let outcome = self.remote.delete(EntityKind::Line, external_id).await;
                Self::tolerate_delete_failure(EntityKind::Line, external_id, outcome);
            }
        }

        queries::lines::delete(&mut tx, id).await?;
        self.commit(tx).await
    }

    // -----------------------------------------------------------------
    // Line stations

    pub async fn create_line_station(
        &self,
        fields: &LineStationFields,
        origin: SyncOrigin,
    ) -> SyncResult<i64> {
        let mut tx = self.begin().await?;
        let id = queries::line_stations::create(&mut tx, fields).await?;

        if origin == SyncOrigin::User {
            let payload = self.line_station_payload(&mut tx, fields).await?;
            let external_id = self.remote.create(EntityKind::LineStation, &payload).await?;
            queries::line_stations::set_external_id(&mut tx, id, external_id).await?;
            log::info!("Created line station {id} remotely as {external_id}");
        }

        self.commit(tx).await?;
        Ok(id)
    }

    pub async fn update_line_station(
        &self,
        id: i64,
        fields: &LineStationFields,
        origin: SyncOrigin,
    ) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::line_stations::get(&mut tx, id).await?;
        queries::line_stations::update(&mut tx, id, fields).await?;

        if origin == SyncOrigin::User {
            let payload = self.line_station_payload(&mut tx, fields).await?;
            match existing.external_id {
                Some(external_id) => {
                    self.remote
                        .update(EntityKind::LineStation, external_id, &payload)
                        .await?;
                }
                None => {
                    let external_id =
                        self.remote.create(EntityKind::LineStation, &payload).await?;
                    queries::line_stations::set_external_id(&mut tx, id, external_id).await?;
                }
            }
        }

        self.commit(tx).await
    }

    pub async fn delete_line_station(&self, id: i64, origin: SyncOrigin) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::line_stations::get(&mut tx, id).await?;

        if origin == SyncOrigin::User {
            if let Some(external_id) = existing.external_id {
                let outcome = self.remote.delete(EntityKind::LineStation, external_id).await;
                Self::tolerate_delete_failure(EntityKind::LineStation, external_id, outcome);
            }
        }

        queries::line_stations::delete(&mut tx, id).await?;
        self.commit(tx).await
    }

    async fn line_station_payload(
        &self,
        conn: &mut SqliteConnection,
        fields: &LineStationFields,
    ) -> SyncResult<serde_json::Value> {
        let line = queries::lines::get(&mut *conn, fields.line_id).await?;
        let station = queries::stations::get(&mut *conn, fields.station_id).await?;
        Ok(codec::line_station_payload(
            fields,
            line.external_id.unwrap_or(line.id),
            station.external_id.unwrap_or(station.id),
        ))
    }

    // -----------------------------------------------------------------
    // Rides

    pub async fn create_ride(&self, fields: &RideFields, origin: SyncOrigin) -> SyncResult<i64> {
        let mut tx = self.begin().await?;
        let id = queries::rides::create(&mut tx, fields).await?;

        if origin == SyncOrigin::User {
            let line = queries::lines::get(&mut tx, fields.line_id).await?;
            let payload = codec::ride_payload(fields, line.external_id.unwrap_or(line.id))?;
            let external_id = self.remote.create(EntityKind::Ride, &payload).await?;
            queries::rides::set_external_id(&mut tx, id, external_id).await?;
            log::info!("Created ride {id} remotely as {external_id}");
        }

        self.commit(tx).await?;
        Ok(id)
    }

    pub async fn update_ride(
        &self,
        id: i64,
        fields: &RideFields,
        origin: SyncOrigin,
    ) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::rides::get(&mut tx, id).await?;
        queries::rides::update(&mut tx, id, fields).await?;

        if origin == SyncOrigin::User {
            let line = queries::lines::get(&mut tx, fields.line_id).await?;
            let payload = codec::ride_payload(fields, line.external_id.unwrap_or(line.id))?;
            match existing.external_id {
                Some(external_id) => {
                    self.remote
                        .update(EntityKind::Ride, external_id, &payload)
                        .await?;
                }
                None => {
                    let external_id = self.remote.create(EntityKind::Ride, &payload).await?;
                    queries::rides::set_external_id(&mut tx, id, external_id).await?;
                }
            }
        }

        self.commit(tx).await
    }

    pub async fn delete_ride(&self, id: i64, origin: SyncOrigin) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::rides::get(&mut tx, id).await?;

        if origin == SyncOrigin::User {
            if let Some(external_id) = existing.external_id {
                let outcome = self.remote.delete(EntityKind::Ride, external_id).await;
                Self::tolerate_delete_failure(EntityKind::Ride, external_id, outcome);
            }
        }

        queries::rides::delete(&mut tx, id).await?;
        self.commit(tx).await
    }

    // -----------------------------------------------------------------
    // Vehicles

    pub async fn create_vehicle(
        &self,
        fields: &VehicleFields,
        origin: SyncOrigin,
    ) -> SyncResult<i64> {
        let mut tx = self.begin().await?;

        if origin == SyncOrigin::User {
            if let Some(existing) =
                queries::vehicles::get_by_plate_number(&mut tx, &fields.plate_number).await?
            {
                return Err(SyncError::App(AppError::DuplicateRecord {
                    entity: "Vehicle".to_string(),
                    details: format!(
                        "Vehicle with plate number {} already exists (local id {})",
                        fields.plate_number, existing.id
                    ),
                }));
            }
        }

        let id = queries::vehicles::create(&mut tx, fields).await?;

        if origin == SyncOrigin::User {
            let payload = codec::vehicle_payload(fields)?;
            let external_id = self.remote.create(EntityKind::Vehicle, &payload).await?;
            queries::vehicles::set_external_id(&mut tx, id, external_id).await?;
        }

        self.commit(tx).await?;
        Ok(id)
    }

    pub async fn update_vehicle(
        &self,
        id: i64,
        fields: &VehicleFields,
        origin: SyncOrigin,
    ) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::vehicles::get(&mut tx, id).await?;
        queries::vehicles::update(&mut tx, id, fields).await?;

        if origin == SyncOrigin::User {
            let payload = codec::vehicle_payload(fields)?;
            match existing.external_id {
                Some(external_id) => {
                    self.remote
                        .update(EntityKind::Vehicle, external_id, &payload)
                        .await?;
                }
                None => {
                    let external_id = self.remote.create(EntityKind::Vehicle, &payload).await?;
                    queries::vehicles::set_external_id(&mut tx, id, external_id).await?;
                }
            }
        }

        self.commit(tx).await
    }

    pub async fn delete_vehicle(&self, id: i64, origin: SyncOrigin) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::vehicles::get(&mut tx, id).await?;

        if origin == SyncOrigin::User {
            if let Some(external_id) = existing.external_id {
                let outcome = self.remote.delete(EntityKind::Vehicle, external_id).await;
                Self::tolerate_delete_failure(EntityKind::Vehicle, external_id, outcome);
            }
        }

        queries::vehicles::delete(&mut tx, id).await?;
        self.commit(tx).await
    }

    // -----------------------------------------------------------------
    // Profiles

    /// Creates a profile, or updates the existing one when the
    /// (phone_number, username) business key already exists
    pub async fn create_profile(
        &self,
        fields: &ProfileFields,
        origin: SyncOrigin,
    ) -> SyncResult<i64> {
        if origin == SyncOrigin::User {
            let mut conn = self.pool.acquire().await.map_err(|e| {
                SyncError::App(AppError::database("Failed to acquire connection", e))
            })?;
            if let Some(existing) = queries::profiles::get_by_business_key(
                &mut conn,
                fields.kind,
                &fields.phone_number,
                &fields.username,
            )
            .await?
            {
                log::info!(
                    "{} with phone number {} and username {} already exists, updating instead",
                    profile_entity(fields.kind).label(),
                    fields.phone_number,
                    fields.username
                );
                drop(conn);
                let mut merged = fields.clone();
                merged.external_id = existing.external_id;
                self.update_profile(existing.id, &merged, origin).await?;
                return Ok(existing.id);
            }
        }

        let mut tx = self.begin().await?;
        let id = queries::profiles::create(&mut tx, fields).await?;

        if origin == SyncOrigin::User {
            let payload = codec::profile_payload(fields)?;
            let external_id = self
                .remote
                .create(profile_entity(fields.kind), &payload)
                .await?;
            queries::profiles::set_external_id(&mut tx, id, external_id).await?;
        }

        self.commit(tx).await?;
        Ok(id)
    }

    pub async fn update_profile(
        &self,
        id: i64,
        fields: &ProfileFields,
        origin: SyncOrigin,
    ) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::profiles::get(&mut tx, id).await?;
        queries::profiles::update(&mut tx, id, fields).await?;

        if origin == SyncOrigin::User {
            let payload = codec::profile_payload(fields)?;
            match existing.external_id {
                Some(external_id) => {
                    self.remote
                        .update(profile_entity(fields.kind), external_id, &payload)
                        .await?;
                }
                None => {
                    let external_id = self
                        .remote
                        .create(profile_entity(fields.kind), &payload)
                        .await?;
                    queries::profiles::set_external_id(&mut tx, id, external_id).await?;
                }
            }
        }

        self.commit(tx).await
    }

    pub async fn delete_profile(&self, id: i64, origin: SyncOrigin) -> SyncResult<()> {
        let mut tx = self.begin().await?;
        let existing = queries::profiles::get(&mut tx, id).await?;

        if origin == SyncOrigin::User {
            if let Some(external_id) = existing.external_id {
                let kind = profile_entity(existing.kind);
                let outcome = self.remote.delete(kind, external_id).await;
                Self::tolerate_delete_failure(kind, external_id, outcome);
            }
        }

        queries::profiles::delete(&mut tx, id).await?;
        self.commit(tx).await
    }
}

fn profile_entity(kind: ProfileKind) -> EntityKind {
    match kind {
        ProfileKind::Driver => EntityKind::Driver,
        ProfileKind::Passenger => EntityKind::Passenger,
    }
}

/// Maps local line ids to the external ids a payload must carry,
/// falling back to the local id for never-pushed lines
async fn line_external_ids(
    conn: &mut SqliteConnection,
    line_ids: &[i64],
) -> SyncResult<Vec<i64>> {
    let mut refs = Vec::with_capacity(line_ids.len());
    for id in line_ids {
        let line = queries::lines::get(&mut *conn, *id).await?;
        refs.push(line.external_id.unwrap_or(line.id));
    }
    Ok(refs)
}

async fn station_external_id(
    conn: &mut SqliteConnection,
    station_id: Option<i64>,
) -> SyncResult<Option<i64>> {
    match station_id {
        Some(id) => {
            let station = queries::stations::get(conn, id).await?;
            Ok(Some(station.external_id.unwrap_or(station.id)))
        }
        None => Ok(None),
    }
}
