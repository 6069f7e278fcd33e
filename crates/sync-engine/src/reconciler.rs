//! Reconciler: per-entity fetch / index / diff-apply / sweep / watermark
//!
//! One pass per entity kind, run in dependency order so referenced
//! entities exist before their dependents. Each remote record is applied
//! inside its own transaction; a single bad record is logged and counted
//! as skipped, while a collection-fetch failure aborts the pass without
//! touching the watermark.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetsync_core::{AppError, EntityKind, ProfileKind, Result as CoreResult};
use serde_json::Value;
use sqlx::SqliteConnection;
use tokio::sync::Mutex;

use fleetsync_store::{queries, DbPool};

use crate::codec::{
    self, RemoteLine, RemoteLineStation, RemoteProfile, RemoteRide, RemoteStation, RemoteVehicle,
};
use crate::error::{SyncError, SyncResult};
use crate::fingerprint;
use crate::remote_api::RemoteApi;
use crate::resolver;
use crate::types::{SyncCounts, SyncOptions, SyncReport};

/// Whether an apply changed the local store
enum Applied {
    Changed,
    Unchanged,
    Filtered(String),
}

/// Drives reconciliation passes against a remote and the local store
pub struct Reconciler<R: RemoteApi> {
    pool: DbPool,
    remote: R,
    options: SyncOptions,
    // One pass at a time; a second run() call fails fast instead of queuing
    guard: Arc<Mutex<()>>,
}

impl<R: RemoteApi> Reconciler<R> {
    pub fn new(pool: DbPool, remote: R, options: SyncOptions) -> Self {
        Self {
            pool,
            remote,
            options,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Runs passes for the selected entity kinds in dependency order
    ///
    /// Returns `SyncError::InProgress` when another run holds the guard.
    /// Pass failures are recorded in the report with their partial
    /// counts; they do not abort the remaining passes.
    pub async fn run(&self, kinds: &[EntityKind]) -> SyncResult<SyncReport> {
        let _guard = self.guard.try_lock().map_err(|_| SyncError::InProgress)?;

        let mut report = SyncReport::default();
        for kind in EntityKind::DEPENDENCY_ORDER {
            if !kinds.contains(&kind) {
                continue;
            }
            let mut counts = SyncCounts::default();
            match self.run_pass(kind, &mut counts).await {
                Ok(()) => report.record(kind, counts),
                Err(e) => report.record_failure(kind, counts, &e.user_message()),
            }
        }
        Ok(report)
    }

    async fn run_pass(&self, kind: EntityKind, counts: &mut SyncCounts) -> SyncResult<()> {
        let started_at = Utc::now();

        let since = if self.options.incremental_fetch {
            let mut conn = self.acquire().await?;
            queries::watermarks::get(&mut conn, kind).await?
        } else {
            None
        };
        let incremental = since.is_some();

        log::info!(
            "Fetching {} collection{}",
            kind.name(),
            since.map(|s| format!(" updated since {s}")).unwrap_or_default()
        );
        let records = self.remote.fetch_collection(kind, since).await?;
        log::info!("Remote returned {} {}", records.len(), kind.name());

        let mut seen = HashSet::new();
        for value in &records {
            match self.apply_record(kind, value, started_at, &mut seen).await {
                Ok(Applied::Changed) => counts.synced += 1,
                Ok(Applied::Unchanged) => counts.skipped += 1,
                Ok(Applied::Filtered(reason)) => {
                    log::info!("Skipping {} record: {reason}", kind.label());
                    counts.skipped += 1;
                }
                Err(e) => {
                    match &e {
                        SyncError::App(app) => log::warn!(
                            "Failed to apply {} record ({}): {app}",
                            kind.label(),
                            app.severity()
                        ),
                        other => {
                            log::warn!("Failed to apply {} record: {other}", kind.label())
                        }
                    }
                    counts.skipped += 1;
                }
            }
        }

        // Sweeping a partial enumeration would delete live records, so an
        // incremental fetch always skips it
        if self.options.sweep.allows(kind) && !incremental {
            counts.synced += self.sweep(kind, &seen).await?;
        }

        let mut conn = self.acquire().await?;
        queries::watermarks::set(&mut conn, kind, started_at).await?;
        Ok(())
    }

    async fn acquire(&self) -> SyncResult<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| SyncError::App(AppError::database("Failed to acquire connection", e)))
    }

    /// Applies one remote record inside its own transaction
    async fn apply_record(
        &self,
        kind: EntityKind,
        value: &Value,
        sync_time: DateTime<Utc>,
        seen: &mut HashSet<i64>,
    ) -> SyncResult<Applied> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::App(AppError::database("Failed to begin transaction", e)))?;

        let applied = match kind {
            EntityKind::Station => apply_station(&mut tx, value, seen).await?,
            EntityKind::Line => apply_line(&mut tx, value, seen).await?,
            EntityKind::LineStation => apply_line_station(&mut tx, value, seen).await?,
            EntityKind::Vehicle => apply_vehicle(&mut tx, value, seen).await?,
            EntityKind::Driver => {
                apply_profile(&mut tx, value, ProfileKind::Driver, sync_time, seen).await?
            }
            EntityKind::Passenger => {
                apply_profile(&mut tx, value, ProfileKind::Passenger, sync_time, seen).await?
            }
            EntityKind::Ride => apply_ride(&mut tx, value, seen).await?,
        };

        tx.commit()
            .await
            .map_err(|e| SyncError::App(AppError::database("Failed to commit record", e)))?;
        Ok(applied)
    }

    /// Deletes local records whose remote counterpart disappeared
    async fn sweep(&self, kind: EntityKind, seen: &HashSet<i64>) -> SyncResult<u64> {
        let mut conn = self.acquire().await?;
        let mut deleted = 0;

        let stale: Vec<i64> = match kind {
            EntityKind::Station => queries::stations::list_all(&mut conn)
                .await?
                .into_iter()
                .filter_map(|s| s.external_id.filter(|e| !seen.contains(e)).map(|_| s.id))
                .collect(),
            EntityKind::Line => queries::lines::list_all(&mut conn)
                .await?
                .into_iter()
                .filter_map(|l| l.external_id.filter(|e| !seen.contains(e)).map(|_| l.id))
                .collect(),
            EntityKind::LineStation => queries::line_stations::list_all(&mut conn)
                .await?
                .into_iter()
                .filter_map(|ls| ls.external_id.filter(|e| !seen.contains(e)).map(|_| ls.id))
                .collect(),
            EntityKind::Vehicle => queries::vehicles::list_all(&mut conn)
                .await?
                .into_iter()
                .filter_map(|v| v.external_id.filter(|e| !seen.contains(e)).map(|_| v.id))
                .collect(),
            EntityKind::Driver | EntityKind::Passenger => {
                let profile_kind = if kind == EntityKind::Driver {
                    ProfileKind::Driver
                } else {
                    ProfileKind::Passenger
                };
                queries::profiles::list_all(&mut conn, profile_kind)
                    .await?
                    .into_iter()
                    .filter_map(|p| p.external_id.filter(|e| !seen.contains(e)).map(|_| p.id))
                    .collect()
            }
            EntityKind::Ride => queries::rides::list_all(&mut conn)
                .await?
                .into_iter()
                .filter_map(|r| r.external_id.filter(|e| !seen.contains(e)).map(|_| r.id))
                .collect(),
        };

        for id in stale {
            log::info!("Sweeping {} with local id {id}, gone remotely", kind.label());
            match kind {
                EntityKind::Station => queries::stations::delete(&mut conn, id).await?,
                EntityKind::Line => queries::lines::delete(&mut conn, id).await?,
                EntityKind::LineStation => queries::line_stations::delete(&mut conn, id).await?,
                EntityKind::Vehicle => queries::vehicles::delete(&mut conn, id).await?,
                EntityKind::Driver | EntityKind::Passenger => {
                    queries::profiles::delete(&mut conn, id).await?
                }
                EntityKind::Ride => queries::rides::delete(&mut conn, id).await?,
            }
            deleted += 1;
        }
        Ok(deleted)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value) -> CoreResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| AppError::InvalidJsonField {
        field: "payload".to_string(),
        reason: e.to_string(),
    })
}

fn is_test_value(text: &str) -> bool {
    text.to_lowercase().starts_with("test")
}

async fn apply_station(
    conn: &mut SqliteConnection,
    value: &Value,
    seen: &mut HashSet<i64>,
) -> SyncResult<Applied> {
    let remote: RemoteStation = decode(value)?;
    let Some(external_id) = remote.id else {
        return Ok(Applied::Filtered("missing id".to_string()));
    };
    let names = [&remote.name_ar, &remote.name_en, &remote.name_fr];
    if names.iter().any(|n| n.trim().is_empty()) {
        return Ok(Applied::Filtered(format!(
            "incomplete names for external id {external_id}"
        )));
    }
    if names.iter().any(|n| is_test_value(n)) {
        return Ok(Applied::Filtered(format!(
            "test sentinel for external id {external_id}"
        )));
    }
    seen.insert(external_id);

    // Link only lines that already exist locally; the line pass owns
    // creating them
    let mut line_ids = Vec::new();
    for line_external_id in &remote.lines {
        if let Some(line) = queries::lines::get_by_external_id(conn, *line_external_id).await? {
            line_ids.push(line.id);
        }
    }

    let fields = codec::station_fields(&remote, line_ids);
    match queries::stations::get_by_external_id(conn, external_id).await? {
        Some(existing) => {
            if fingerprint::station_fingerprint(&existing.fields())?
                == fingerprint::station_fingerprint(&fields)?
            {
                return Ok(Applied::Unchanged);
            }
            queries::stations::update(conn, existing.id, &fields).await?;
            log::debug!("Updated station with external id {external_id}");
        }
        None => {
            queries::stations::create(conn, &fields).await?;
            log::debug!("Created station with external id {external_id}");
        }
    }
    Ok(Applied::Changed)
}

async fn apply_line(
    conn: &mut SqliteConnection,
    value: &Value,
    seen: &mut HashSet<i64>,
) -> SyncResult<Applied> {
    let remote: RemoteLine = decode(value)?;
    let Some(external_id) = remote.id else {
        return Ok(Applied::Filtered("missing id".to_string()));
    };
    if remote.code.trim().is_empty() || remote.enterprise_code.trim().is_empty() {
        return Ok(Applied::Filtered(format!(
            "incomplete codes for external id {external_id}"
        )));
    }
    if is_test_value(&remote.code) || is_test_value(&remote.enterprise_code) {
        return Ok(Applied::Filtered(format!(
            "test sentinel for external id {external_id}"
        )));
    }
    seen.insert(external_id);

    let departure = match remote.departure_station_id() {
        Some(ext) => Some(resolver::resolve_station(conn, ext).await?),
        None => None,
    };
    let terminus = match remote.terminus_station_id() {
        Some(ext) => Some(resolver::resolve_station(conn, ext).await?),
        None => None,
    };

    let fields = codec::line_fields(&remote, departure, terminus);
    match queries::lines::get_by_external_id(conn, external_id).await? {
        Some(existing) => {
            if fingerprint::line_fingerprint(&existing.fields())?
                == fingerprint::line_fingerprint(&fields)?
            {
                return Ok(Applied::Unchanged);
            }
            queries::lines::update(conn, existing.id, &fields).await?;
            log::debug!("Updated line with external id {external_id}");
        }
        None => {
            queries::lines::create(conn, &fields).await?;
            log::debug!("Created line with external id {external_id}");
        }
    }
    Ok(Applied::Changed)
}

async fn apply_line_station(
    conn: &mut SqliteConnection,
    value: &Value,
    seen: &mut HashSet<i64>,
) -> SyncResult<Applied> {
    let remote: RemoteLineStation = decode(value)?;
    let Some(external_id) = remote.id else {
        return Ok(Applied::Filtered("missing id".to_string()));
    };
    let (Some(line_ext), Some(station_ext)) = (remote.line_id(), remote.station_id()) else {
        return Ok(Applied::Filtered(format!(
            "missing line or station reference for external id {external_id}"
        )));
    };
    seen.insert(external_id);

    let line_id = resolver::resolve_line(conn, line_ext).await?;
    let station_id = resolver::resolve_station(conn, station_ext).await?;

    let fields = codec::line_station_fields(&remote, line_id, station_id);
    match queries::line_stations::get_by_external_id(conn, external_id).await? {
        Some(existing) => {
            if fingerprint::line_station_fingerprint(&existing.fields())
                == fingerprint::line_station_fingerprint(&fields)
            {
                return Ok(Applied::Unchanged);
            }
            queries::line_stations::update(conn, existing.id, &fields).await?;
            log::debug!("Updated line station with external id {external_id}");
        }
        None => {
            queries::line_stations::create(conn, &fields).await?;
            log::debug!("Created line station with external id {external_id}");
        }
    }
    Ok(Applied::Changed)
}

async fn apply_vehicle(
    conn: &mut SqliteConnection,
    value: &Value,
    seen: &mut HashSet<i64>,
) -> SyncResult<Applied> {
    let remote: RemoteVehicle = decode(value)?;
    let Some(external_id) = remote.id else {
        return Ok(Applied::Filtered("missing id".to_string()));
    };
    if remote.plate_number.trim().is_empty() {
        return Ok(Applied::Filtered(format!(
            "missing plate number for external id {external_id}"
        )));
    }
    seen.insert(external_id);

    let fields = codec::vehicle_fields(&remote);
    match queries::vehicles::get_by_external_id(conn, external_id).await? {
        Some(existing) => {
            if fingerprint::vehicle_fingerprint(&existing.fields())?
                == fingerprint::vehicle_fingerprint(&fields)?
            {
                return Ok(Applied::Unchanged);
            }
            queries::vehicles::update(conn, existing.id, &fields).await?;
        }
        None => {
            queries::vehicles::create(conn, &fields).await?;
        }
    }
    Ok(Applied::Changed)
}

async fn apply_profile(
    conn: &mut SqliteConnection,
    value: &Value,
    kind: ProfileKind,
    sync_time: DateTime<Utc>,
    seen: &mut HashSet<i64>,
) -> SyncResult<Applied> {
    let remote: RemoteProfile = decode(value)?;
    let Some(external_id) = remote.id else {
        return Ok(Applied::Filtered("missing id".to_string()));
    };
    if remote.first_name.trim().is_empty() || remote.last_name.trim().is_empty() {
        return Ok(Applied::Filtered(format!(
            "incomplete name for external id {external_id}"
        )));
    }
    seen.insert(external_id);

    let fields = codec::profile_fields(&remote, kind, sync_time);
    match queries::profiles::get_by_external_id(conn, kind, external_id).await? {
        Some(existing) => {
            if fingerprint::profile_fingerprint(&existing.fields())?
                == fingerprint::profile_fingerprint(&fields)?
            {
                // Content unchanged, only refresh the sync stamp
                queries::profiles::set_last_sync(conn, existing.id, sync_time).await?;
                return Ok(Applied::Unchanged);
            }
            queries::profiles::update(conn, existing.id, &fields).await?;
        }
        None => {
            queries::profiles::create(conn, &fields).await?;
        }
    }
    Ok(Applied::Changed)
}

async fn apply_ride(
    conn: &mut SqliteConnection,
    value: &Value,
    seen: &mut HashSet<i64>,
) -> SyncResult<Applied> {
    let remote: RemoteRide = decode(value)?;
    let Some(external_id) = remote.id else {
        return Ok(Applied::Filtered("missing id".to_string()));
    };
    let Some(line_ext) = remote.line else {
        return Ok(Applied::Filtered(format!(
            "missing line reference for external id {external_id}"
        )));
    };
    seen.insert(external_id);

    let line_id = resolver::resolve_line(conn, line_ext).await?;

    let fields = codec::ride_fields(&remote, line_id);
    match queries::rides::get_by_external_id(conn, external_id).await? {
        Some(existing) => {
            if fingerprint::ride_fingerprint(&existing.fields())?
                == fingerprint::ride_fingerprint(&fields)?
            {
                return Ok(Applied::Unchanged);
            }
            queries::rides::update(conn, existing.id, &fields).await?;
        }
        None => {
            queries::rides::create(conn, &fields).await?;
        }
    }
    Ok(Applied::Changed)
}
