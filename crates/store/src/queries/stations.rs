//! Station database operations
//!
//! Functions take a `SqliteConnection` so callers can group the writes of
//! one record apply (including its line links) into a single transaction.

use fleetsync_core::{AppError, Station, StationFields};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Creates a new station and returns its local id
pub async fn create(conn: &mut SqliteConnection, fields: &StationFields) -> Result<i64, AppError> {
    fields.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO stations (
            external_id, name_ar, name_en, name_fr,
            latitude, longitude, paths, schedule, changes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fields.external_id)
    .bind(&fields.name_ar)
    .bind(&fields.name_en)
    .bind(&fields.name_fr)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(&fields.paths)
    .bind(&fields.schedule)
    .bind(&fields.changes)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to create station", e))?;

    let id = result.last_insert_rowid();
    set_line_links(conn, id, &fields.line_ids).await?;
    Ok(id)
}

/// Updates an existing station, replacing its line links
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &StationFields,
) -> Result<(), AppError> {
    fields.validate()?;

    sqlx::query(
        r#"
        UPDATE stations SET
            external_id = ?, name_ar = ?, name_en = ?, name_fr = ?,
            latitude = ?, longitude = ?, paths = ?, schedule = ?, changes = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.external_id)
    .bind(&fields.name_ar)
    .bind(&fields.name_en)
    .bind(&fields.name_fr)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(&fields.paths)
    .bind(&fields.schedule)
    .bind(&fields.changes)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to update station", e))?;

    set_line_links(conn, id, &fields.line_ids).await?;
    Ok(())
}

/// Deletes a station (line links cascade)
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM stations WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to delete station", e))?;
    Ok(())
}

/// Records the remote-assigned identifier
pub async fn set_external_id(
    conn: &mut SqliteConnection,
    id: i64,
    external_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE stations SET external_id = ? WHERE id = ?")
        .bind(external_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to set station external id", e))?;
    Ok(())
}

/// Gets a station by local id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Station, AppError> {
    let row = sqlx::query("SELECT * FROM stations WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch station", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Station".to_string(),
            identifier: id.to_string(),
        })?;

    let mut station = row_to_station(row)?;
    station.line_ids = line_links(conn, station.id).await?;
    Ok(station)
}

/// Gets a station by its remote identifier
pub async fn get_by_external_id(
    conn: &mut SqliteConnection,
    external_id: i64,
) -> Result<Option<Station>, AppError> {
    let row = sqlx::query("SELECT * FROM stations WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch station by external id", e))?;

    match row {
        Some(row) => {
            let mut station = row_to_station(row)?;
            station.line_ids = line_links(conn, station.id).await?;
            Ok(Some(station))
        }
        None => Ok(None),
    }
}

/// Lists all stations
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<Station>, AppError> {
    let rows = sqlx::query("SELECT * FROM stations ORDER BY id")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list stations", e))?;

    let mut stations = Vec::with_capacity(rows.len());
    for row in rows {
        let mut station = row_to_station(row)?;
        station.line_ids = line_links(conn, station.id).await?;
        stations.push(station);
    }
    Ok(stations)
}

/// Replaces the station's line links
async fn set_line_links(
    conn: &mut SqliteConnection,
    station_id: i64,
    line_ids: &[i64],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM station_lines WHERE station_id = ?")
        .bind(station_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to clear station line links", e))?;

    for line_id in line_ids {
        sqlx::query("INSERT OR IGNORE INTO station_lines (station_id, line_id) VALUES (?, ?)")
            .bind(station_id)
            .bind(line_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database("Failed to link station to line", e))?;
    }
    Ok(())
}

/// Loads the local ids of lines serving a station
async fn line_links(conn: &mut SqliteConnection, station_id: i64) -> Result<Vec<i64>, AppError> {
    sqlx::query_scalar("SELECT line_id FROM station_lines WHERE station_id = ? ORDER BY line_id")
        .bind(station_id)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database("Failed to load station line links", e))
}

fn row_to_station(row: SqliteRow) -> Result<Station, AppError> {
    Ok(Station {
        id: row.get("id"),
        external_id: row.get("external_id"),
        name_ar: row.get("name_ar"),
        name_en: row.get("name_en"),
        name_fr: row.get("name_fr"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        paths: row.get("paths"),
        schedule: row.get("schedule"),
        changes: row.get("changes"),
        line_ids: Vec::new(),
    })
}
