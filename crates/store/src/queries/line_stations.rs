//! LineStation database operations
//!
//! Every write path enforces the `(line_id, direction, stop_order)`
//! uniqueness rule with an explicit pre-check so callers get an
//! actionable message instead of a raw constraint violation.

use fleetsync_core::{AppError, Direction, LineStation, LineStationFields};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Creates a new line station and returns its local id
pub async fn create(
    conn: &mut SqliteConnection,
    fields: &LineStationFields,
) -> Result<i64, AppError> {
    fields.validate()?;
    check_order_free(conn, fields, None).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO line_stations (
            external_id, line_id, station_id, stop_order, direction,
            lat, lng, stop_duration, radius, alertable, efficient, duration
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fields.external_id)
    .bind(fields.line_id)
    .bind(fields.station_id)
    .bind(fields.order)
    .bind(fields.direction.as_token())
    .bind(fields.lat)
    .bind(fields.lng)
    .bind(fields.stop_duration)
    .bind(fields.radius)
    .bind(fields.alertable)
    .bind(fields.efficient)
    .bind(fields.duration)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to create line station", e))?;

    Ok(result.last_insert_rowid())
}

/// Updates an existing line station
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &LineStationFields,
) -> Result<(), AppError> {
    fields.validate()?;
    check_order_free(conn, fields, Some(id)).await?;

    sqlx::query(
        r#"
        UPDATE line_stations SET
            external_id = ?, line_id = ?, station_id = ?, stop_order = ?,
            direction = ?, lat = ?, lng = ?, stop_duration = ?, radius = ?,
            alertable = ?, efficient = ?, duration = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.external_id)
    .bind(fields.line_id)
    .bind(fields.station_id)
    .bind(fields.order)
    .bind(fields.direction.as_token())
    .bind(fields.lat)
    .bind(fields.lng)
    .bind(fields.stop_duration)
    .bind(fields.radius)
    .bind(fields.alertable)
    .bind(fields.efficient)
    .bind(fields.duration)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to update line station", e))?;
    Ok(())
}

/// Deletes a line station
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM line_stations WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to delete line station", e))?;
    Ok(())
}

/// Records the remote-assigned identifier
pub async fn set_external_id(
    conn: &mut SqliteConnection,
    id: i64,
    external_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE line_stations SET external_id = ? WHERE id = ?")
        .bind(external_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to set line station external id", e))?;
    Ok(())
}

/// Gets a line station by local id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<LineStation, AppError> {
    let row = sqlx::query("SELECT * FROM line_stations WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch line station", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "LineStation".to_string(),
            identifier: id.to_string(),
        })?;
    row_to_line_station(row)
}

/// Gets a line station by its remote identifier
pub async fn get_by_external_id(
    conn: &mut SqliteConnection,
    external_id: i64,
) -> Result<Option<LineStation>, AppError> {
    sqlx::query("SELECT * FROM line_stations WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch line station by external id", e))?
        .map(row_to_line_station)
        .transpose()
}

/// Lists all line stations
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<LineStation>, AppError> {
    sqlx::query("SELECT * FROM line_stations ORDER BY line_id, direction, stop_order")
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database("Failed to list line stations", e))?
        .into_iter()
        .map(row_to_line_station)
        .collect()
}

/// Lists the stops of one line in one direction, ordered by position
pub async fn list_for_line(
    conn: &mut SqliteConnection,
    line_id: i64,
    direction: Direction,
) -> Result<Vec<LineStation>, AppError> {
    sqlx::query(
        "SELECT * FROM line_stations WHERE line_id = ? AND direction = ? ORDER BY stop_order",
    )
    .bind(line_id)
    .bind(direction.as_token())
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::database("Failed to list line stops", e))?
    .into_iter()
    .map(row_to_line_station)
    .collect()
}

/// Rejects a write that would reuse an occupied `(line, direction, order)` slot
async fn check_order_free(
    conn: &mut SqliteConnection,
    fields: &LineStationFields,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM line_stations WHERE line_id = ? AND direction = ? AND stop_order = ?",
    )
    .bind(fields.line_id)
    .bind(fields.direction.as_token())
    .bind(fields.order)
    .fetch_optional(conn)
    .await
    .map_err(|e| AppError::database("Failed to check stop order", e))?;

    match existing {
        Some(id) if Some(id) != exclude_id => Err(AppError::DuplicateRecord {
            entity: "LineStation".to_string(),
            details: format!(
                "Order {} is already used for line {} in direction {}",
                fields.order, fields.line_id, fields.direction
            ),
        }),
        _ => Ok(()),
    }
}

fn row_to_line_station(row: SqliteRow) -> Result<LineStation, AppError> {
    let direction: String = row.get("direction");
    Ok(LineStation {
        id: row.get("id"),
        external_id: row.get("external_id"),
        line_id: row.get("line_id"),
        station_id: row.get("station_id"),
        order: row.get("stop_order"),
        direction: Direction::from_token(&direction)?,
        lat: row.get("lat"),
        lng: row.get("lng"),
        stop_duration: row.get("stop_duration"),
        radius: row.get("radius"),
        alertable: row.get("alertable"),
        efficient: row.get("efficient"),
        duration: row.get("duration"),
    })
}
