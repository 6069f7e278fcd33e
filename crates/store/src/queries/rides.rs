//! Ride database operations

use chrono::{DateTime, Utc};
use fleetsync_core::{AppError, Direction, LocationType, Ride, RideFields, RideStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Creates a new ride and returns its local id
pub async fn create(conn: &mut SqliteConnection, fields: &RideFields) -> Result<i64, AppError> {
    fields.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO rides (
            external_id, line_id, direction, status, departure_at, arrival_at,
            lat, lng, location_type, location_id, passengers, driver, vehicle
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fields.external_id)
    .bind(fields.line_id)
    .bind(fields.direction.as_token())
    .bind(fields.status.as_token())
    .bind(fields.departure_at)
    .bind(fields.arrival_at)
    .bind(fields.lat)
    .bind(fields.lng)
    .bind(fields.location_type.as_token())
    .bind(fields.location_id)
    .bind(&fields.passengers)
    .bind(&fields.driver)
    .bind(&fields.vehicle)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to create ride", e))?;

    Ok(result.last_insert_rowid())
}

/// Updates an existing ride
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &RideFields,
) -> Result<(), AppError> {
    fields.validate()?;

    sqlx::query(
        r#"
        UPDATE rides SET
            external_id = ?, line_id = ?, direction = ?, status = ?,
            departure_at = ?, arrival_at = ?, lat = ?, lng = ?,
            location_type = ?, location_id = ?, passengers = ?,
            driver = ?, vehicle = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.external_id)
    .bind(fields.line_id)
    .bind(fields.direction.as_token())
    .bind(fields.status.as_token())
    .bind(fields.departure_at)
    .bind(fields.arrival_at)
    .bind(fields.lat)
    .bind(fields.lng)
    .bind(fields.location_type.as_token())
    .bind(fields.location_id)
    .bind(&fields.passengers)
    .bind(&fields.driver)
    .bind(&fields.vehicle)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to update ride", e))?;
    Ok(())
}

/// Deletes a ride
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM rides WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to delete ride", e))?;
    Ok(())
}

/// Records the remote-assigned identifier
pub async fn set_external_id(
    conn: &mut SqliteConnection,
    id: i64,
    external_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE rides SET external_id = ? WHERE id = ?")
        .bind(external_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to set ride external id", e))?;
    Ok(())
}

/// Gets a ride by local id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Ride, AppError> {
    let row = sqlx::query("SELECT * FROM rides WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch ride", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Ride".to_string(),
            identifier: id.to_string(),
        })?;
    row_to_ride(row)
}

/// Gets a ride by its remote identifier
pub async fn get_by_external_id(
    conn: &mut SqliteConnection,
    external_id: i64,
) -> Result<Option<Ride>, AppError> {
    sqlx::query("SELECT * FROM rides WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch ride by external id", e))?
        .map(row_to_ride)
        .transpose()
}

/// Lists all rides
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<Ride>, AppError> {
    sqlx::query("SELECT * FROM rides ORDER BY id")
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database("Failed to list rides", e))?
        .into_iter()
        .map(row_to_ride)
        .collect()
}

fn row_to_ride(row: SqliteRow) -> Result<Ride, AppError> {
    let direction: String = row.get("direction");
    let status: String = row.get("status");
    let location_type: String = row.get("location_type");
    let departure_at: Option<DateTime<Utc>> = row.get("departure_at");
    let arrival_at: Option<DateTime<Utc>> = row.get("arrival_at");
    Ok(Ride {
        id: row.get("id"),
        external_id: row.get("external_id"),
        line_id: row.get("line_id"),
        direction: Direction::from_token(&direction)?,
        status: RideStatus::from_token(&status)?,
        departure_at,
        arrival_at,
        lat: row.get("lat"),
        lng: row.get("lng"),
        location_type: LocationType::from_token(&location_type)?,
        location_id: row.get("location_id"),
        passengers: row.get("passengers"),
        driver: row.get("driver"),
        vehicle: row.get("vehicle"),
    })
}
