//! Vehicle database operations

use fleetsync_core::{AppError, Vehicle, VehicleFields};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Creates a new vehicle and returns its local id
pub async fn create(conn: &mut SqliteConnection, fields: &VehicleFields) -> Result<i64, AppError> {
    fields.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO vehicles (
            external_id, plate_number, brand, model,
            registration_number, num_of_seats, drivers
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fields.external_id)
    .bind(&fields.plate_number)
    .bind(&fields.brand)
    .bind(&fields.model)
    .bind(&fields.registration_number)
    .bind(fields.num_of_seats)
    .bind(&fields.drivers)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to create vehicle", e))?;

    Ok(result.last_insert_rowid())
}

/// Updates an existing vehicle
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &VehicleFields,
) -> Result<(), AppError> {
    fields.validate()?;

    sqlx::query(
        r#"
        UPDATE vehicles SET
            external_id = ?, plate_number = ?, brand = ?, model = ?,
            registration_number = ?, num_of_seats = ?, drivers = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.external_id)
    .bind(&fields.plate_number)
    .bind(&fields.brand)
    .bind(&fields.model)
    .bind(&fields.registration_number)
    .bind(fields.num_of_seats)
    .bind(&fields.drivers)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to update vehicle", e))?;
    Ok(())
}

/// Deletes a vehicle
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM vehicles WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to delete vehicle", e))?;
    Ok(())
}

/// Records the remote-assigned identifier
pub async fn set_external_id(
    conn: &mut SqliteConnection,
    id: i64,
    external_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE vehicles SET external_id = ? WHERE id = ?")
        .bind(external_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to set vehicle external id", e))?;
    Ok(())
}

/// Gets a vehicle by local id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Vehicle, AppError> {
    let row = sqlx::query("SELECT * FROM vehicles WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch vehicle", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Vehicle".to_string(),
            identifier: id.to_string(),
        })?;
    Ok(row_to_vehicle(row))
}

/// Gets a vehicle by its remote identifier
pub async fn get_by_external_id(
    conn: &mut SqliteConnection,
    external_id: i64,
) -> Result<Option<Vehicle>, AppError> {
    Ok(sqlx::query("SELECT * FROM vehicles WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch vehicle by external id", e))?
        .map(row_to_vehicle))
}

/// Gets a vehicle by its plate number, the user-side duplicate key
pub async fn get_by_plate_number(
    conn: &mut SqliteConnection,
    plate_number: &str,
) -> Result<Option<Vehicle>, AppError> {
    Ok(sqlx::query("SELECT * FROM vehicles WHERE plate_number = ?")
        .bind(plate_number)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch vehicle by plate number", e))?
        .map(row_to_vehicle))
}

/// Lists all vehicles
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<Vehicle>, AppError> {
    Ok(sqlx::query("SELECT * FROM vehicles ORDER BY id")
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database("Failed to list vehicles", e))?
        .into_iter()
        .map(row_to_vehicle)
        .collect())
}

fn row_to_vehicle(row: SqliteRow) -> Vehicle {
    Vehicle {
        id: row.get("id"),
        external_id: row.get("external_id"),
        plate_number: row.get("plate_number"),
        brand: row.get("brand"),
        model: row.get("model"),
        registration_number: row.get("registration_number"),
        num_of_seats: row.get("num_of_seats"),
        drivers: row.get("drivers"),
    }
}
