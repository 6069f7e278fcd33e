//! Driver and passenger profile database operations
//!
//! Both collections share one table, discriminated by `kind`. Remote
//! lookups key on `(kind, external_id)`; user-side duplicate detection
//! keys on `(kind, phone_number, username)`.

use chrono::{DateTime, Utc};
use fleetsync_core::{AppError, Profile, ProfileFields, ProfileKind};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Creates a new profile and returns its local id
pub async fn create(conn: &mut SqliteConnection, fields: &ProfileFields) -> Result<i64, AppError> {
    fields.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO profiles (
            external_id, kind, first_name, last_name, phone_number,
            driver_number, username, rides, last_sync
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fields.external_id)
    .bind(fields.kind.as_token())
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.phone_number)
    .bind(&fields.driver_number)
    .bind(&fields.username)
    .bind(&fields.rides)
    .bind(fields.last_sync)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to create profile", e))?;

    Ok(result.last_insert_rowid())
}

/// Updates an existing profile
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &ProfileFields,
) -> Result<(), AppError> {
    fields.validate()?;

    sqlx::query(
        r#"
        UPDATE profiles SET
            external_id = ?, kind = ?, first_name = ?, last_name = ?,
            phone_number = ?, driver_number = ?, username = ?, rides = ?,
            last_sync = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.external_id)
    .bind(fields.kind.as_token())
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.phone_number)
    .bind(&fields.driver_number)
    .bind(&fields.username)
    .bind(&fields.rides)
    .bind(fields.last_sync)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to update profile", e))?;
    Ok(())
}

/// Deletes a profile
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to delete profile", e))?;
    Ok(())
}

/// Records the remote-assigned identifier
pub async fn set_external_id(
    conn: &mut SqliteConnection,
    id: i64,
    external_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE profiles SET external_id = ? WHERE id = ?")
        .bind(external_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to set profile external id", e))?;
    Ok(())
}

/// Stamps the profile's last successful sync time
pub async fn set_last_sync(
    conn: &mut SqliteConnection,
    id: i64,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE profiles SET last_sync = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to stamp profile sync time", e))?;
    Ok(())
}

/// Gets a profile by local id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Profile, AppError> {
    let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch profile", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Profile".to_string(),
            identifier: id.to_string(),
        })?;
    row_to_profile(row)
}

/// Gets a profile by its remote identifier within one collection
pub async fn get_by_external_id(
    conn: &mut SqliteConnection,
    kind: ProfileKind,
    external_id: i64,
) -> Result<Option<Profile>, AppError> {
    sqlx::query("SELECT * FROM profiles WHERE kind = ? AND external_id = ?")
        .bind(kind.as_token())
        .bind(external_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch profile by external id", e))?
        .map(row_to_profile)
        .transpose()
}

/// Gets a profile by the user-side duplicate business key
pub async fn get_by_business_key(
    conn: &mut SqliteConnection,
    kind: ProfileKind,
    phone_number: &str,
    username: &str,
) -> Result<Option<Profile>, AppError> {
    sqlx::query("SELECT * FROM profiles WHERE kind = ? AND phone_number = ? AND username = ?")
        .bind(kind.as_token())
        .bind(phone_number)
        .bind(username)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch profile by business key", e))?
        .map(row_to_profile)
        .transpose()
}

/// Lists all profiles of one kind
pub async fn list_all(
    conn: &mut SqliteConnection,
    kind: ProfileKind,
) -> Result<Vec<Profile>, AppError> {
    sqlx::query("SELECT * FROM profiles WHERE kind = ? ORDER BY id")
        .bind(kind.as_token())
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database("Failed to list profiles", e))?
        .into_iter()
        .map(row_to_profile)
        .collect()
}

fn row_to_profile(row: SqliteRow) -> Result<Profile, AppError> {
    let kind: String = row.get("kind");
    let last_sync: Option<DateTime<Utc>> = row.get("last_sync");
    Ok(Profile {
        id: row.get("id"),
        external_id: row.get("external_id"),
        kind: ProfileKind::from_token(&kind)?,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone_number: row.get("phone_number"),
        driver_number: row.get("driver_number"),
        username: row.get("username"),
        rides: row.get("rides"),
        last_sync,
    })
}
