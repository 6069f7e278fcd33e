//! Per-entity sync watermarks
//!
//! A watermark is the instant of the last successful pull of one entity's
//! collection. Incremental fetches send it as the `updatedSince` filter.

use chrono::{DateTime, Utc};
use fleetsync_core::{AppError, EntityKind};
use sqlx::SqliteConnection;

/// Returns the last successful sync time for an entity, if any
pub async fn get(
    conn: &mut SqliteConnection,
    entity: EntityKind,
) -> Result<Option<DateTime<Utc>>, AppError> {
    sqlx::query_scalar("SELECT last_sync_at FROM sync_watermarks WHERE entity = ?")
        .bind(entity.name())
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::database("Failed to read sync watermark", e))
}

/// Advances an entity's watermark
pub async fn set(
    conn: &mut SqliteConnection,
    entity: EntityKind,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO sync_watermarks (entity, last_sync_at) VALUES (?, ?)
        ON CONFLICT (entity) DO UPDATE SET last_sync_at = excluded.last_sync_at
        "#,
    )
    .bind(entity.name())
    .bind(at)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to advance sync watermark", e))?;
    Ok(())
}

/// Lists every recorded watermark
pub async fn list_all(
    conn: &mut SqliteConnection,
) -> Result<Vec<(String, DateTime<Utc>)>, AppError> {
    sqlx::query_as("SELECT entity, last_sync_at FROM sync_watermarks ORDER BY entity")
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database("Failed to list sync watermarks", e))
}
