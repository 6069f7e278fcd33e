//! Line database operations

use fleetsync_core::{AppError, Line, LineFields, LineType};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Creates a new line and returns its local id
pub async fn create(conn: &mut SqliteConnection, fields: &LineFields) -> Result<i64, AppError> {
    fields.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO lines (
            external_id, code, enterprise_code, color, line_type,
            departure_station_id, terminus_station_id, schedule
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fields.external_id)
    .bind(&fields.code)
    .bind(&fields.enterprise_code)
    .bind(&fields.color)
    .bind(fields.line_type.as_token())
    .bind(fields.departure_station_id)
    .bind(fields.terminus_station_id)
    .bind(&fields.schedule)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to create line", e))?;

    Ok(result.last_insert_rowid())
}

/// Updates an existing line
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &LineFields,
) -> Result<(), AppError> {
    fields.validate()?;

    sqlx::query(
        r#"
        UPDATE lines SET
            external_id = ?, code = ?, enterprise_code = ?, color = ?,
            line_type = ?, departure_station_id = ?, terminus_station_id = ?,
            schedule = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.external_id)
    .bind(&fields.code)
    .bind(&fields.enterprise_code)
    .bind(&fields.color)
    .bind(fields.line_type.as_token())
    .bind(fields.departure_station_id)
    .bind(fields.terminus_station_id)
    .bind(&fields.schedule)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| AppError::database("Failed to update line", e))?;
    Ok(())
}

/// Deletes a line (its line stations and rides cascade)
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM lines WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to delete line", e))?;
    Ok(())
}

/// Records the remote-assigned identifier
pub async fn set_external_id(
    conn: &mut SqliteConnection,
    id: i64,
    external_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE lines SET external_id = ? WHERE id = ?")
        .bind(external_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database("Failed to set line external id", e))?;
    Ok(())
}

/// Gets a line by local id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Line, AppError> {
    let row = sqlx::query("SELECT * FROM lines WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch line", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Line".to_string(),
            identifier: id.to_string(),
        })?;

    let mut line = row_to_line(row)?;
    line.line_station_ids = line_station_links(conn, line.id).await?;
    Ok(line)
}

/// Gets a line by its remote identifier
pub async fn get_by_external_id(
    conn: &mut SqliteConnection,
    external_id: i64,
) -> Result<Option<Line>, AppError> {
    let row = sqlx::query("SELECT * FROM lines WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch line by external id", e))?;

    match row {
        Some(row) => {
            let mut line = row_to_line(row)?;
            line.line_station_ids = line_station_links(conn, line.id).await?;
            Ok(Some(line))
        }
        None => Ok(None),
    }
}

/// Lists all lines
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<Line>, AppError> {
    let rows = sqlx::query("SELECT * FROM lines ORDER BY id")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list lines", e))?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut line = row_to_line(row)?;
        line.line_station_ids = line_station_links(conn, line.id).await?;
        lines.push(line);
    }
    Ok(lines)
}

/// Loads the local ids of a line's stops, ordered by direction then position
async fn line_station_links(conn: &mut SqliteConnection, line_id: i64) -> Result<Vec<i64>, AppError> {
    sqlx::query_scalar(
        "SELECT id FROM line_stations WHERE line_id = ? ORDER BY direction, stop_order",
    )
    .bind(line_id)
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::database("Failed to load line station links", e))
}

fn row_to_line(row: SqliteRow) -> Result<Line, AppError> {
    let line_type: String = row.get("line_type");
    Ok(Line {
        id: row.get("id"),
        external_id: row.get("external_id"),
        code: row.get("code"),
        enterprise_code: row.get("enterprise_code"),
        color: row.get("color"),
        line_type: LineType::from_token(&line_type)?,
        departure_station_id: row.get("departure_station_id"),
        terminus_station_id: row.get("terminus_station_id"),
        schedule: row.get("schedule"),
        line_station_ids: Vec::new(),
    })
}
