//! Reference resolver: external ids to local rows
//!
//! Remote payloads reference other entities by external id. The resolver
//! turns those into local row ids, creating a minimally valid placeholder
//! on miss and persisting it immediately so later records in the same
//! pass resolve to the same row. Placeholders are matched by external_id
//! and upgraded in place by the proper-order sync of their entity kind.

use fleetsync_core::{LineFields, Result, StationFields};
use fleetsync_store::queries;
use sqlx::SqliteConnection;

/// Resolves a station external id, creating a placeholder on miss
pub async fn resolve_station(conn: &mut SqliteConnection, external_id: i64) -> Result<i64> {
    if let Some(station) = queries::stations::get_by_external_id(conn, external_id).await? {
        return Ok(station.id);
    }

    let label = format!("Unknown station {external_id}");
    log::info!("Creating placeholder station for external id {external_id}");
    let fields = StationFields {
        external_id: Some(external_id),
        name_ar: label.clone(),
        name_en: label.clone(),
        name_fr: label,
        ..Default::default()
    };
    queries::stations::create(conn, &fields).await
}

/// Resolves a line external id, creating a placeholder on miss
pub async fn resolve_line(conn: &mut SqliteConnection, external_id: i64) -> Result<i64> {
    if let Some(line) = queries::lines::get_by_external_id(conn, external_id).await? {
        return Ok(line.id);
    }

    log::info!("Creating placeholder line for external id {external_id}");
    let fields = LineFields {
        external_id: Some(external_id),
        code: format!("LINE-{external_id}"),
        enterprise_code: format!("UNKNOWN-{external_id}"),
        ..Default::default()
    };
    queries::lines::create(conn, &fields).await
}
