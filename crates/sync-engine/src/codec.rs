//! Entity codec: remote JSON shapes to local field sets and back
//!
//! One typed serde struct per entity describes the wire shape (camelCase
//! names, required vs optional declared once); downstream code never
//! touches raw maps. The inbound direction is lossy-tolerant and fills
//! deterministic defaults; the outbound direction re-parses the locally
//! stored JSON text fields and fails hard when they are malformed.

use chrono::{DateTime, NaiveDateTime, Utc};
use fleetsync_core::types::station::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use fleetsync_core::{
    AppError, Direction, LineFields, LineStationFields, LineType, LocationType, ProfileFields,
    ProfileKind, Result, RideFields, RideStatus, StationFields, VehicleFields,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A nested reference carrying only the external id, tolerating `{}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteRef {
    pub id: Option<i64>,
}

fn empty_array() -> Value {
    json!([])
}

fn empty_object() -> Value {
    json!({})
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_line_type() -> i64 {
    1
}

fn default_direction() -> String {
    "GOING".to_string()
}

fn default_status() -> String {
    "IDLE".to_string()
}

/// Re-serializes a JSON sub-document as stored text, substituting the
/// fallback when the wire carried `null`
fn json_text(value: &Value, fallback: Value) -> String {
    if value.is_null() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Parses a locally stored JSON text field for an outbound payload
fn parse_json_field(field: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| AppError::InvalidJsonField {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a remote timestamp, accepting RFC 3339 or bare
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` forms
pub fn parse_remote_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Station

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteStation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name_ar: String,
    pub name_en: String,
    pub name_fr: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default = "empty_array")]
    pub paths: Value,
    #[serde(default = "empty_array")]
    pub schedule: Value,
    #[serde(default = "empty_object")]
    pub changes: Value,
    pub lines: Vec<i64>,
}

/// Local fields from a remote station, with the referenced lines already
/// resolved to local ids
pub fn station_fields(remote: &RemoteStation, line_ids: Vec<i64>) -> StationFields {
    StationFields {
        external_id: remote.id,
        name_ar: remote.name_ar.clone(),
        name_en: remote.name_en.clone(),
        name_fr: remote.name_fr.clone(),
        latitude: remote.lat.unwrap_or(DEFAULT_LATITUDE),
        longitude: remote.lng.unwrap_or(DEFAULT_LONGITUDE),
        paths: json_text(&remote.paths, json!([])),
        schedule: json_text(&remote.schedule, json!([])),
        changes: json_text(&remote.changes, json!({})),
        line_ids,
    }
}

/// Outbound station payload, with line references as external ids
pub fn station_payload(fields: &StationFields, line_external_ids: &[i64]) -> Result<Value> {
    Ok(json!({
        "nameAr": fields.name_ar,
        "nameEn": fields.name_en,
        "nameFr": fields.name_fr,
        "lat": fields.latitude,
        "lng": fields.longitude,
        "paths": parse_json_field("paths", &fields.paths)?,
        "lines": line_external_ids,
        "changes": parse_json_field("changes", &fields.changes)?,
        "schedule": parse_json_field("schedule", &fields.schedule)?,
    }))
}

// ---------------------------------------------------------------------------
// Line

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub code: String,
    pub enterprise_code: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_line_type")]
    pub line_type: i64,
    pub departure_station: Option<RemoteRef>,
    pub terminus_station: Option<RemoteRef>,
    #[serde(default = "empty_array")]
    pub schedule: Value,
}

impl RemoteLine {
    pub fn departure_station_id(&self) -> Option<i64> {
        self.departure_station.as_ref().and_then(|r| r.id)
    }

    pub fn terminus_station_id(&self) -> Option<i64> {
        self.terminus_station.as_ref().and_then(|r| r.id)
    }
}

/// Local fields from a remote line, station references already resolved
pub fn line_fields(
    remote: &RemoteLine,
    departure_station_id: Option<i64>,
    terminus_station_id: Option<i64>,
) -> LineFields {
    LineFields {
        external_id: remote.id,
        code: remote.code.clone(),
        enterprise_code: remote.enterprise_code.clone(),
        color: remote.color.clone(),
        line_type: LineType::from_remote_token(&remote.line_type.to_string()),
        departure_station_id,
        terminus_station_id,
        schedule: json_text(&remote.schedule, json!([])),
    }
}

/// Outbound line payload; station references are nested `{"id": N}`
/// objects, `{}` when unset
pub fn line_payload(
    fields: &LineFields,
    departure_external_id: Option<i64>,
    terminus_external_id: Option<i64>,
) -> Result<Value> {
    let station_ref = |id: Option<i64>| match id {
        Some(id) => json!({ "id": id }),
        None => json!({}),
    };
    Ok(json!({
        "code": fields.code,
        "color": fields.color,
        "lineType": fields.line_type.as_token().parse::<i64>().unwrap_or(1),
        "enterpriseCode": fields.enterprise_code,
        "departureStation": station_ref(departure_external_id),
        "terminusStation": station_ref(terminus_external_id),
        "schedule": parse_json_field("schedule", &fields.schedule)?,
    }))
}

// ---------------------------------------------------------------------------
// LineStation

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteLineStation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub line: Option<RemoteRef>,
    pub station: Option<RemoteRef>,
    pub order: i64,
    pub stop_duration: i64,
    #[serde(default = "default_direction")]
    pub direction: String,
    pub radius: i64,
    pub lat: f64,
    pub lng: f64,
    pub alertable: bool,
    pub efficient: bool,
    pub duration: i64,
}

impl RemoteLineStation {
    pub fn line_id(&self) -> Option<i64> {
        self.line.as_ref().and_then(|r| r.id)
    }

    pub fn station_id(&self) -> Option<i64> {
        self.station.as_ref().and_then(|r| r.id)
    }
}

/// Local fields from a remote line station, parents already resolved
pub fn line_station_fields(
    remote: &RemoteLineStation,
    line_id: i64,
    station_id: i64,
) -> LineStationFields {
    LineStationFields {
        external_id: remote.id,
        line_id,
        station_id,
        order: remote.order,
        direction: Direction::from_remote_token(&remote.direction),
        lat: remote.lat,
        lng: remote.lng,
        stop_duration: remote.stop_duration,
        radius: remote.radius,
        alertable: remote.alertable,
        efficient: remote.efficient,
        duration: remote.duration,
    }
}

/// Outbound line station payload
pub fn line_station_payload(
    fields: &LineStationFields,
    line_external_id: i64,
    station_external_id: i64,
) -> Value {
    json!({
        "line": { "id": line_external_id },
        "station": { "id": station_external_id },
        "order": fields.order,
        "stopDuration": fields.stop_duration,
        "direction": fields.direction.as_token(),
        "radius": fields.radius,
        "lat": fields.lat,
        "lng": fields.lng,
        "alertable": fields.alertable,
        "efficient": fields.efficient,
        "duration": fields.duration,
    })
}

// ---------------------------------------------------------------------------
// Ride

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteRide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// External id of the line; a bare scalar on the wire
    pub line: Option<i64>,
    #[serde(default = "default_direction")]
    pub direction: String,
    pub departure_datetime: Option<String>,
    pub arrival_datetime: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location_type: Option<String>,
    pub location_id: Option<i64>,
    #[serde(default = "empty_array")]
    pub passengers: Value,
    pub driver: Option<i64>,
    pub vehicle: Option<i64>,
}

/// Local fields from a remote ride, the line already resolved
pub fn ride_fields(remote: &RemoteRide, line_id: i64) -> RideFields {
    RideFields {
        external_id: remote.id,
        line_id,
        direction: Direction::from_remote_token(&remote.direction),
        status: RideStatus::from_remote_token(&remote.status),
        departure_at: remote
            .departure_datetime
            .as_deref()
            .and_then(parse_remote_datetime),
        arrival_at: remote
            .arrival_datetime
            .as_deref()
            .and_then(parse_remote_datetime),
        lat: remote.lat.unwrap_or(0.0),
        lng: remote.lng.unwrap_or(0.0),
        location_type: remote
            .location_type
            .as_deref()
            .map(LocationType::from_remote_token)
            .unwrap_or(LocationType::Unknown),
        location_id: remote.location_id,
        passengers: json_text(&remote.passengers, json!([])),
        driver: remote.driver.map(|d| d.to_string()),
        vehicle: remote.vehicle.map(|v| v.to_string()),
    }
}

/// Outbound ride payload; driver and vehicle are carried as numeric ids
/// when the local text holds one
pub fn ride_payload(fields: &RideFields, line_external_id: i64) -> Result<Value> {
    let numeric = |text: &Option<String>| -> Value {
        text.as_deref()
            .and_then(|t| t.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or(Value::Null)
    };
    Ok(json!({
        "direction": fields.direction.as_token(),
        "departureDatetime": fields.departure_at.map(|d| d.to_rfc3339()),
        "arrivalDatetime": fields.arrival_at.map(|d| d.to_rfc3339()),
        "status": fields.status.as_remote_token(),
        "lat": fields.lat,
        "lng": fields.lng,
        "locationType": fields.location_type.as_token(),
        "locationId": fields.location_id,
        "passengers": parse_json_field("passengers", &fields.passengers)?,
        "line": line_external_id,
        "driver": numeric(&fields.driver),
        "vehicle": numeric(&fields.vehicle),
    }))
}

// ---------------------------------------------------------------------------
// Vehicle

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteVehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub num_of_seats: i64,
    #[serde(default = "empty_array")]
    pub drivers: Value,
}

pub fn vehicle_fields(remote: &RemoteVehicle) -> VehicleFields {
    VehicleFields {
        external_id: remote.id,
        plate_number: remote.plate_number.clone(),
        brand: remote.brand.clone(),
        model: remote.model.clone(),
        registration_number: remote.registration_number.clone(),
        num_of_seats: remote.num_of_seats,
        drivers: json_text(&remote.drivers, json!([])),
    }
}

pub fn vehicle_payload(fields: &VehicleFields) -> Result<Value> {
    Ok(json!({
        "plateNumber": fields.plate_number,
        "brand": fields.brand,
        "model": fields.model,
        "registrationNumber": fields.registration_number,
        "numOfSeats": fields.num_of_seats,
        "drivers": parse_json_field("drivers", &fields.drivers)?,
    }))
}

// ---------------------------------------------------------------------------
// Profiles

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub driver_number: String,
    pub username: String,
    #[serde(default = "empty_array")]
    pub rides: Value,
}

/// Local fields from a remote profile, stamped with the pass's sync time
pub fn profile_fields(
    remote: &RemoteProfile,
    kind: ProfileKind,
    sync_time: DateTime<Utc>,
) -> ProfileFields {
    ProfileFields {
        external_id: remote.id,
        kind,
        first_name: remote.first_name.clone(),
        last_name: remote.last_name.clone(),
        phone_number: remote.phone_number.clone(),
        driver_number: remote.driver_number.clone(),
        username: remote.username.clone(),
        rides: json_text(&remote.rides, json!([])),
        last_sync: Some(sync_time),
    }
}

pub fn profile_payload(fields: &ProfileFields) -> Result<Value> {
    let mut payload = json!({
        "firstName": fields.first_name,
        "lastName": fields.last_name,
        "phoneNumber": fields.phone_number,
        "username": fields.username,
        "rides": parse_json_field("rides", &fields.rides)?,
    });
    if fields.kind == ProfileKind::Driver {
        payload["driverNumber"] = Value::from(fields.driver_number.clone());
    }
    if let Some(external_id) = fields.external_id {
        payload["id"] = Value::from(external_id);
    }
    Ok(payload)
}
