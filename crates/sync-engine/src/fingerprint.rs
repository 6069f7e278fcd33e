//! Change detection fingerprints
//!
//! A fingerprint is canonical JSON over the comparable fields of an
//! entity: keys sorted (serde_json's map is a BTreeMap), foreign keys as
//! resolved local ids, unordered id collections sorted before
//! serialization, JSON text fields re-parsed so formatting differences
//! don't register as changes. Equality is the sole skip signal of the
//! reconciler: a false positive would drop a real change, so anything
//! that can differ meaningfully must be part of the view.

use fleetsync_core::{
    AppError, LineFields, LineStationFields, ProfileFields, Result, RideFields, StationFields,
    VehicleFields,
};
use serde_json::{json, Value};

fn json_value(field: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| AppError::InvalidJsonField {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

pub fn station_fingerprint(fields: &StationFields) -> Result<String> {
    let mut line_ids = fields.line_ids.clone();
    line_ids.sort_unstable();
    Ok(json!({
        "name_ar": fields.name_ar,
        "name_en": fields.name_en,
        "name_fr": fields.name_fr,
        "latitude": fields.latitude,
        "longitude": fields.longitude,
        "paths": json_value("paths", &fields.paths)?,
        "schedule": json_value("schedule", &fields.schedule)?,
        "changes": json_value("changes", &fields.changes)?,
        "line_ids": line_ids,
    })
    .to_string())
}

pub fn line_fingerprint(fields: &LineFields) -> Result<String> {
    Ok(json!({
        "code": fields.code,
        "enterprise_code": fields.enterprise_code,
        "color": fields.color,
        "line_type": fields.line_type.as_token(),
        "departure_station_id": fields.departure_station_id,
        "terminus_station_id": fields.terminus_station_id,
        "schedule": json_value("schedule", &fields.schedule)?,
    })
    .to_string())
}

pub fn line_station_fingerprint(fields: &LineStationFields) -> String {
    json!({
        "line_id": fields.line_id,
        "station_id": fields.station_id,
        "order": fields.order,
        "direction": fields.direction.as_token(),
        "lat": fields.lat,
        "lng": fields.lng,
        "stop_duration": fields.stop_duration,
        "radius": fields.radius,
        "alertable": fields.alertable,
        "efficient": fields.efficient,
        "duration": fields.duration,
    })
    .to_string()
}

pub fn ride_fingerprint(fields: &RideFields) -> Result<String> {
    Ok(json!({
        "line_id": fields.line_id,
        "direction": fields.direction.as_token(),
        "status": fields.status.as_token(),
        "departure_at": fields.departure_at.map(|d| d.to_rfc3339()),
        "arrival_at": fields.arrival_at.map(|d| d.to_rfc3339()),
        "lat": fields.lat,
        "lng": fields.lng,
        "location_type": fields.location_type.as_token(),
        "location_id": fields.location_id,
        "passengers": json_value("passengers", &fields.passengers)?,
        "driver": fields.driver,
        "vehicle": fields.vehicle,
    })
    .to_string())
}

pub fn vehicle_fingerprint(fields: &VehicleFields) -> Result<String> {
    Ok(json!({
        "plate_number": fields.plate_number,
        "brand": fields.brand,
        "model": fields.model,
        "registration_number": fields.registration_number,
        "num_of_seats": fields.num_of_seats,
        "drivers": json_value("drivers", &fields.drivers)?,
    })
    .to_string())
}

/// `last_sync` is bookkeeping, not content, so it stays out of the view
pub fn profile_fingerprint(fields: &ProfileFields) -> Result<String> {
    Ok(json!({
        "first_name": fields.first_name,
        "last_name": fields.last_name,
        "phone_number": fields.phone_number,
        "driver_number": fields.driver_number,
        "username": fields.username,
        "rides": json_value("rides", &fields.rides)?,
    })
    .to_string())
}
