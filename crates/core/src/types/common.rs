//! Shared enumerations and validation helpers
//!
//! The remote API and the local store use different token sets for some
//! enumerations (notably ride status), so every enum here exposes an
//! explicit two-way token map instead of a serde passthrough.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};

/// Travel direction of a line station or ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Going,
    Returning,
}

impl Direction {
    /// Parses a remote token; anything unrecognized falls back to `Going`
    pub fn from_remote_token(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "RETURNING" => Self::Returning,
            _ => Self::Going,
        }
    }

    /// Returns the token used by both the remote API and the local store
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Going => "GOING",
            Self::Returning => "RETURNING",
        }
    }

    /// Parses a stored token, rejecting unknown values
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "GOING" => Ok(Self::Going),
            "RETURNING" => Ok(Self::Returning),
            other => Err(AppError::validation(
                "direction",
                format!("unknown direction '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// Ride lifecycle status
///
/// The remote schema uses `FINISHED` where the local store uses `COMPLETED`;
/// the translation lives here, not in serde attributes, so both directions
/// stay explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideStatus {
    OnGoing,
    Completed,
    Cancelled,
    Idle,
}

impl RideStatus {
    /// Parses a remote token; `FINISHED` maps to `Completed`, anything
    /// unrecognized maps to `Idle`
    pub fn from_remote_token(token: &str) -> Self {
        match token {
            "ON_GOING" => Self::OnGoing,
            "FINISHED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            "IDLE" => Self::Idle,
            _ => Self::Idle,
        }
    }

    /// Returns the remote token; `Completed` re-serializes as `FINISHED`
    pub fn as_remote_token(&self) -> &'static str {
        match self {
            Self::OnGoing => "ON_GOING",
            Self::Completed => "FINISHED",
            Self::Cancelled => "CANCELLED",
            Self::Idle => "IDLE",
        }
    }

    /// Returns the token stored locally
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::OnGoing => "ON_GOING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Idle => "IDLE",
        }
    }

    /// Parses a stored token, rejecting unknown values
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "ON_GOING" => Ok(Self::OnGoing),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "IDLE" => Ok(Self::Idle),
            other => Err(AppError::validation(
                "status",
                format!("unknown ride status '{other}'"),
            )),
        }
    }
}

/// Kind of location a ride position refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    LineStation,
    InterStation,
    Unknown,
}

impl LocationType {
    pub fn from_remote_token(token: &str) -> Self {
        match token {
            "LINE_STATION" => Self::LineStation,
            "INTER_STATION" => Self::InterStation,
            _ => Self::Unknown,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::LineStation => "LINE_STATION",
            Self::InterStation => "INTER_STATION",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "LINE_STATION" => Ok(Self::LineStation),
            "INTER_STATION" => Ok(Self::InterStation),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(AppError::validation(
                "location_type",
                format!("unknown location type '{other}'"),
            )),
        }
    }
}

/// Commercial classification of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    Primary,
    Secondary,
}

impl LineType {
    /// The remote encodes line types as small numeric strings
    pub fn from_remote_token(token: &str) -> Self {
        match token {
            "2" => Self::Secondary,
            _ => Self::Primary,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Primary => "1",
            Self::Secondary => "2",
        }
    }

    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "1" => Ok(Self::Primary),
            "2" => Ok(Self::Secondary),
            other => Err(AppError::validation(
                "line_type",
                format!("unknown line type '{other}'"),
            )),
        }
    }
}

/// Entity types covered by the synchronization engine, in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Station,
    Line,
    LineStation,
    Vehicle,
    Driver,
    Passenger,
    Ride,
}

impl EntityKind {
    /// All kinds, ordered so that referenced entities sync before their
    /// dependents (stations before lines before line stations, rides last)
    pub const DEPENDENCY_ORDER: [EntityKind; 7] = [
        EntityKind::Station,
        EntityKind::Line,
        EntityKind::LineStation,
        EntityKind::Vehicle,
        EntityKind::Driver,
        EntityKind::Passenger,
        EntityKind::Ride,
    ];

    /// Stable name used in reports, logs and the watermark table
    pub fn name(&self) -> &'static str {
        match self {
            Self::Station => "stations",
            Self::Line => "lines",
            Self::LineStation => "line_stations",
            Self::Vehicle => "vehicles",
            Self::Driver => "drivers",
            Self::Passenger => "passengers",
            Self::Ride => "rides",
        }
    }

    /// Human-readable singular label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Station => "Station",
            Self::Line => "Line",
            Self::LineStation => "Line Station",
            Self::Vehicle => "Vehicle",
            Self::Driver => "Driver",
            Self::Passenger => "Passenger",
            Self::Ride => "Ride",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Origin of a local write
///
/// Writes performed by the reconciler must not be pushed back upstream;
/// this flag is threaded explicitly through every store call instead of
/// being ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOrigin {
    /// Write requested by a user; mirrored to the remote API
    User,
    /// Write performed by a reconciliation pass; never pushed upstream
    Reconcile,
}

/// Validates that a text field parses as a JSON array
pub fn validate_json_array(field: &str, text: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(_)) => Ok(()),
        Ok(_) => Err(AppError::InvalidJsonField {
            field: field.to_string(),
            reason: "expected a JSON array".to_string(),
        }),
        Err(e) => Err(AppError::InvalidJsonField {
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Validates that a text field parses as a JSON object
pub fn validate_json_object(field: &str, text: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(AppError::InvalidJsonField {
            field: field.to_string(),
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(AppError::InvalidJsonField {
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Validates a latitude/longitude pair
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation(
            "latitude",
            "must be between -90 and 90 degrees",
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation(
            "longitude",
            "must be between -180 and 180 degrees",
        ));
    }
    Ok(())
}

/// Validates a `#RRGGBB` color string
pub fn validate_hex_color(field: &str, color: &str) -> Result<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(
            field,
            format!("'{color}' is not a #RRGGBB color"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_remote_translation() {
        assert_eq!(RideStatus::from_remote_token("FINISHED"), RideStatus::Completed);
        assert_eq!(RideStatus::Completed.as_remote_token(), "FINISHED");
        assert_eq!(RideStatus::Completed.as_token(), "COMPLETED");
    }

    #[test]
    fn test_unknown_remote_status_maps_to_idle() {
        assert_eq!(RideStatus::from_remote_token("EXPLODED"), RideStatus::Idle);
        assert_eq!(RideStatus::from_remote_token(""), RideStatus::Idle);
    }

    #[test]
    fn test_direction_fallback() {
        assert_eq!(Direction::from_remote_token("RETURNING"), Direction::Returning);
        assert_eq!(Direction::from_remote_token("sideways"), Direction::Going);
        assert!(Direction::from_token("sideways").is_err());
    }

    #[test]
    fn test_dependency_order_starts_with_stations() {
        assert_eq!(EntityKind::DEPENDENCY_ORDER[0], EntityKind::Station);
        assert_eq!(EntityKind::DEPENDENCY_ORDER[1], EntityKind::Line);
        assert_eq!(EntityKind::DEPENDENCY_ORDER[2], EntityKind::LineStation);
        assert_eq!(
            EntityKind::DEPENDENCY_ORDER.last().copied(),
            Some(EntityKind::Ride)
        );
    }

    #[test]
    fn test_json_field_validation() {
        assert!(validate_json_array("paths", "[]").is_ok());
        assert!(validate_json_array("paths", "[1, 2]").is_ok());
        assert!(validate_json_array("paths", "{}").is_err());
        assert!(validate_json_array("paths", "not json").is_err());
        assert!(validate_json_object("changes", "{}").is_ok());
        assert!(validate_json_object("changes", "[]").is_err());
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(validate_coordinates(36.7538, 3.0588).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
    }

    #[test]
    fn test_hex_color() {
        assert!(validate_hex_color("color", "#000000").is_ok());
        assert!(validate_hex_color("color", "#A1b2C3").is_ok());
        assert!(validate_hex_color("color", "red").is_err());
        assert!(validate_hex_color("color", "#12345").is_err());
        assert!(validate_hex_color("color", "#12345G").is_err());
    }
}
