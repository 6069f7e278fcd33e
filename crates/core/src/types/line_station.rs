//! LineStation domain model: the ordered join between a line and a station

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::common::{validate_coordinates, Direction};

/// A stop of a line at a station, ordered within `(line, direction)`
///
/// Invariant: no two line stations share the same `(line_id, direction,
/// order)` triple; the store enforces it on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStation {
    /// Local primary key
    pub id: i64,
    /// Identifier assigned by the remote API; absent while un-synced
    pub external_id: Option<i64>,
    pub line_id: i64,
    pub station_id: i64,
    /// Position of the stop within the (line, direction) sequence
    pub order: i64,
    pub direction: Direction,
    /// Geographic override; 0.0 means "use the station position"
    pub lat: f64,
    pub lng: f64,
    /// Seconds the vehicle stays at the stop
    pub stop_duration: i64,
    /// Geofence radius in meters
    pub radius: i64,
    pub alertable: bool,
    pub efficient: bool,
    /// Travel seconds from the previous stop
    pub duration: i64,
}

/// Field set for creating or updating a line station
#[derive(Debug, Clone, PartialEq)]
pub struct LineStationFields {
    pub external_id: Option<i64>,
    pub line_id: i64,
    pub station_id: i64,
    pub order: i64,
    pub direction: Direction,
    pub lat: f64,
    pub lng: f64,
    pub stop_duration: i64,
    pub radius: i64,
    pub alertable: bool,
    pub efficient: bool,
    pub duration: i64,
}

impl Default for LineStationFields {
    fn default() -> Self {
        Self {
            external_id: None,
            line_id: 0,
            station_id: 0,
            order: 0,
            direction: Direction::Going,
            lat: 0.0,
            lng: 0.0,
            stop_duration: 0,
            radius: 0,
            alertable: false,
            efficient: false,
            duration: 0,
        }
    }
}

impl LineStationFields {
    pub fn validate(&self) -> Result<()> {
        // 0.0/0.0 is the "no override" sentinel, never a real stop position
        if self.lat != 0.0 || self.lng != 0.0 {
            validate_coordinates(self.lat, self.lng)?;
        }
        Ok(())
    }
}

impl LineStation {
    pub fn fields(&self) -> LineStationFields {
        LineStationFields {
            external_id: self.external_id,
            line_id: self.line_id,
            station_id: self.station_id,
            order: self.order,
            direction: self.direction,
            lat: self.lat,
            lng: self.lng,
            stop_duration: self.stop_duration,
            radius: self.radius,
            alertable: self.alertable,
            efficient: self.efficient,
            duration: self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_override_allowed() {
        let fields = LineStationFields::default();
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_override_rejected() {
        let fields = LineStationFields {
            lat: 100.0,
            lng: 3.0,
            ..Default::default()
        };
        assert!(fields.validate().is_err());
    }
}
