//! Ride domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::common::{
    validate_coordinates, validate_json_array, Direction, LocationType, RideStatus,
};

/// A single trip instance of a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Local primary key
    pub id: i64,
    /// Identifier assigned by the remote API; absent while un-synced
    pub external_id: Option<i64>,
    pub line_id: i64,
    pub direction: Direction,
    pub status: RideStatus,
    pub departure_at: Option<DateTime<Utc>>,
    pub arrival_at: Option<DateTime<Utc>>,
    /// Current position
    pub lat: f64,
    pub lng: f64,
    pub location_type: LocationType,
    pub location_id: Option<i64>,
    /// JSON array of passenger external ids
    pub passengers: String,
    /// Driver external id, kept as opaque text
    pub driver: Option<String>,
    /// Vehicle external id, kept as opaque text
    pub vehicle: Option<String>,
}

/// Field set for creating or updating a ride
#[derive(Debug, Clone, PartialEq)]
pub struct RideFields {
    pub external_id: Option<i64>,
    pub line_id: i64,
    pub direction: Direction,
    pub status: RideStatus,
    pub departure_at: Option<DateTime<Utc>>,
    pub arrival_at: Option<DateTime<Utc>>,
    pub lat: f64,
    pub lng: f64,
    pub location_type: LocationType,
    pub location_id: Option<i64>,
    pub passengers: String,
    pub driver: Option<String>,
    pub vehicle: Option<String>,
}

impl Default for RideFields {
    fn default() -> Self {
        Self {
            external_id: None,
            line_id: 0,
            direction: Direction::Going,
            status: RideStatus::Idle,
            departure_at: None,
            arrival_at: None,
            lat: 0.0,
            lng: 0.0,
            location_type: LocationType::Unknown,
            location_id: None,
            passengers: "[]".to_string(),
            driver: None,
            vehicle: None,
        }
    }
}

impl RideFields {
    pub fn validate(&self) -> Result<()> {
        validate_json_array("passengers", &self.passengers)?;
        if self.lat != 0.0 || self.lng != 0.0 {
            validate_coordinates(self.lat, self.lng)?;
        }
        Ok(())
    }
}

impl Ride {
    pub fn fields(&self) -> RideFields {
        RideFields {
            external_id: self.external_id,
            line_id: self.line_id,
            direction: self.direction,
            status: self.status,
            departure_at: self.departure_at,
            arrival_at: self.arrival_at,
            lat: self.lat,
            lng: self.lng,
            location_type: self.location_type,
            location_id: self.location_id,
            passengers: self.passengers.clone(),
            driver: self.driver.clone(),
            vehicle: self.vehicle.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ride_valid() {
        assert!(RideFields::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_passengers_rejected() {
        let fields = RideFields {
            passengers: "1, 2, 3".to_string(),
            ..Default::default()
        };
        assert!(fields.validate().is_err());
    }
}
