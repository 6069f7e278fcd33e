//! Vehicle domain model

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::common::validate_json_array;
use crate::AppError;

/// A fleet vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Local primary key
    pub id: i64,
    /// Identifier assigned by the remote API; absent while un-synced
    pub external_id: Option<i64>,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub num_of_seats: i64,
    /// JSON array of driver external ids
    pub drivers: String,
}

/// Field set for creating or updating a vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFields {
    pub external_id: Option<i64>,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub num_of_seats: i64,
    pub drivers: String,
}

impl Default for VehicleFields {
    fn default() -> Self {
        Self {
            external_id: None,
            plate_number: String::new(),
            brand: String::new(),
            model: String::new(),
            registration_number: String::new(),
            num_of_seats: 0,
            drivers: "[]".to_string(),
        }
    }
}

impl VehicleFields {
    pub fn validate(&self) -> Result<()> {
        if self.plate_number.trim().is_empty() {
            return Err(AppError::validation("plate_number", "must not be empty"));
        }
        validate_json_array("drivers", &self.drivers)?;
        Ok(())
    }
}

impl Vehicle {
    pub fn fields(&self) -> VehicleFields {
        VehicleFields {
            external_id: self.external_id,
            plate_number: self.plate_number.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            registration_number: self.registration_number.clone(),
            num_of_seats: self.num_of_seats,
            drivers: self.drivers.clone(),
        }
    }
}
