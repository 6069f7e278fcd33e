//! Station domain model

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::common::{validate_coordinates, validate_json_array, validate_json_object};
use crate::AppError;

/// Default coordinates used when a station has no position yet (Algiers)
pub const DEFAULT_LATITUDE: f64 = 36.7538;
pub const DEFAULT_LONGITUDE: f64 = 3.0588;

/// A transit station stored locally
///
/// `paths`, `schedule` and `changes` are JSON sub-documents kept as text in
/// the store; every write re-validates that they parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Local primary key
    pub id: i64,
    /// Identifier assigned by the remote API; absent while un-synced
    pub external_id: Option<i64>,
    pub name_ar: String,
    pub name_en: String,
    pub name_fr: String,
    pub latitude: f64,
    pub longitude: f64,
    /// JSON array of path descriptors
    pub paths: String,
    /// JSON array of time strings
    pub schedule: String,
    /// JSON object of pending change notes
    pub changes: String,
    /// Local ids of lines serving this station
    pub line_ids: Vec<i64>,
}

/// Field set for creating or updating a station
#[derive(Debug, Clone, PartialEq)]
pub struct StationFields {
    pub external_id: Option<i64>,
    pub name_ar: String,
    pub name_en: String,
    pub name_fr: String,
    pub latitude: f64,
    pub longitude: f64,
    pub paths: String,
    pub schedule: String,
    pub changes: String,
    pub line_ids: Vec<i64>,
}

impl Default for StationFields {
    fn default() -> Self {
        Self {
            external_id: None,
            name_ar: String::new(),
            name_en: String::new(),
            name_fr: String::new(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            paths: "[]".to_string(),
            schedule: "[]".to_string(),
            changes: "{}".to_string(),
            line_ids: Vec::new(),
        }
    }
}

impl StationFields {
    /// Validates every invariant enforced on a local write
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name_ar", &self.name_ar),
            ("name_en", &self.name_en),
            ("name_fr", &self.name_fr),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(field, "must not be empty"));
            }
        }
        validate_coordinates(self.latitude, self.longitude)?;
        validate_json_array("paths", &self.paths)?;
        validate_json_array("schedule", &self.schedule)?;
        validate_json_object("changes", &self.changes)?;
        Ok(())
    }
}

impl Station {
    pub fn fields(&self) -> StationFields {
        StationFields {
            external_id: self.external_id,
            name_ar: self.name_ar.clone(),
            name_en: self.name_en.clone(),
            name_fr: self.name_fr.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            paths: self.paths.clone(),
            schedule: self.schedule.clone(),
            changes: self.changes.clone(),
            line_ids: self.line_ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> StationFields {
        StationFields {
            name_ar: "محطة".to_string(),
            name_en: "Central".to_string(),
            name_fr: "Centrale".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_station_passes() {
        assert!(valid_fields().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut fields = valid_fields();
        fields.name_fr = "  ".to_string();
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_bad_json_rejected() {
        let mut fields = valid_fields();
        fields.paths = "{not json".to_string();
        assert!(fields.validate().is_err());

        let mut fields = valid_fields();
        fields.changes = "[]".to_string(); // array where object expected
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let mut fields = valid_fields();
        fields.latitude = 91.0;
        assert!(fields.validate().is_err());
    }
}
