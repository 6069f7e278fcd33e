//! Line domain model

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::common::{validate_hex_color, validate_json_array, LineType};
use crate::AppError;

/// A transit line stored locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Local primary key
    pub id: i64,
    /// Identifier assigned by the remote API; absent while un-synced
    pub external_id: Option<i64>,
    pub code: String,
    /// Human-readable commercial code
    pub enterprise_code: String,
    /// `#RRGGBB` display color
    pub color: String,
    pub line_type: LineType,
    /// Local id of the departure station, if resolved
    pub departure_station_id: Option<i64>,
    /// Local id of the terminus station, if resolved
    pub terminus_station_id: Option<i64>,
    /// JSON array of departure time strings
    pub schedule: String,
    /// Local ids of the line's line-station children, in order
    pub line_station_ids: Vec<i64>,
}

/// Field set for creating or updating a line
#[derive(Debug, Clone, PartialEq)]
pub struct LineFields {
    pub external_id: Option<i64>,
    pub code: String,
    pub enterprise_code: String,
    pub color: String,
    pub line_type: LineType,
    pub departure_station_id: Option<i64>,
    pub terminus_station_id: Option<i64>,
    pub schedule: String,
}

impl Default for LineFields {
    fn default() -> Self {
        Self {
            external_id: None,
            code: String::new(),
            enterprise_code: String::new(),
            color: "#000000".to_string(),
            line_type: LineType::Primary,
            departure_station_id: None,
            terminus_station_id: None,
            schedule: "[]".to_string(),
        }
    }
}

impl LineFields {
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::validation("code", "must not be empty"));
        }
        if self.enterprise_code.trim().is_empty() {
            return Err(AppError::validation("enterprise_code", "must not be empty"));
        }
        validate_hex_color("color", &self.color)?;
        validate_json_array("schedule", &self.schedule)?;
        Ok(())
    }
}

impl Line {
    pub fn fields(&self) -> LineFields {
        LineFields {
            external_id: self.external_id,
            code: self.code.clone(),
            enterprise_code: self.enterprise_code.clone(),
            color: self.color.clone(),
            line_type: self.line_type,
            departure_station_id: self.departure_station_id,
            terminus_station_id: self.terminus_station_id,
            schedule: self.schedule.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> LineFields {
        LineFields {
            code: "L1".to_string(),
            enterprise_code: "E1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_line_passes() {
        assert!(valid_fields().validate().is_ok());
    }

    #[test]
    fn test_missing_codes_rejected() {
        let mut fields = valid_fields();
        fields.code = String::new();
        assert!(fields.validate().is_err());

        let mut fields = valid_fields();
        fields.enterprise_code = String::new();
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_bad_color_rejected() {
        let mut fields = valid_fields();
        fields.color = "blue".to_string();
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_bad_schedule_rejected() {
        let mut fields = valid_fields();
        fields.schedule = "\"08:00\"".to_string();
        assert!(fields.validate().is_err());
    }
}
