//! Driver and passenger profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::common::validate_json_array;
use crate::AppError;

/// Which profile collection a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    Driver,
    Passenger,
}

impl ProfileKind {
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Passenger => "passenger",
        }
    }

    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "driver" => Ok(Self::Driver),
            "passenger" => Ok(Self::Passenger),
            other => Err(AppError::validation(
                "kind",
                format!("unknown profile kind '{other}'"),
            )),
        }
    }
}

/// A driver or passenger profile mirrored from the remote profile service
///
/// Both collections share the same shape; drivers additionally carry a
/// `driver_number`. The duplicate business key on user-side create is
/// `(phone_number, username)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Local primary key
    pub id: i64,
    /// Identifier assigned by the remote API; absent while un-synced
    pub external_id: Option<i64>,
    pub kind: ProfileKind,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    /// Only meaningful for drivers
    pub driver_number: String,
    pub username: String,
    /// JSON array of ride external ids
    pub rides: String,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Field set for creating or updating a profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileFields {
    pub external_id: Option<i64>,
    pub kind: ProfileKind,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub driver_number: String,
    pub username: String,
    pub rides: String,
    pub last_sync: Option<DateTime<Utc>>,
}

impl ProfileFields {
    pub fn new(kind: ProfileKind) -> Self {
        Self {
            external_id: None,
            kind,
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            driver_number: String::new(),
            username: String::new(),
            rides: "[]".to_string(),
            last_sync: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("phone_number", &self.phone_number),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(field, "must not be empty"));
            }
        }
        if self.kind == ProfileKind::Driver && self.driver_number.trim().is_empty() {
            return Err(AppError::validation("driver_number", "must not be empty"));
        }
        validate_json_array("rides", &self.rides)?;
        Ok(())
    }
}

impl Profile {
    pub fn fields(&self) -> ProfileFields {
        ProfileFields {
            external_id: self.external_id,
            kind: self.kind,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            driver_number: self.driver_number.clone(),
            username: self.username.clone(),
            rides: self.rides.clone(),
            last_sync: self.last_sync,
        }
    }
}
