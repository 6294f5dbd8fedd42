//! Operator request types and their validation rules.
//!
//! Requests are validated before they are relayed to the backend, so the
//! backend only ever sees well-formed input from this dashboard.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::TableStatus;

const CUSTOMER_NAME_MAX: usize = 100;
const NOTES_MAX: usize = 500;
const NAME_MIN: usize = 3;
const NAME_MAX: usize = 50;
const CODE_MIN: usize = 2;
const CODE_MAX: usize = 10;
const DURATION_MIN: i64 = 1;
const DURATION_MAX: i64 = 180;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// A request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Request to issue a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateTicketRequest {
    pub service_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreateTicketRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if uuid::Uuid::parse_str(self.service_type_id.trim()).is_err() {
            return Err(ValidationError::new(
                "service_type_id",
                "must reference a valid service type",
            ));
        }
        check_max("customer_name", self.customer_name.as_deref(), CUSTOMER_NAME_MAX)?;
        check_max("notes", self.notes.as_deref(), NOTES_MAX)?;
        Ok(())
    }

    /// Trim text fields and drop the ones left empty.
    pub fn normalized(mut self) -> Self {
        self.service_type_id = self.service_type_id.trim().to_string();
        self.customer_name = non_blank(self.customer_name);
        self.notes = non_blank(self.notes);
        self
    }
}

/// Request to register a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateTableRequest {
    pub number: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl CreateTableRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_table_number(self.number)?;
        check_len("name", &self.name, NAME_MIN, NAME_MAX)
    }
}

/// Partial update of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateTableRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl UpdateTableRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(number) = self.number {
            check_table_number(number)?;
        }
        if let Some(ref name) = self.name {
            check_len("name", name, NAME_MIN, NAME_MAX)?;
        }
        Ok(())
    }
}

/// Request to define a service type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateServiceTypeRequest {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    pub estimated_duration_minutes: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl CreateServiceTypeRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_len("name", &self.name, NAME_MIN, NAME_MAX)?;
        check_len("code", &self.code, CODE_MIN, CODE_MAX)?;
        check_max("description", self.description.as_deref(), NOTES_MAX)?;
        check_color(&self.color)?;
        check_duration(self.estimated_duration_minutes)
    }

    /// Codes are stored uppercase.
    pub fn normalized(mut self) -> Self {
        self.code = self.code.trim().to_uppercase();
        self.description = non_blank(self.description);
        self
    }
}

/// Partial update of a service type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateServiceTypeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl UpdateServiceTypeRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            check_len("name", name, NAME_MIN, NAME_MAX)?;
        }
        if let Some(ref code) = self.code {
            check_len("code", code, CODE_MIN, CODE_MAX)?;
        }
        check_max("description", self.description.as_deref(), NOTES_MAX)?;
        if let Some(ref color) = self.color {
            check_color(color)?;
        }
        if let Some(minutes) = self.estimated_duration_minutes {
            check_duration(minutes)?;
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.code = self.code.map(|c| c.trim().to_uppercase());
        self
    }
}

fn check_len(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {} characters", min),
        ));
    }
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

fn check_max(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max),
        )),
        _ => Ok(()),
    }
}

fn check_table_number(number: i64) -> Result<(), ValidationError> {
    if number <= 0 || number > u32::MAX as i64 {
        return Err(ValidationError::new("number", "must be a positive integer"));
    }
    Ok(())
}

fn check_color(color: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR.is_match(color) {
        return Err(ValidationError::new("color", "must be a hex color like #1A2B3C"));
    }
    Ok(())
}

fn check_duration(minutes: i64) -> Result<(), ValidationError> {
    if !(DURATION_MIN..=DURATION_MAX).contains(&minutes) {
        return Err(ValidationError::new(
            "estimated_duration_minutes",
            format!("must be between {} and {}", DURATION_MIN, DURATION_MAX),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
