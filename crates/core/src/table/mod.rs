//! Service tables (windows) that attend one ticket at a time.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability of a table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    /// Holding exactly one serving ticket.
    Occupied,
    /// Out of service.
    Inactive,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical service point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: String,
    /// Number shown to customers.
    pub number: u32,
    pub name: String,
    pub status: TableStatus,
    /// Soft-delete flag.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Table {
    pub fn new(id: impl Into<String>, number: u32, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number,
            name: name.into(),
            status: TableStatus::Available,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns true if a waiting ticket may be called to this table.
    pub fn is_callable(&self) -> bool {
        self.active && self.status == TableStatus::Available
    }

    /// Mark the table as holding a serving ticket.
    pub fn occupy(&mut self, at: DateTime<Utc>) {
        self.status = TableStatus::Occupied;
        self.updated_at = Some(at);
    }

    /// Return an occupied table to service. Inactive tables stay inactive.
    pub fn release(&mut self, at: DateTime<Utc>) {
        if self.status == TableStatus::Occupied {
            self.status = TableStatus::Available;
            self.updated_at = Some(at);
        }
    }
}

/// Tables a ticket can be called to, ordered by number.
pub fn callable_tables(tables: &[Table]) -> Vec<Table> {
    let mut callable: Vec<Table> = tables.iter().filter(|t| t.is_callable()).cloned().collect();
    callable.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
    callable
}

/// Tables that have not been soft-deleted, ordered by number.
pub fn active_tables(tables: &[Table]) -> Vec<Table> {
    let mut active: Vec<Table> = tables.iter().filter(|t| t.active).cloned().collect();
    active.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
    active
}
