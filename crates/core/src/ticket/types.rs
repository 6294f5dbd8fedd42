//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a ticket.
///
/// ```text
/// Waiting -> Serving -> Completed
///    |          |
///    +----------+----> Cancelled
/// ```
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// In the queue, no table assigned yet.
    Waiting,
    /// Called to a table and being attended.
    Serving,
    /// Attention finished (terminal).
    Completed,
    /// Withdrawn before or during attention (terminal).
    Cancelled,
}

impl TicketStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Waiting,
        TicketStatus::Serving,
        TicketStatus::Completed,
        TicketStatus::Cancelled,
    ];

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// Returns true while the ticket still occupies the queue or a table.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns the status as a string (for filtering and metric labels).
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Serving => "serving",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown ticket status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "serving" => Ok(TicketStatus::Serving),
            "completed" => Ok(TicketStatus::Completed),
            "cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One customer's entry in the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Opaque identifier assigned by the backend.
    pub id: String,

    /// Human-readable label, e.g. `"A-12"` (service code + sequence).
    pub code: String,

    /// Service type requested by the customer.
    pub service_type_id: String,

    /// Table serving (or that served) this ticket. Absent while waiting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,

    /// Current lifecycle status.
    pub status: TicketStatus,

    /// Priority tickets are served ahead of regular ones.
    #[serde(default)]
    pub is_priority: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    /// Operator observations recorded on completion or cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Creation time. Never changes; authoritative for FIFO order.
    pub created_at: DateTime<Utc>,

    /// When the ticket was called to a table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub called_at: Option<DateTime<Utc>>,

    /// When attention started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attended_at: Option<DateTime<Utc>>,

    /// When the ticket reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a fresh waiting ticket.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        service_type_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            service_type_id: service_type_id.into(),
            table_id: None,
            status: TicketStatus::Waiting,
            is_priority: false,
            customer_name: None,
            notes: None,
            created_at,
            called_at: None,
            attended_at: None,
            completed_at: None,
            updated_at: created_at,
        }
    }

    /// Mark the ticket as priority.
    pub fn with_priority(mut self, is_priority: bool) -> Self {
        self.is_priority = is_priority;
        self
    }

    /// Attach a customer name.
    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn is_waiting(&self) -> bool {
        self.status == TicketStatus::Waiting
    }

    pub fn is_serving(&self) -> bool {
        self.status == TicketStatus::Serving
    }
}
