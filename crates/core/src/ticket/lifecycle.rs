//! Ticket lifecycle: legal transitions and their effects.
//!
//! `apply_transition` is the single source of truth for what a ticket looks
//! like after an operator action. It performs no I/O; callers pass the clock
//! in so the result is deterministic.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Ticket, TicketStatus};

/// An operator action on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    /// `waiting -> serving`: call the ticket to a table.
    Call { table_id: String },
    /// `serving -> completed`.
    Complete {
        #[serde(default)]
        notes: Option<String>,
    },
    /// `waiting | serving -> cancelled`.
    Cancel {
        #[serde(default)]
        notes: Option<String>,
    },
}

impl Transition {
    pub fn call(table_id: impl Into<String>) -> Self {
        Transition::Call {
            table_id: table_id.into(),
        }
    }

    pub fn complete() -> Self {
        Transition::Complete { notes: None }
    }

    pub fn cancel() -> Self {
        Transition::Cancel { notes: None }
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Call { .. } => TransitionKind::Call,
            Transition::Complete { .. } => TransitionKind::Complete,
            Transition::Cancel { .. } => TransitionKind::Cancel,
        }
    }
}

/// Transition discriminant, used in errors and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Call,
    Complete,
    Cancel,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Call => "call",
            TransitionKind::Complete => "complete",
            TransitionKind::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The transition is not permitted from the ticket's current status.
    #[error("Cannot {transition} ticket {ticket_id}: current status is {from}")]
    InvalidTransition {
        ticket_id: String,
        from: TicketStatus,
        transition: TransitionKind,
    },

    /// A call was requested without a table to call the ticket to.
    #[error("Cannot call ticket {ticket_id}: a table is required")]
    MissingTable { ticket_id: String },
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// The ticket after the transition.
    pub ticket: Ticket,
    /// Table that became occupied by this ticket.
    pub occupied_table: Option<String>,
    /// Table that was released and is available again.
    pub released_table: Option<String>,
}

/// Apply `transition` to `ticket` at instant `at`.
///
/// The input ticket is left untouched. Terminal tickets reject every
/// transition, as does skipping `serving` on the way to `completed`.
pub fn apply_transition(
    ticket: &Ticket,
    transition: Transition,
    at: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    let invalid = || TransitionError::InvalidTransition {
        ticket_id: ticket.id.clone(),
        from: ticket.status,
        transition: transition.kind(),
    };

    let mut next = ticket.clone();
    next.updated_at = at;

    match (ticket.status, &transition) {
        (TicketStatus::Waiting, Transition::Call { table_id }) => {
            let table_id = table_id.trim();
            if table_id.is_empty() {
                return Err(TransitionError::MissingTable {
                    ticket_id: ticket.id.clone(),
                });
            }
            next.status = TicketStatus::Serving;
            next.table_id = Some(table_id.to_string());
            next.called_at = Some(at);
            next.attended_at = Some(at);
            Ok(TransitionOutcome {
                occupied_table: next.table_id.clone(),
                ticket: next,
                released_table: None,
            })
        }
        (TicketStatus::Serving, Transition::Complete { notes }) => {
            next.status = TicketStatus::Completed;
            next.completed_at = Some(at);
            if notes.is_some() {
                next.notes = notes.clone();
            }
            Ok(TransitionOutcome {
                released_table: ticket.table_id.clone(),
                ticket: next,
                occupied_table: None,
            })
        }
        (TicketStatus::Waiting | TicketStatus::Serving, Transition::Cancel { notes }) => {
            next.status = TicketStatus::Cancelled;
            next.completed_at = Some(at);
            if notes.is_some() {
                next.notes = notes.clone();
            }
            // Only a serving ticket holds a table.
            let released_table = if ticket.status == TicketStatus::Serving {
                ticket.table_id.clone()
            } else {
                None
            };
            Ok(TransitionOutcome {
                ticket: next,
                occupied_table: None,
                released_table,
            })
        }
        _ => Err(invalid()),
    }
}
