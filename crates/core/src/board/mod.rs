//! Public display boards and the operator dashboard summary.
//!
//! Boards are views computed from a queue snapshot on every request; they
//! hold no state of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::QueueSnapshot;
use crate::stats::QueueStats;
use crate::ticket::{order_for_public_queue, order_serving, Ticket, TicketStatus};

/// How many entries each board shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardLimits {
    /// Entries on the public waiting board.
    #[serde(default = "default_waiting")]
    pub waiting: usize,

    /// Waiting entries shown next to the attention board.
    #[serde(default = "default_attention_waiting")]
    pub attention_waiting: usize,

    /// Serving entries on the attention board (None = show all).
    #[serde(default)]
    pub attention_serving: Option<usize>,

    /// Waiting entries on the operator dashboard.
    #[serde(default = "default_dashboard_waiting")]
    pub dashboard_waiting: usize,
}

fn default_waiting() -> usize {
    12
}

fn default_attention_waiting() -> usize {
    8
}

fn default_dashboard_waiting() -> usize {
    10
}

impl Default for BoardLimits {
    fn default() -> Self {
        Self {
            waiting: default_waiting(),
            attention_waiting: default_attention_waiting(),
            attention_serving: None,
            dashboard_waiting: default_dashboard_waiting(),
        }
    }
}

/// One line on a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardEntry {
    pub ticket_id: String,
    pub code: String,
    pub status: TicketStatus,
    pub is_priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Creation time for waiting tickets, call time for serving ones.
    pub since: DateTime<Utc>,
}

impl BoardEntry {
    fn from_ticket(ticket: &Ticket, snapshot: &QueueSnapshot) -> Self {
        let service = snapshot.service_type(&ticket.service_type_id);
        let table = ticket.table_id.as_deref().and_then(|id| snapshot.table(id));
        let since = match ticket.status {
            TicketStatus::Waiting => ticket.created_at,
            _ => ticket.called_at.unwrap_or(ticket.created_at),
        };

        Self {
            ticket_id: ticket.id.clone(),
            code: ticket.code.clone(),
            status: ticket.status,
            is_priority: ticket.is_priority,
            customer_name: ticket.customer_name.clone(),
            service_name: service.map(|s| s.name.clone()),
            service_color: service.map(|s| s.color.clone()),
            table_number: table.map(|t| t.number),
            table_name: table.map(|t| t.name.clone()),
            since,
        }
    }
}

/// Public waiting board: the next customers to be served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitingBoard {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<BoardEntry>,
    /// Waiting tickets in total, including those not shown.
    pub total_waiting: usize,
}

/// Attention board: tickets being served plus the head of the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttentionBoard {
    pub generated_at: DateTime<Utc>,
    pub serving: Vec<BoardEntry>,
    pub waiting: Vec<BoardEntry>,
    pub total_serving: usize,
    pub total_waiting: usize,
}

/// Operator dashboard: today's counters and the current queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub generated_at: DateTime<Utc>,
    pub today: QueueStats,
    pub serving: Vec<BoardEntry>,
    pub waiting: Vec<BoardEntry>,
    pub total_waiting: usize,
}

fn entries(tickets: &[Ticket], limit: Option<usize>, snapshot: &QueueSnapshot) -> Vec<BoardEntry> {
    tickets
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|t| BoardEntry::from_ticket(t, snapshot))
        .collect()
}

pub fn waiting_board(snapshot: &QueueSnapshot, limits: &BoardLimits, now: DateTime<Utc>) -> WaitingBoard {
    let queue = order_for_public_queue(&snapshot.tickets);
    WaitingBoard {
        generated_at: now,
        entries: entries(&queue, Some(limits.waiting), snapshot),
        total_waiting: queue.len(),
    }
}

pub fn attention_board(
    snapshot: &QueueSnapshot,
    limits: &BoardLimits,
    now: DateTime<Utc>,
) -> AttentionBoard {
    let serving = order_serving(&snapshot.tickets);
    let queue = order_for_public_queue(&snapshot.tickets);
    AttentionBoard {
        generated_at: now,
        serving: entries(&serving, limits.attention_serving, snapshot),
        waiting: entries(&queue, Some(limits.attention_waiting), snapshot),
        total_serving: serving.len(),
        total_waiting: queue.len(),
    }
}

pub fn dashboard_summary(
    snapshot: &QueueSnapshot,
    limits: &BoardLimits,
    now: DateTime<Utc>,
) -> DashboardSummary {
    let serving = order_serving(&snapshot.tickets);
    let queue = order_for_public_queue(&snapshot.tickets);
    DashboardSummary {
        generated_at: now,
        today: QueueStats::for_day(&snapshot.tickets, now.date_naive()),
        serving: entries(&serving, None, snapshot),
        waiting: entries(&queue, Some(limits.dashboard_waiting), snapshot),
        total_waiting: queue.len(),
    }
}
