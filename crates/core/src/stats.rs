//! Queue counters shown on the operator dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ticket::{Ticket, TicketStatus};

/// Ticket counts by status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueStats {
    pub waiting: usize,
    pub serving: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl QueueStats {
    /// Count every ticket in the snapshot.
    pub fn from_tickets<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Self {
        let mut stats = QueueStats::default();
        for ticket in tickets {
            stats.add(ticket.status);
        }
        stats
    }

    /// Count only tickets created on `day` (UTC).
    pub fn for_day(tickets: &[Ticket], day: NaiveDate) -> Self {
        Self::from_tickets(tickets.iter().filter(|t| t.created_at.date_naive() == day))
    }

    fn add(&mut self, status: TicketStatus) {
        match status {
            TicketStatus::Waiting => self.waiting += 1,
            TicketStatus::Serving => self.serving += 1,
            TicketStatus::Completed => self.completed += 1,
            TicketStatus::Cancelled => self.cancelled += 1,
        }
        self.total += 1;
    }
}
