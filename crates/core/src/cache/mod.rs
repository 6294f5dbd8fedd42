//! In-memory view of the entities fetched from the backend.
//!
//! The cache is an explicit state object owned by the caller (the server
//! wraps it in a lock). It may be stale between refreshes. Post-transition
//! patches go through `apply_transition`, so a patched entry matches what a
//! refetch would return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::service_type::ServiceType;
use crate::table::{Table, TableStatus};
use crate::ticket::{apply_transition, Ticket, TicketStatus, Transition, TransitionError, TransitionOutcome};

/// Error type for cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// One consistent set of tickets, tables and service types.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueueSnapshot {
    pub tickets: Vec<Ticket>,
    pub tables: Vec<Table>,
    pub service_types: Vec<ServiceType>,
}

impl QueueSnapshot {
    pub fn ticket(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn service_type(&self, id: &str) -> Option<&ServiceType> {
        self.service_types.iter().find(|s| s.id == id)
    }
}

/// Client-side cache of the queue state.
#[derive(Debug, Clone, Default)]
pub struct QueueCache {
    snapshot: QueueSnapshot,
    last_refreshed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl QueueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with an initial snapshot.
    pub fn with_snapshot(snapshot: QueueSnapshot, at: DateTime<Utc>) -> Self {
        let mut cache = Self::new();
        cache.replace_snapshot(snapshot, at);
        cache
    }

    pub fn snapshot(&self) -> &QueueSnapshot {
        &self.snapshot
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed_at
    }

    /// Message of the last failed refresh, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replace everything with a freshly fetched snapshot.
    pub fn replace_snapshot(&mut self, snapshot: QueueSnapshot, at: DateTime<Utc>) {
        debug!(
            tickets = snapshot.tickets.len(),
            tables = snapshot.tables.len(),
            service_types = snapshot.service_types.len(),
            "Replacing queue snapshot"
        );
        self.snapshot = snapshot;
        self.last_refreshed_at = Some(at);
        self.last_error = None;
    }

    /// Record a failed refresh. The previous snapshot is kept.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.snapshot.tickets
    }

    pub fn tables(&self) -> &[Table] {
        &self.snapshot.tables
    }

    pub fn service_types(&self) -> &[ServiceType] {
        &self.snapshot.service_types
    }

    pub fn ticket(&self, id: &str) -> Option<&Ticket> {
        self.snapshot.ticket(id)
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.snapshot.table(id)
    }

    /// Tickets with the given status, or all of them.
    pub fn tickets_with_status(&self, status: Option<TicketStatus>) -> Vec<Ticket> {
        self.snapshot
            .tickets
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect()
    }

    /// Compute the result of a transition on a cached ticket without
    /// changing the cache.
    pub fn prepare_transition(
        &self,
        ticket_id: &str,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, CacheError> {
        let ticket = self
            .ticket(ticket_id)
            .ok_or_else(|| CacheError::TicketNotFound(ticket_id.to_string()))?;
        Ok(apply_transition(ticket, transition, at)?)
    }

    /// Patch the cache with a transition outcome: replace the ticket and
    /// flip the status of the tables it occupied or released.
    pub fn commit_transition(&mut self, outcome: &TransitionOutcome) {
        let at = outcome.ticket.updated_at;
        self.put_ticket(outcome.ticket.clone(), false);

        if let Some(ref table_id) = outcome.occupied_table {
            if let Some(table) = self.table_mut(table_id) {
                table.occupy(at);
            }
        }
        if let Some(ref table_id) = outcome.released_table {
            if let Some(table) = self.table_mut(table_id) {
                table.release(at);
            }
        }
    }

    /// Patch the cache with a ticket returned by the backend after a
    /// transition, and bring table statuses in line with it.
    ///
    /// The ticket is compared against the cached entry as it is now, not as
    /// it was when the transition was prepared. A ticket older than the
    /// cached one is ignored and the cached entry is returned unchanged.
    pub fn reconcile_ticket(&mut self, ticket: Ticket) -> TransitionOutcome {
        let previous = self.ticket(&ticket.id).cloned();
        if let Some(ref cached) = previous {
            if cached.updated_at > ticket.updated_at {
                debug!(ticket_id = %ticket.id, "Ignoring stale ticket from backend");
                return TransitionOutcome {
                    ticket: cached.clone(),
                    occupied_table: None,
                    released_table: None,
                };
            }
        }

        let at = ticket.updated_at;
        let mut vacated = Vec::new();
        if let Some(table_id) = previous.as_ref().and_then(serving_table) {
            vacated.push(table_id.to_string());
        }
        if ticket.status != TicketStatus::Serving {
            if let Some(ref table_id) = ticket.table_id {
                vacated.push(table_id.clone());
            }
        }
        let held = serving_table(&ticket).map(str::to_string);
        vacated.retain(|id| Some(id) != held.as_ref());

        self.put_ticket(ticket.clone(), false);

        let mut occupied_table = None;
        if let Some(table_id) = held {
            if let Some(table) = self.table_mut(&table_id) {
                if table.status != TableStatus::Occupied {
                    table.occupy(at);
                    occupied_table = Some(table_id);
                }
            }
        }

        let mut released_table = None;
        for table_id in vacated {
            let still_held = self
                .snapshot
                .tickets
                .iter()
                .any(|t| serving_table(t) == Some(table_id.as_str()));
            if still_held {
                continue;
            }
            if let Some(table) = self.table_mut(&table_id) {
                if table.status == TableStatus::Occupied {
                    table.release(at);
                    released_table = Some(table_id);
                }
            }
        }

        TransitionOutcome {
            ticket,
            occupied_table,
            released_table,
        }
    }

    /// `prepare_transition` followed by `commit_transition`.
    pub fn apply_transition(
        &mut self,
        ticket_id: &str,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<Ticket, CacheError> {
        let outcome = self.prepare_transition(ticket_id, transition, at)?;
        self.commit_transition(&outcome);
        Ok(outcome.ticket)
    }

    /// Insert a newly issued ticket (shown first) or replace an existing one.
    pub fn insert_ticket(&mut self, ticket: Ticket) {
        self.put_ticket(ticket, true);
    }

    pub fn upsert_table(&mut self, table: Table) {
        match self.table_mut(&table.id) {
            Some(existing) => *existing = table,
            None => self.snapshot.tables.push(table),
        }
    }

    /// Returns true if the table was cached.
    pub fn remove_table(&mut self, id: &str) -> bool {
        let before = self.snapshot.tables.len();
        self.snapshot.tables.retain(|t| t.id != id);
        self.snapshot.tables.len() != before
    }

    pub fn upsert_service_type(&mut self, service_type: ServiceType) {
        match self
            .snapshot
            .service_types
            .iter_mut()
            .find(|s| s.id == service_type.id)
        {
            Some(existing) => *existing = service_type,
            None => self.snapshot.service_types.push(service_type),
        }
    }

    /// Returns true if the service type was cached.
    pub fn remove_service_type(&mut self, id: &str) -> bool {
        let before = self.snapshot.service_types.len();
        self.snapshot.service_types.retain(|s| s.id != id);
        self.snapshot.service_types.len() != before
    }

    fn put_ticket(&mut self, ticket: Ticket, front: bool) {
        match self.snapshot.tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(existing) => *existing = ticket,
            None if front => self.snapshot.tickets.insert(0, ticket),
            None => self.snapshot.tickets.push(ticket),
        }
    }

    fn table_mut(&mut self, id: &str) -> Option<&mut Table> {
        self.snapshot.tables.iter_mut().find(|t| t.id == id)
    }
}

/// Table held by a ticket that is currently being served.
fn serving_table(ticket: &Ticket) -> Option<&str> {
    match ticket.status {
        TicketStatus::Serving => ticket.table_id.as_deref(),
        _ => None,
    }
}
