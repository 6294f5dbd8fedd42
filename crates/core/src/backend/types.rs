//! Backend collaborator trait and error type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service_type::ServiceType;
use crate::table::Table;
use crate::ticket::{Ticket, TicketStatus, Transition};
use crate::validation::{
    CreateServiceTypeRequest, CreateTableRequest, CreateTicketRequest, UpdateServiceTypeRequest,
    UpdateTableRequest,
};

/// Errors reported by the backend.
///
/// Messages come from the backend verbatim and are only ever displayed,
/// never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Backend request timed out")]
    Timeout,

    /// The backend answered with an error.
    #[error("{message}")]
    Api {
        /// HTTP status, when the backend sent one.
        status: Option<u16>,
        message: String,
    },

    /// The backend answered with a payload we could not read.
    #[error("Invalid backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        BackendError::Api {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

/// Filter for listing tickets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type_id: Option<String>,
}

impl TicketQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_service_type(mut self, service_type_id: impl Into<String>) -> Self {
        self.service_type_id = Some(service_type_id.into());
        self
    }
}

/// The REST backend that owns tickets, tables and service types.
///
/// The backend is authoritative: it numbers tickets, serializes table
/// assignment and persists everything. This dashboard relays operator
/// actions to it and keeps a cached copy of what it returns.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    async fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, BackendError>;

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<Ticket, BackendError>;

    /// Relay a call, complete or cancel action.
    async fn transition(
        &self,
        ticket_id: &str,
        transition: &Transition,
    ) -> Result<Ticket, BackendError>;

    async fn list_tables(&self) -> Result<Vec<Table>, BackendError>;

    async fn create_table(&self, request: &CreateTableRequest) -> Result<Table, BackendError>;

    async fn update_table(
        &self,
        id: &str,
        request: &UpdateTableRequest,
    ) -> Result<Table, BackendError>;

    async fn delete_table(&self, id: &str) -> Result<(), BackendError>;

    async fn list_service_types(&self) -> Result<Vec<ServiceType>, BackendError>;

    async fn create_service_type(
        &self,
        request: &CreateServiceTypeRequest,
    ) -> Result<ServiceType, BackendError>;

    async fn update_service_type(
        &self,
        id: &str,
        request: &UpdateServiceTypeRequest,
    ) -> Result<ServiceType, BackendError>;

    async fn delete_service_type(&self, id: &str) -> Result<(), BackendError>;
}
