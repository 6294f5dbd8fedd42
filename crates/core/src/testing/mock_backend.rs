//! Mock backend for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::{Backend, BackendError, TicketQuery};
use crate::service_type::ServiceType;
use crate::table::{Table, TableStatus};
use crate::ticket::{apply_transition, Ticket, Transition};
use crate::validation::{
    CreateServiceTypeRequest, CreateTableRequest, CreateTicketRequest, UpdateServiceTypeRequest,
    UpdateTableRequest,
};

/// A recorded backend call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Operation name, e.g. "list_tickets" or "call".
    pub operation: String,
    /// Entity the call targeted, if any.
    pub target: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    tickets: Vec<Ticket>,
    tables: Vec<Table>,
    service_types: Vec<ServiceType>,
    /// Last issued sequence number per service code.
    sequences: HashMap<String, u32>,
}

/// In-memory implementation of the Backend trait.
///
/// Behaves like the real backend for the happy path: it numbers tickets
/// per service, applies lifecycle rules and keeps table status in step
/// with calls and completions. Failures can be injected per call or for
/// every call.
///
/// # Example
///
/// ```rust,ignore
/// use turnos_core::testing::{MockBackend, fixtures};
///
/// let backend = MockBackend::new();
/// let caja = fixtures::service_type("Caja", "CAJ");
/// backend.set_service_types(vec![caja.clone()]).await;
/// backend.set_tables(vec![fixtures::table("m1", 1)]).await;
///
/// let ticket = backend.create_ticket(&fixtures::create_ticket(&caja.id)).await?;
/// assert_eq!(ticket.code, "CAJ-001");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<RwLock<MockState>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<BackendError>>>,
    /// If set, every call fails with this error until cleared.
    outage: Arc<RwLock<Option<BackendError>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_tickets(&self, tickets: Vec<Ticket>) {
        self.state.write().await.tickets = tickets;
    }

    pub async fn add_ticket(&self, ticket: Ticket) {
        self.state.write().await.tickets.push(ticket);
    }

    pub async fn set_tables(&self, tables: Vec<Table>) {
        self.state.write().await.tables = tables;
    }

    pub async fn set_service_types(&self, service_types: Vec<ServiceType>) {
        self.state.write().await.service_types = service_types;
    }

    /// Current state of a ticket as the backend sees it.
    pub async fn ticket(&self, id: &str) -> Option<Ticket> {
        self.state
            .read()
            .await
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Current state of a table as the backend sees it.
    pub async fn table(&self, id: &str) -> Option<Table> {
        self.state
            .read()
            .await
            .tables
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Fail the next call with the given error.
    pub async fn fail_next(&self, error: BackendError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every call with the given error, or recover with `None`.
    pub async fn set_outage(&self, error: Option<BackendError>) {
        *self.outage.write().await = error;
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Number of recorded calls for an operation.
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    async fn begin(&self, operation: &str, target: Option<&str>) -> Result<(), BackendError> {
        self.calls.write().await.push(RecordedCall {
            operation: operation.to_string(),
            target: target.map(str::to_string),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(ref error) = *self.outage.read().await {
            return Err(error.clone());
        }
        Ok(())
    }
}

fn not_found(what: &str) -> BackendError {
    BackendError::api(404, format!("{} no encontrado", what))
}

fn table_number(number: i64) -> Result<u32, BackendError> {
    u32::try_from(number).map_err(|_| BackendError::api(400, "Número de mesa inválido"))
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, BackendError> {
        self.begin("list_tickets", None).await?;
        let state = self.state.read().await;
        Ok(state
            .tickets
            .iter()
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .filter(|t| {
                query
                    .service_type_id
                    .as_ref()
                    .is_none_or(|id| &t.service_type_id == id)
            })
            .cloned()
            .collect())
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<Ticket, BackendError> {
        self.begin("create_ticket", Some(&request.service_type_id))
            .await?;
        let mut state = self.state.write().await;

        let code = state
            .service_types
            .iter()
            .find(|s| s.id == request.service_type_id && s.active)
            .map(|s| s.code.clone())
            .ok_or_else(|| not_found("Tipo de servicio"))?;

        let sequence = state.sequences.entry(code.clone()).or_insert(0);
        *sequence += 1;
        let code = format!("{}-{:03}", code, sequence);

        let mut ticket = Ticket::new(
            uuid::Uuid::new_v4().to_string(),
            code,
            request.service_type_id.clone(),
            Utc::now(),
        )
        .with_priority(request.is_priority);
        ticket.customer_name = request.customer_name.clone();
        ticket.notes = request.notes.clone();

        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn transition(
        &self,
        ticket_id: &str,
        transition: &Transition,
    ) -> Result<Ticket, BackendError> {
        self.begin(transition.kind().as_str(), Some(ticket_id))
            .await?;
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Transition::Call { table_id } = transition {
            let callable = state
                .tables
                .iter()
                .find(|t| t.id == table_id.trim())
                .map(Table::is_callable)
                .ok_or_else(|| not_found("Mesa"))?;
            if !callable {
                return Err(BackendError::api(400, "La mesa no está disponible"));
            }
        }

        let ticket = state
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .ok_or_else(|| not_found("Turno"))?;
        let outcome = apply_transition(ticket, transition.clone(), now)
            .map_err(|e| BackendError::api(400, e.to_string()))?;

        for table in state.tables.iter_mut() {
            if outcome.occupied_table.as_deref() == Some(table.id.as_str()) {
                table.occupy(now);
            } else if outcome.released_table.as_deref() == Some(table.id.as_str()) {
                table.release(now);
            }
        }
        if let Some(existing) = state.tickets.iter_mut().find(|t| t.id == ticket_id) {
            *existing = outcome.ticket.clone();
        }

        Ok(outcome.ticket)
    }

    async fn list_tables(&self) -> Result<Vec<Table>, BackendError> {
        self.begin("list_tables", None).await?;
        Ok(self.state.read().await.tables.clone())
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<Table, BackendError> {
        self.begin("create_table", None).await?;
        let number = table_number(request.number)?;
        let mut state = self.state.write().await;

        if state.tables.iter().any(|t| t.number == number) {
            return Err(BackendError::api(409, "Este número de mesa ya está en uso"));
        }

        let now = Utc::now();
        let mut table = Table::new(
            uuid::Uuid::new_v4().to_string(),
            number,
            request.name.trim(),
        );
        table.status = request.status.unwrap_or_default();
        table.active = request.active.unwrap_or(true);
        table.created_at = Some(now);
        table.updated_at = Some(now);

        state.tables.push(table.clone());
        Ok(table)
    }

    async fn update_table(
        &self,
        id: &str,
        request: &UpdateTableRequest,
    ) -> Result<Table, BackendError> {
        self.begin("update_table", Some(id)).await?;
        let mut state = self.state.write().await;

        if let Some(number) = request.number {
            let number = table_number(number)?;
            if state.tables.iter().any(|t| t.number == number && t.id != id) {
                return Err(BackendError::api(409, "Este número de mesa ya está en uso"));
            }
        }

        let table = state
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Mesa"))?;
        if let Some(number) = request.number {
            table.number = table_number(number)?;
        }
        if let Some(ref name) = request.name {
            table.name = name.trim().to_string();
        }
        if let Some(status) = request.status {
            table.status = status;
        }
        if let Some(active) = request.active {
            table.active = active;
        }
        table.updated_at = Some(Utc::now());

        Ok(table.clone())
    }

    async fn delete_table(&self, id: &str) -> Result<(), BackendError> {
        self.begin("delete_table", Some(id)).await?;
        let mut state = self.state.write().await;

        let table = state
            .tables
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Mesa"))?;
        if table.status == TableStatus::Occupied {
            return Err(BackendError::api(
                400,
                "No se puede eliminar una mesa ocupada",
            ));
        }

        state.tables.retain(|t| t.id != id);
        Ok(())
    }

    async fn list_service_types(&self) -> Result<Vec<ServiceType>, BackendError> {
        self.begin("list_service_types", None).await?;
        Ok(self.state.read().await.service_types.clone())
    }

    async fn create_service_type(
        &self,
        request: &CreateServiceTypeRequest,
    ) -> Result<ServiceType, BackendError> {
        self.begin("create_service_type", None).await?;
        let mut state = self.state.write().await;

        if state.service_types.iter().any(|s| s.code == request.code) {
            return Err(BackendError::api(409, "Este código ya está en uso"));
        }

        let service_type = ServiceType {
            description: request.description.clone(),
            color: request.color.clone(),
            estimated_duration_minutes: request.estimated_duration_minutes.max(0) as u32,
            active: request.active,
            ..ServiceType::new(
                uuid::Uuid::new_v4().to_string(),
                request.name.trim(),
                request.code.clone(),
            )
        };

        state.service_types.push(service_type.clone());
        Ok(service_type)
    }

    async fn update_service_type(
        &self,
        id: &str,
        request: &UpdateServiceTypeRequest,
    ) -> Result<ServiceType, BackendError> {
        self.begin("update_service_type", Some(id)).await?;
        let mut state = self.state.write().await;

        if let Some(ref code) = request.code {
            if state
                .service_types
                .iter()
                .any(|s| &s.code == code && s.id != id)
            {
                return Err(BackendError::api(409, "Este código ya está en uso"));
            }
        }

        let service_type = state
            .service_types
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("Tipo de servicio"))?;
        if let Some(ref name) = request.name {
            service_type.name = name.trim().to_string();
        }
        if let Some(ref code) = request.code {
            service_type.code = code.clone();
        }
        if request.description.is_some() {
            service_type.description = request.description.clone();
        }
        if let Some(ref color) = request.color {
            service_type.color = color.clone();
        }
        if let Some(minutes) = request.estimated_duration_minutes {
            service_type.estimated_duration_minutes = minutes.max(0) as u32;
        }
        if let Some(active) = request.active {
            service_type.active = active;
        }

        Ok(service_type.clone())
    }

    async fn delete_service_type(&self, id: &str) -> Result<(), BackendError> {
        self.begin("delete_service_type", Some(id)).await?;
        let mut state = self.state.write().await;

        if !state.service_types.iter().any(|s| s.id == id) {
            return Err(not_found("Tipo de servicio"));
        }
        if state
            .tickets
            .iter()
            .any(|t| t.service_type_id == id && t.status.is_active())
        {
            return Err(BackendError::api(
                400,
                "El tipo de servicio tiene turnos activos",
            ));
        }

        state.service_types.retain(|s| s.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use crate::ticket::TicketStatus;

    async fn seeded() -> (MockBackend, ServiceType) {
        let backend = MockBackend::new();
        let caja = fixtures::service_type("Caja", "CAJ");
        backend.set_service_types(vec![caja.clone()]).await;
        backend
            .set_tables(vec![fixtures::table("m1", 1), fixtures::table("m2", 2)])
            .await;
        (backend, caja)
    }

    #[test]
    fn test_create_ticket_numbers_per_service() {
        tokio_test::block_on(async {
            let (backend, caja) = seeded().await;
            let first = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            let second = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            assert_eq!(first.code, "CAJ-001");
            assert_eq!(second.code, "CAJ-002");
            assert_eq!(first.status, TicketStatus::Waiting);
        });
    }

    #[test]
    fn test_create_ticket_unknown_service() {
        tokio_test::block_on(async {
            let (backend, _) = seeded().await;
            let err = backend
                .create_ticket(&fixtures::create_ticket(&uuid::Uuid::new_v4().to_string()))
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(404));
        });
    }

    #[test]
    fn test_call_occupies_table_and_complete_releases_it() {
        tokio_test::block_on(async {
            let (backend, caja) = seeded().await;
            let ticket = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();

            let called = backend
                .transition(&ticket.id, &Transition::call("m1"))
                .await
                .unwrap();
            assert_eq!(called.status, TicketStatus::Serving);
            assert_eq!(
                backend.table("m1").await.unwrap().status,
                TableStatus::Occupied
            );

            backend
                .transition(&ticket.id, &Transition::complete())
                .await
                .unwrap();
            assert_eq!(
                backend.table("m1").await.unwrap().status,
                TableStatus::Available
            );
        });
    }

    #[test]
    fn test_call_to_occupied_table_rejected() {
        tokio_test::block_on(async {
            let (backend, caja) = seeded().await;
            let a = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            let b = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            backend
                .transition(&a.id, &Transition::call("m1"))
                .await
                .unwrap();

            let err = backend
                .transition(&b.id, &Transition::call("m1"))
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(400));
            assert_eq!(
                backend.ticket(&b.id).await.unwrap().status,
                TicketStatus::Waiting
            );
        });
    }

    #[test]
    fn test_illegal_transition_rejected() {
        tokio_test::block_on(async {
            let (backend, caja) = seeded().await;
            let ticket = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            let err = backend
                .transition(&ticket.id, &Transition::complete())
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(400));
        });
    }

    #[test]
    fn test_duplicate_table_number() {
        tokio_test::block_on(async {
            let (backend, _) = seeded().await;
            let err = backend
                .create_table(&CreateTableRequest {
                    number: 1,
                    name: "Mesa uno".to_string(),
                    status: None,
                    active: None,
                })
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(409));
            assert_eq!(err.to_string(), "Este número de mesa ya está en uso");
        });
    }

    #[test]
    fn test_fail_next_and_outage() {
        tokio_test::block_on(async {
            let (backend, _) = seeded().await;

            backend.fail_next(BackendError::Timeout).await;
            assert_eq!(backend.list_tables().await, Err(BackendError::Timeout));
            assert!(backend.list_tables().await.is_ok());

            backend
                .set_outage(Some(BackendError::ConnectionFailed("down".into())))
                .await;
            assert!(backend.list_tables().await.is_err());
            assert!(backend.list_service_types().await.is_err());
            backend.set_outage(None).await;
            assert!(backend.list_tables().await.is_ok());

            assert_eq!(backend.call_count("list_tables").await, 4);
        });
    }

    #[test]
    fn test_list_tickets_filters_by_status() {
        tokio_test::block_on(async {
            let (backend, caja) = seeded().await;
            let a = backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            backend
                .create_ticket(&fixtures::create_ticket(&caja.id))
                .await
                .unwrap();
            backend
                .transition(&a.id, &Transition::cancel())
                .await
                .unwrap();

            let waiting = backend
                .list_tickets(&TicketQuery::new().with_status(TicketStatus::Waiting))
                .await
                .unwrap();
            assert_eq!(waiting.len(), 1);
            let all = backend.list_tickets(&TicketQuery::new()).await.unwrap();
            assert_eq!(all.len(), 2);
        });
    }
}
