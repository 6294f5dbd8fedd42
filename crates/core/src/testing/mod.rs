//! Testing utilities and a mock backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use turnos_core::testing::{fixtures, MockBackend};
//!
//! let backend = MockBackend::new();
//! backend.set_service_types(vec![fixtures::service_type("Caja", "CAJ")]).await;
//! backend.set_tables(vec![fixtures::table("m1", 1)]).await;
//!
//! // Use in AppState...
//! ```

mod mock_backend;

pub use mock_backend::{MockBackend, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, Utc};

    use crate::service_type::ServiceType;
    use crate::table::Table;
    use crate::ticket::Ticket;
    use crate::validation::CreateTicketRequest;

    /// Service type with a random UUID id.
    pub fn service_type(name: &str, code: &str) -> ServiceType {
        ServiceType::new(uuid::Uuid::new_v4().to_string(), name, code)
    }

    /// Available table named after its number.
    pub fn table(id: &str, number: u32) -> Table {
        Table::new(id, number, format!("Mesa {}", number))
    }

    /// Waiting ticket created `minutes_ago` minutes before now.
    pub fn waiting_ticket(id: &str, code: &str, service_type_id: &str, minutes_ago: i64) -> Ticket {
        Ticket::new(id, code, service_type_id, minutes_before_now(minutes_ago))
    }

    /// Waiting priority ticket created `minutes_ago` minutes before now.
    pub fn priority_ticket(id: &str, code: &str, service_type_id: &str, minutes_ago: i64) -> Ticket {
        waiting_ticket(id, code, service_type_id, minutes_ago).with_priority(true)
    }

    pub fn create_ticket(service_type_id: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            service_type_id: service_type_id.to_string(),
            customer_name: None,
            is_priority: false,
            notes: None,
        }
    }

    fn minutes_before_now(minutes: i64) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(minutes)
    }
}
