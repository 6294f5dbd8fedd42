pub mod backend;
pub mod board;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod refresh;
pub mod service_type;
pub mod stats;
pub mod table;
pub mod testing;
pub mod ticket;
pub mod validation;

pub use backend::{Backend, BackendError, RestBackend, TicketQuery};
pub use board::{
    attention_board, dashboard_summary, waiting_board, AttentionBoard, BoardEntry, BoardLimits,
    DashboardSummary, WaitingBoard,
};
pub use cache::{CacheError, QueueCache, QueueSnapshot};
pub use config::{
    load_config, load_config_from_str, validate_config, BackendConfig, Config, ConfigError,
    RefreshConfig, SanitizedConfig, ServerConfig,
};
pub use refresh::{QueueRefresher, RefreshCallback, RefreshStatus, RefreshSummary, SharedCache};
pub use service_type::{active_service_types, ServiceType};
pub use stats::QueueStats;
pub use table::{active_tables, callable_tables, Table, TableStatus};
pub use ticket::{
    apply_transition, order_for_operator_list, order_for_public_queue, order_serving, Ticket,
    TicketStatus, Transition, TransitionError, TransitionKind, TransitionOutcome,
};
pub use validation::{
    CreateServiceTypeRequest, CreateTableRequest, CreateTicketRequest, UpdateServiceTypeRequest,
    UpdateTableRequest, ValidationError,
};
