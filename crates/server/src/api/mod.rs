pub mod boards;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod service_types;
pub mod tables;
pub mod tickets;
pub mod ws;

pub use routes::create_router;
pub use ws::{ws_handler, WsBroadcaster, WsMessage};
