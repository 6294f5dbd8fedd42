//! Connection to the REST backend that owns the queue.
//!
//! The [`Backend`] trait is what the rest of the crate talks to;
//! [`RestBackend`] is the HTTP implementation and `wire` holds the payload
//! shapes it speaks.

mod rest;
mod types;
pub mod wire;

pub use rest::RestBackend;
pub use types::{Backend, BackendError, TicketQuery};
