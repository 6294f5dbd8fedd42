//! Tickets: lifecycle transitions and queue ordering.

mod lifecycle;
mod ordering;
mod types;

pub use lifecycle::{
    apply_transition, Transition, TransitionError, TransitionKind, TransitionOutcome,
};
pub use ordering::{order_for_operator_list, order_for_public_queue, order_serving};
pub use types::{Ticket, TicketStatus, UnknownStatus};
