//! Queue ordering policies.
//!
//! The public queue and the operator list sort in opposite directions on
//! `created_at`: the public board shows the longest-waiting customer next,
//! the operator list shows the most recent activity on top.
//!
//! Equal `created_at` values fall back to ticket `id` ascending, so every
//! ordering is total and independent of input order.

use std::cmp::Ordering;

use super::{Ticket, TicketStatus};

/// Waiting tickets in service order: priority first, then oldest first.
pub fn order_for_public_queue(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut waiting: Vec<Ticket> = tickets.iter().filter(|t| t.is_waiting()).cloned().collect();
    waiting.sort_by(public_queue_cmp);
    waiting
}

/// All tickets in operator order.
///
/// Active tickets (`waiting`, `serving`) come before terminal ones. Among
/// active tickets priority wins, then `serving` before `waiting`. Everything
/// else is newest first.
pub fn order_for_operator_list(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut ordered = tickets.to_vec();
    ordered.sort_by(operator_list_cmp);
    ordered
}

/// Serving tickets, most recently called first.
pub fn order_serving(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut serving: Vec<Ticket> = tickets.iter().filter(|t| t.is_serving()).cloned().collect();
    serving.sort_by(|a, b| {
        b.called_at
            .cmp(&a.called_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    serving
}

fn public_queue_cmp(a: &Ticket, b: &Ticket) -> Ordering {
    b.is_priority
        .cmp(&a.is_priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn operator_list_cmp(a: &Ticket, b: &Ticket) -> Ordering {
    let a_active = a.status.is_active();
    let b_active = b.status.is_active();

    let group = b_active.cmp(&a_active);
    if group != Ordering::Equal {
        return group;
    }

    let active_rank = if a_active {
        b.is_priority
            .cmp(&a.is_priority)
            .then_with(|| serving_rank(a.status).cmp(&serving_rank(b.status)))
    } else {
        Ordering::Equal
    };

    active_rank
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn serving_rank(status: TicketStatus) -> u8 {
    match status {
        TicketStatus::Serving => 0,
        _ => 1,
    }
}
