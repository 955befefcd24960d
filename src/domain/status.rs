//! The order state machine, kept as a table of edges.

use super::order::OrderStatus;
use super::order::OrderStatus::*;
use crate::error::{OrderError, Result};

/// Which operation is allowed to walk an edge.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Trigger {
    /// Recording a payment outcome.
    Settlement,
    /// Kitchen and front-of-house progress updates.
    Advance,
}

/// Every legal `(from, to, trigger)` edge. Anything absent is rejected.
pub const TRANSITIONS: &[(OrderStatus, OrderStatus, Trigger)] = &[
    (AwaitingPayment, Paid, Trigger::Settlement),
    (AwaitingPayment, PaymentDeclined, Trigger::Settlement),
    (Paid, Preparing, Trigger::Advance),
    (Paid, Canceled, Trigger::Advance),
    (Preparing, Ready, Trigger::Advance),
    (Preparing, Canceled, Trigger::Advance),
    (Ready, Delivered, Trigger::Advance),
    (Ready, Canceled, Trigger::Advance),
];

pub fn is_allowed(from: OrderStatus, to: OrderStatus, trigger: Trigger) -> bool {
    TRANSITIONS
        .iter()
        .any(|&(f, t, tr)| f == from && t == to && tr == trigger)
}

/// Statuses reachable from `from` through `trigger`.
pub fn next_statuses(from: OrderStatus, trigger: Trigger) -> Vec<OrderStatus> {
    TRANSITIONS
        .iter()
        .filter(|&&(f, _, tr)| f == from && tr == trigger)
        .map(|&(_, t, _)| t)
        .collect()
}

pub fn is_terminal(status: OrderStatus) -> bool {
    !TRANSITIONS.iter().any(|&(f, _, _)| f == status)
}

pub fn check(from: OrderStatus, to: OrderStatus, trigger: Trigger) -> Result<()> {
    if is_allowed(from, to, trigger) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}
