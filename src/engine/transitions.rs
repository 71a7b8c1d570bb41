//! The order state machine as data.
//!
//! ```text
//! ordered ─┬─> paid_waiting_approval ─┐
//!          ├─> cod_waiting_approval ──┼─> processing ─> in_transit ─> waiting_client ─> delivered ─> completed
//!          └─> paid_ready_pickup ─────┴──────────────────────> picked_up ─────────────────────────> completed
//!
//! ordered | paid_waiting_approval | cod_waiting_approval ─> cancelled
//! delivered | completed ─> return_requested ─> return_approved ─> returned
//! delivered | completed ─> refund_requested ─> refunded
//! ```

use chrono::Utc;

use crate::error::TransitionError;
use crate::models::event::TransitionRecord;
use crate::models::order::{Order, OrderStatus, ShippingMethod};

use OrderStatus::*;

/// Current status to the statuses it may move to. Anything absent is rejected.
pub const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (
        Ordered,
        &[PaidWaitingApproval, CodWaitingApproval, PaidReadyPickup, Cancelled],
    ),
    (PaidWaitingApproval, &[Processing, Cancelled]),
    (CodWaitingApproval, &[Processing, Cancelled]),
    (PaidReadyPickup, &[Processing, PickedUp]),
    (Processing, &[InTransit, PickedUp]),
    (InTransit, &[WaitingClient]),
    (WaitingClient, &[Delivered]),
    (Delivered, &[Completed, ReturnRequested, RefundRequested]),
    (PickedUp, &[Completed]),
    (Completed, &[ReturnRequested, RefundRequested]),
    (ReturnRequested, &[ReturnApproved]),
    (ReturnApproved, &[Returned]),
    (RefundRequested, &[Refunded]),
    (Cancelled, &[]),
    (Returned, &[]),
    (Refunded, &[]),
];

pub const CANCELLABLE: [OrderStatus; 3] = [Ordered, PaidWaitingApproval, CodWaitingApproval];

pub const RETURN_ELIGIBLE: [OrderStatus; 2] = [Delivered, Completed];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    ReleaseStock,
    Restock,
}

pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

pub fn is_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_targets(from).contains(&to)
}

fn fits_shipping_method(method: ShippingMethod, target: OrderStatus) -> bool {
    match target {
        PaidReadyPickup | PickedUp => method == ShippingMethod::StorePickup,
        InTransit | WaitingClient | Delivered => method == ShippingMethod::Delivery,
        _ => true,
    }
}

/// Validates `order.status -> target` without touching the order.
pub fn check(order: &Order, target: OrderStatus) -> Result<(), TransitionError> {
    let current = order.status;

    if target == Cancelled && !CANCELLABLE.contains(&current) {
        return Err(TransitionError::NotCancellable {
            current,
            attempted: target,
        });
    }

    if matches!(target, ReturnRequested | RefundRequested) && !RETURN_ELIGIBLE.contains(&current) {
        return Err(TransitionError::NotEligibleForReturn {
            current,
            attempted: target,
        });
    }

    if !is_allowed(current, target) || !fits_shipping_method(order.shipping_method, target) {
        return Err(TransitionError::InvalidTransition {
            current,
            attempted: target,
        });
    }

    Ok(())
}

/// Targets that would pass [`check`] for this order right now.
pub fn allowed_next(order: &Order) -> Vec<OrderStatus> {
    allowed_targets(order.status)
        .iter()
        .copied()
        .filter(|target| check(order, *target).is_ok())
        .collect()
}

pub fn side_effect(target: OrderStatus) -> Option<SideEffect> {
    match target {
        Cancelled => Some(SideEffect::ReleaseStock),
        Returned => Some(SideEffect::Restock),
        _ => None,
    }
}

/// Applies a validated transition in place. `expected_version` is the
/// version the caller last read; any other value is a conflict. On error the
/// order is left exactly as it was.
pub fn apply(
    order: &mut Order,
    target: OrderStatus,
    actor_id: &str,
    expected_version: u64,
) -> Result<TransitionRecord, TransitionError> {
    if expected_version != order.version {
        return Err(TransitionError::ConflictingTransition {
            current: order.status,
            attempted: target,
            expected_version,
            actual_version: order.version,
        });
    }

    check(order, target)?;

    let from = order.status;
    order.status = target;
    order.version += 1;

    Ok(TransitionRecord {
        order_number: order.order_number.clone(),
        from,
        to: target,
        actor_id: actor_id.to_string(),
        version: order.version,
        at: Utc::now(),
    })
}
