//! Order lifecycle state machine.
//!
//! Orders progress along a linear chain, `pending -> confirmed -> baking ->
//! ready -> completed`, with `cancelled` reachable from any non-terminal
//! state. Payment status is an independent flag with no transition rules of
//! its own: admins and the payment webhook both write it, last write wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Baking,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The next step along the fulfillment chain. `None` for terminal states
    /// and for `cancelled`-adjacent questions: there is exactly one forward
    /// button to offer, or none.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Baking),
            OrderStatus::Baking => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_cancel(self) -> bool {
        !self.is_terminal()
    }

    /// Whether `target` can be reached from `self` by following `next` one or
    /// more steps. Cancellation is not part of the chain and is checked
    /// separately.
    pub fn reachable(self, target: OrderStatus) -> bool {
        let mut cursor = self;
        while let Some(next) = cursor.next() {
            if next == target {
                return true;
            }
            cursor = next;
        }
        false
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Baking => "baking",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "baking" => Ok(OrderStatus::Baking),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side gate for admin status updates. Requested statuses must be
/// forward-reachable from the stored one, except cancellation which is
/// allowed from any non-terminal state. Webhook writes bypass this gate.
pub fn validate_transition(current: OrderStatus, requested: OrderStatus) -> Result<(), AppError> {
    if requested == OrderStatus::Cancelled {
        if current.can_cancel() {
            return Ok(());
        }
        return Err(AppError::Conflict(format!(
            "cannot cancel a {current} order"
        )));
    }

    if current.reachable(requested) {
        return Ok(());
    }

    Err(AppError::Conflict(format!(
        "order status {requested} is not reachable from {current}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_total_on_active_states_and_none_on_terminals() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::Confirmed.next(), Some(OrderStatus::Baking));
        assert_eq!(OrderStatus::Baking.next(), Some(OrderStatus::Ready));
        assert_eq!(OrderStatus::Ready.next(), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::Completed.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn forward_transitions_follow_the_chain() {
        assert!(validate_transition(OrderStatus::Pending, OrderStatus::Confirmed).is_ok());
        assert!(validate_transition(OrderStatus::Pending, OrderStatus::Completed).is_ok());
        assert!(validate_transition(OrderStatus::Baking, OrderStatus::Ready).is_ok());

        // Backwards and self transitions conflict.
        assert!(matches!(
            validate_transition(OrderStatus::Ready, OrderStatus::Pending),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            validate_transition(OrderStatus::Baking, OrderStatus::Baking),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn cancellation_is_allowed_from_any_non_terminal_state() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Baking,
            OrderStatus::Ready,
        ] {
            assert!(validate_transition(status, OrderStatus::Cancelled).is_ok());
        }
        assert!(validate_transition(OrderStatus::Completed, OrderStatus::Cancelled).is_err());
        assert!(validate_transition(OrderStatus::Cancelled, OrderStatus::Cancelled).is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Baking,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
