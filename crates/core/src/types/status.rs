//! Status enums for orders, payments, and users.
//!
//! Order status is a closed enumeration with an explicit transition table.
//! Side effects (stock commitment, archival) hang off transition *edges*,
//! never off string comparison.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// ```text
/// Pending   -> Confirmed | Processing | Failed | Cancelled
/// Confirmed -> Processing | Completed
/// Processing-> Completed
/// ```
///
/// `Completed`, `Failed`, and `Cancelled` are terminal. `Completed` orders
/// carry an archival timestamp and are removed by the retention sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, awaiting payment or admin confirmation.
    #[default]
    Pending,
    /// Admin-confirmed (COD and manual flows). Stock is committed.
    Confirmed,
    /// Payment verified. Stock is committed.
    Processing,
    /// Fulfilled and archived; deleted after the retention window.
    Completed,
    /// Payment-intent creation failed; compensated terminal state.
    Failed,
    /// Cancelled before any stock commitment.
    Cancelled,
}

impl OrderStatus {
    /// Whether this status can never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether an order in this status has had its stock committed.
    #[must_use]
    pub const fn is_committed(self) -> bool {
        matches!(self, Self::Confirmed | Self::Processing | Self::Completed)
    }

    /// Transition table. Same-status transitions are not edges; callers
    /// treat them as no-ops.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Confirmed | Self::Processing | Self::Failed | Self::Cancelled
            ) | (Self::Confirmed, Self::Processing | Self::Completed)
                | (Self::Processing, Self::Completed)
        )
    }

    /// Whether taking the edge `self -> next` commits the order's stock.
    ///
    /// True exactly on the first entry into a committed status. The
    /// persisted `inventory_applied` latch backs this up against replays.
    #[must_use]
    pub const fn commits_inventory(self, next: Self) -> bool {
        !self.is_committed() && matches!(next, Self::Confirmed | Self::Processing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment settlement status, independent of the order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Gateway checkout; the order waits in `Pending` for signature
    /// verification.
    Online,
    /// Cash on delivery; confirmed manually by an admin.
    Cod,
}

/// User role carried in the bearer-token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_paths() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_terminal_states_have_no_edges() {
        for terminal in [
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ] {
            for next in [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Processing,
                OrderStatus::Completed,
                OrderStatus::Failed,
                OrderStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_no_backwards_edges() {
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn test_same_status_is_not_an_edge() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
        ] {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn test_commits_inventory_on_first_committed_entry_only() {
        assert!(OrderStatus::Pending.commits_inventory(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.commits_inventory(OrderStatus::Processing));
        // Already committed: moving deeper must not commit again
        assert!(!OrderStatus::Confirmed.commits_inventory(OrderStatus::Processing));
        assert!(!OrderStatus::Processing.commits_inventory(OrderStatus::Completed));
        // Failure paths never touch stock
        assert!(!OrderStatus::Pending.commits_inventory(OrderStatus::Failed));
        assert!(!OrderStatus::Pending.commits_inventory(OrderStatus::Cancelled));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: OrderStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(back, OrderStatus::Confirmed);
    }
}
