use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order of this side matches against.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Observable lifecycle state of an order, per the status transitions in the submit-order
/// contract: `Pending -> PartiallyFilled -> Filled`, or `-> Cancelled` from either resting
/// state. `Rejected` is assigned before any state change if validation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// An order is resting iff it has remaining quantity and hasn't reached a terminal state.
    pub fn is_resting(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }
}

/// A day limit order, resting or incoming.
///
/// `remaining()` is always `original_qty - filled_qty`; an order is resting on a book's
/// price level iff `remaining() > 0` and `status.is_resting()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub side: Side,
    /// Price in minor units (ticks). Never compared as a float.
    pub price: i64,
    pub original_qty: u64,
    pub filled_qty: u64,
    pub status: OrderStatus,
    /// Monotonic per symbol, assigned under the symbol's book lock when the order is accepted.
    pub sequence: u64,
    pub accepted_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining(&self) -> u64 {
        self.original_qty - self.filled_qty
    }

    pub fn is_resting(&self) -> bool {
        self.remaining() > 0 && self.status.is_resting()
    }
}
