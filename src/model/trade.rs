use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed, immutable match between two orders on opposite sides of a symbol's book.
///
/// Per the passive-price rule (matching §4.5), `price` is always the price of whichever
/// order was resting at the moment of the match, never the aggressor's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub symbol: String,
    pub quantity: u64,
    pub price: i64,
    pub executed_at: DateTime<Utc>,
}
