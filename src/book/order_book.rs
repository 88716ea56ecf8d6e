//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// A single symbol's two-sided book: both `BookSide`s plus an id -> location index. Owns the
// matching algorithm (§4.5) because matching needs both sides and the index at once.
//
// | Function | Description                                                                   |
// |----------|--------------------------------------------------------------------------------|
// | add      | match the incoming order, rest any remainder, return trades + post-state      |
// | cancel   | remove a resting order                                                        |
// | modify   | strict/lenient re-price or re-size, then re-match                            |
// | depth    | aggregated best-first view per side                                          |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Order, OrderStatus, Side, Trade};

use super::book_side::{BookSide, OrderHandle};

#[derive(Debug, Error)]
pub enum OrderBookError {
    #[error("order {0} not found")]
    NotFound(String),

    #[error("order for wrong symbol (book is {expected}, order is {got})")]
    WrongSymbol { expected: String, got: String },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

/// One aggregated (price, remaining quantity) entry in a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: i64,
    pub quantity: u64,
}

/// Result of a successful `modify`: the order's new state plus any trades the re-match
/// against the opposite side produced.
#[derive(Debug, Clone)]
pub struct ModifyOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: String,
    bids: BookSide,
    asks: BookSide,
    index: HashMap<String, OrderHandle>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn best_bid(&self) -> Option<i64> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<i64> {
        self.asks.best_price()
    }

    /// At most `n` (price, aggregate_remaining) levels per side, best-first.
    pub fn depth(&self, n: usize) -> (Vec<DepthLevel>, Vec<DepthLevel>) {
        let to_levels = |pairs: Vec<(i64, u64)>| {
            pairs
                .into_iter()
                .map(|(price, quantity)| DepthLevel { price, quantity })
                .collect()
        };
        (to_levels(self.bids.depth(n)), to_levels(self.asks.depth(n)))
    }

    /// Every resting order across both sides, best-first within each side. Used by the
    /// snapshot writer, which needs individual orders rather than the aggregated view
    /// `depth` provides.
    pub fn resting_orders(&self) -> impl Iterator<Item = &Order> {
        self.bids
            .iter_best_first()
            .chain(self.asks.iter_best_first())
            .flat_map(|level| level.iter())
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        let handle = self.index.get(order_id)?;
        self.side(handle.side)
            .level(handle.price)?
            .iter()
            .find(|o| o.id == order_id)
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Re-inserts an order recovered from a snapshot or journal replay directly into its
    /// resting location, with no matching. Sound only when the order is known to already be
    /// part of a consistent (non-crossed) prior book state — recovery's whole point is that
    /// it never re-derives trades.
    pub fn restore(&mut self, order: Order) {
        let handle = self.side_mut(order.side).insert(order.clone());
        self.index.insert(order.id, handle);
    }

    /// Matches `order` against resting liquidity (§4.5), then rests any remainder on its own
    /// side. Returns the trades produced, in the order they were matched, and the order's
    /// final state.
    pub fn add(&mut self, mut order: Order) -> Result<(Vec<Trade>, Order), OrderBookError> {
        if order.symbol != self.symbol {
            return Err(OrderBookError::WrongSymbol {
                expected: self.symbol.clone(),
                got: order.symbol,
            });
        }

        let trades = self.match_order(&mut order);

        if order.remaining() > 0 {
            order.status = if order.filled_qty > 0 {
                OrderStatus::PartiallyFilled
            } else {
                OrderStatus::Pending
            };
            let handle = self.side_mut(order.side).insert(order.clone());
            self.index.insert(order.id.clone(), handle);
        } else {
            order.status = OrderStatus::Filled;
        }

        Ok((trades, order))
    }

    /// The core matching loop (§4.5): consume the opposite side's best level FIFO-first
    /// while the aggressor still crosses, emitting a trade per fill at the resting order's
    /// price.
    fn match_order(&mut self, order: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        let opposite = order.side.opposite();

        loop {
            if order.remaining() == 0 {
                break;
            }
            let Some(best_price) = self.side(opposite).best_price() else {
                break;
            };
            if !price_crosses(order.side, order.price, best_price) {
                break;
            }

            let symbol = self.symbol.clone();
            let level = self
                .side_mut(opposite)
                .level_mut(best_price)
                .expect("best_price implies the level exists");

            let (resting_id, resting_remaining) = {
                let head = level.head().expect("non-empty level has a FIFO head");
                (head.id.clone(), head.remaining())
            };

            let fill_qty = order.remaining().min(resting_remaining);

            {
                let head = level.head_mut().expect("checked above");
                head.filled_qty += fill_qty;
            }
            level.reduce_volume(fill_qty);
            order.filled_qty += fill_qty;

            let trade = Trade {
                id: Uuid::new_v4().to_string(),
                buy_order_id: match order.side {
                    Side::Buy => order.id.clone(),
                    Side::Sell => resting_id.clone(),
                },
                sell_order_id: match order.side {
                    Side::Buy => resting_id.clone(),
                    Side::Sell => order.id.clone(),
                },
                symbol,
                quantity: fill_qty,
                price: best_price,
                executed_at: Utc::now(),
            };
            trades.push(trade);

            let resting_filled = level.head().expect("checked above").remaining() == 0;
            if resting_filled {
                let mut filled = level.pop_head().expect("checked above");
                filled.status = OrderStatus::Filled;
                self.index.remove(&filled.id);
                self.side_mut(opposite).drop_if_empty(best_price);
            }
        }

        trades
    }

    /// Removes a resting order. Fails with `NotFound` if the id isn't currently resting
    /// (already filled or already cancelled — cancel is idempotent in that both cases read
    /// as `NotFound`, never a silent no-op success).
    pub fn cancel(&mut self, order_id: &str) -> Result<Order, OrderBookError> {
        let handle = self
            .index
            .remove(order_id)
            .ok_or_else(|| OrderBookError::NotFound(order_id.to_string()))?;
        let mut order = self
            .side_mut(handle.side)
            .remove(handle.price, order_id)
            .ok_or_else(|| OrderBookError::NotFound(order_id.to_string()))?;
        order.status = OrderStatus::Cancelled;
        Ok(order)
    }

    /// Lenient modify (§4.4, decision recorded in SPEC_FULL.md §4.4): same price changes the
    /// resting order's size in place and keeps its time priority, with no re-match — a pure
    /// resize at an unchanged price can never newly cross, since the order was already
    /// resting non-crossed at that price. Any price change is cancel + fresh insert, losing
    /// priority, followed by a re-match since the new price may now cross the opposite side.
    pub fn modify(
        &mut self,
        order_id: &str,
        new_qty: u64,
        new_price: i64,
    ) -> Result<ModifyOutcome, OrderBookError> {
        let handle = *self
            .index
            .get(order_id)
            .ok_or_else(|| OrderBookError::NotFound(order_id.to_string()))?;

        let filled_qty = {
            let level = self
                .side(handle.side)
                .level(handle.price)
                .ok_or_else(|| OrderBookError::NotFound(order_id.to_string()))?;
            level
                .iter()
                .find(|o| o.id == order_id)
                .ok_or_else(|| OrderBookError::NotFound(order_id.to_string()))?
                .filled_qty
        };
        if new_qty < filled_qty {
            return Err(OrderBookError::InvalidQuantity(format!(
                "new_qty {new_qty} is below filled_qty {filled_qty}"
            )));
        }

        if new_price == handle.price {
            let old_remaining = {
                let level = self.side_mut(handle.side).level_mut(handle.price).unwrap();
                let order = level.get_mut(order_id).unwrap();
                let old_remaining = order.remaining();
                order.original_qty = new_qty;
                old_remaining
            };
            let new_remaining = new_qty - filled_qty;
            {
                let level = self.side_mut(handle.side).level_mut(handle.price).unwrap();
                if new_remaining >= old_remaining {
                    level.add_volume(new_remaining - old_remaining);
                } else {
                    level.reduce_volume(old_remaining - new_remaining);
                }
            }

            let order = if new_remaining == 0 {
                let mut order = self
                    .side_mut(handle.side)
                    .remove(handle.price, order_id)
                    .expect("order resized above is still on this level");
                order.status = OrderStatus::Filled;
                self.index.remove(order_id);
                order
            } else {
                let level = self.side_mut(handle.side).level_mut(handle.price).unwrap();
                let order = level.get_mut(order_id).unwrap();
                order.status = if order.filled_qty > 0 {
                    OrderStatus::PartiallyFilled
                } else {
                    OrderStatus::Pending
                };
                order.clone()
            };

            return Ok(ModifyOutcome {
                order,
                trades: Vec::new(),
            });
        }

        let mut order = self
            .side_mut(handle.side)
            .remove(handle.price, order_id)
            .ok_or_else(|| OrderBookError::NotFound(order_id.to_string()))?;
        order.original_qty = new_qty;
        order.price = new_price;
        order.status = OrderStatus::Pending;

        let (trades, order) = self.add(order).map_err(|e| match e {
            OrderBookError::WrongSymbol { .. } => {
                unreachable!("modify reuses the order's own symbol")
            }
            other => other,
        })?;

        Ok(ModifyOutcome { order, trades })
    }
}

/// `BUY p crosses best_ask iff p >= best_ask`; symmetrically for sells.
fn price_crosses(side: Side, price: i64, best_opposite: i64) -> bool {
    match side {
        Side::Buy => price >= best_opposite,
        Side::Sell => price <= best_opposite,
    }
}
