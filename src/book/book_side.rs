use std::collections::BTreeMap;

use crate::model::{Order, Side};

use super::price_level::PriceLevel;

/// All price levels on one side of one symbol's book, ordered for "best-first" iteration:
/// descending by price for bids, ascending for asks. Backed by a `BTreeMap` rather than a
/// binary heap — a heap's lazy-deletion pattern lets filled/cancelled orders linger as
/// "ghosts" until they bubble to the top, contaminating `best_price` and `depth`. An ordered
/// map plus the book's id index gives O(log P) level lookup/insert and never needs to skip
/// ghosts.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<i64, PriceLevel>,
}

/// Where a resting order lives: which price level, on which side. Stored in the order book's
/// id index so cancel/modify don't need to search every level.
#[derive(Debug, Clone, Copy)]
pub struct OrderHandle {
    pub side: Side,
    pub price: i64,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The best (highest bid / lowest ask) price with resting orders, if any.
    pub fn best_price(&self) -> Option<i64> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    pub fn best_level(&self) -> Option<&PriceLevel> {
        self.best_price().and_then(|p| self.levels.get(&p))
    }

    pub fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        let price = self.best_price()?;
        self.levels.get_mut(&price)
    }

    pub fn level(&self, price: i64) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: i64) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Appends `order` to the level at its price, creating the level if needed, and returns
    /// the handle to store in the book's id index.
    pub fn insert(&mut self, order: Order) -> OrderHandle {
        let price = order.price;
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(order);
        OrderHandle {
            side: self.side,
            price,
        }
    }

    /// Removes `order_id` from the level at `price`. Deletes the level if it becomes empty —
    /// empty levels must never persist (§4.3 invariant).
    pub fn remove(&mut self, price: i64, order_id: &str) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        removed
    }

    /// Drops the level at `price` if it has become empty. Used after popping a FIFO head
    /// during matching.
    pub fn drop_if_empty(&mut self, price: i64) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Lazily walks levels in matching order (best first); within a level, callers read the
    /// FIFO head first via `PriceLevel::head`.
    pub fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Up to `n` (price, aggregate_remaining) pairs, best-first. No ghost entries: every
    /// level present here has at least one resting order.
    pub fn depth(&self, n: usize) -> Vec<(i64, u64)> {
        self.iter_best_first()
            .take(n)
            .map(|level| (level.price, level.total_volume()))
            .collect()
    }
}
