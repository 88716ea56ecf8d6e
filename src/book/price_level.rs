use std::collections::VecDeque;

use crate::model::Order;

/// A FIFO queue of resting orders that all share one price on one side of one symbol's book.
///
/// `total_volume` is maintained incrementally on every push/pop/update so that a book's
/// `depth()` is O(levels) rather than O(orders).
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    pub price: i64,
    orders: VecDeque<Order>,
    total_volume: u64,
}

impl PriceLevel {
    pub fn new(price: i64) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_volume: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_volume(&self) -> u64 {
        self.total_volume
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// FIFO head: the oldest order, matched first at this price.
    pub fn head(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    pub fn push_back(&mut self, order: Order) {
        self.total_volume += order.remaining();
        self.orders.push_back(order);
    }

    /// Removes the FIFO head once it has been fully filled.
    pub fn pop_head(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_volume = self.total_volume.saturating_sub(order.remaining());
        Some(order)
    }

    /// Removes a specific resting order (cancel, or modify-in-place-then-remove). Level
    /// sizes are small in a price-time-priority book, so a linear scan is acceptable —
    /// the same tradeoff the order-id index's O(1) lookup to the level is meant to bound.
    pub fn remove(&mut self, order_id: &str) -> Option<Order> {
        let idx = self.orders.iter().position(|o| o.id == order_id)?;
        let order = self.orders.remove(idx)?;
        self.total_volume = self.total_volume.saturating_sub(order.remaining());
        Some(order)
    }

    pub fn get_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == order_id)
    }

    /// Read-only scan over resting orders, FIFO-head first. Not used on the matching
    /// hot path (that only ever touches `head`/`head_mut`) — only by status lookups.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Accounts for a reduction in a resting order's remaining quantity (fill or downsize)
    /// without removing it from the queue.
    pub fn reduce_volume(&mut self, by: u64) {
        self.total_volume = self.total_volume.saturating_sub(by);
    }

    pub fn add_volume(&mut self, by: u64) {
        self.total_volume += by;
    }
}
