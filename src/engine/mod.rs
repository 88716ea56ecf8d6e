//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The multi-symbol dispatcher (§4.6): a lazily-populated map of symbol -> locked book, a
// journal sink, and the snapshot/recovery lifecycle. Every mutating call follows
// match-then-journal-then-commit: mutate a clone of the book, append to the journal, and only
// then replace the live book — so a journal failure leaves the live book exactly as it was
// (§5, §9).
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::book::{DepthLevel, ModifyOutcome as BookModifyOutcome, OrderBook, OrderBookError};
use crate::error::{EngineError, EngineResult};
use crate::journal::{Journal, JournalRecord};
use crate::model::{Order, OrderStatus, Side, Trade};
use crate::snapshot::{self, EngineSnapshot, SnapshotOrder};

/// Fields accepted on submit (§6): the engine assigns id, sequence, and acceptance time.
#[derive(Debug, Clone)]
pub struct SubmitOrderRequest {
    pub user_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: i64,
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone)]
pub struct ModifyRequestOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone)]
pub struct OrderStatusView {
    pub order_id: String,
    pub symbol: String,
    pub status: OrderStatus,
    pub filled_qty: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone)]
pub struct MarketData {
    pub symbol: String,
    pub best_bid: Option<i64>,
    pub best_ask: Option<i64>,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub timestamp: chrono::DateTime<Utc>,
}

struct BookEntry {
    book: OrderBook,
    next_sequence: u64,
}

impl BookEntry {
    fn new(symbol: &str) -> Self {
        Self {
            book: OrderBook::new(symbol),
            next_sequence: 0,
        }
    }
}

pub struct MatchingEngine {
    books: RwLock<HashMap<String, Arc<Mutex<BookEntry>>>>,
    journal: Arc<dyn Journal>,
    snapshot_dir: PathBuf,
    snapshot_retain: usize,
}

impl MatchingEngine {
    pub fn new(journal: Arc<dyn Journal>, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            journal,
            snapshot_dir: snapshot_dir.into(),
            snapshot_retain: 5,
        }
    }

    pub fn with_snapshot_retention(mut self, retain: usize) -> Self {
        self.snapshot_retain = retain.max(1);
        self
    }

    fn book_entry(&self, symbol: &str) -> Arc<Mutex<BookEntry>> {
        if let Some(entry) = self.books.read().get(symbol) {
            return entry.clone();
        }
        let mut books = self.books.write();
        books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(BookEntry::new(symbol))))
            .clone()
    }

    #[instrument(skip(self, req), fields(symbol = %req.symbol))]
    pub fn submit(&self, req: SubmitOrderRequest) -> EngineResult<SubmitOutcome> {
        validate_submit(&req)?;
        let symbol = req.symbol.to_uppercase();
        let entry_arc = self.book_entry(&symbol);
        let mut entry = entry_arc.lock();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: req.user_id,
            symbol: symbol.clone(),
            side: req.side,
            price: req.price,
            original_qty: req.quantity,
            filled_qty: 0,
            status: OrderStatus::Pending,
            sequence: entry.next_sequence,
            accepted_at: Utc::now(),
        };

        let mut working = entry.book.clone();
        let (trades, resting_order) = working
            .add(order.clone())
            .map_err(|e| book_error_to_engine(&symbol, e))?;

        let mut records = vec![JournalRecord::OrderAccepted(order)];
        records.extend(trades.iter().cloned().map(JournalRecord::TradeExecuted));
        self.journal
            .append(&records)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        entry.book = working;
        entry.next_sequence += 1;
        info!(order_id = %resting_order.id, trades = trades.len(), "order accepted");

        Ok(SubmitOutcome {
            order: resting_order,
            trades,
        })
    }

    #[instrument(skip(self))]
    pub fn cancel(&self, symbol: &str, order_id: &str) -> EngineResult<Order> {
        let symbol = symbol.to_uppercase();
        let entry_arc = self.book_entry(&symbol);
        let mut entry = entry_arc.lock();

        let mut working = entry.book.clone();
        let order = working
            .cancel(order_id)
            .map_err(|e| book_error_to_engine(&symbol, e))?;

        self.journal
            .append(&[JournalRecord::OrderCancelled {
                symbol: symbol.clone(),
                order_id: order_id.to_string(),
            }])
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        entry.book = working;
        info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub fn modify(
        &self,
        symbol: &str,
        order_id: &str,
        new_qty: u64,
        new_price: i64,
    ) -> EngineResult<ModifyRequestOutcome> {
        let symbol = symbol.to_uppercase();
        let entry_arc = self.book_entry(&symbol);
        let mut entry = entry_arc.lock();

        let mut working = entry.book.clone();
        let BookModifyOutcome { order, trades } = working
            .modify(order_id, new_qty, new_price)
            .map_err(|e| book_error_to_engine(&symbol, e))?;

        let mut records = vec![JournalRecord::OrderModified {
            symbol: symbol.clone(),
            order_id: order_id.to_string(),
            new_qty,
            new_price,
        }];
        records.extend(trades.iter().cloned().map(JournalRecord::TradeExecuted));
        self.journal
            .append(&records)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        entry.book = working;
        info!(order_id = %order.id, trades = trades.len(), "order modified");
        Ok(ModifyRequestOutcome { order, trades })
    }

    pub fn status(&self, symbol: &str, order_id: &str) -> EngineResult<OrderStatusView> {
        let symbol = symbol.to_uppercase();
        let entry_arc = self.book_entry(&symbol);
        let entry = entry_arc.lock();
        let order = entry
            .book
            .get(order_id)
            .ok_or_else(|| EngineError::NotFound {
                symbol: symbol.clone(),
                order_id: order_id.to_string(),
            })?;
        Ok(OrderStatusView {
            order_id: order.id.clone(),
            symbol,
            status: order.status,
            filled_qty: order.filled_qty,
            remaining: order.remaining(),
        })
    }

    pub fn market_data(&self, symbol: &str, levels: usize) -> MarketData {
        let symbol = symbol.to_uppercase();
        let entry_arc = self.book_entry(&symbol);
        let entry = entry_arc.lock();
        let (bids, asks) = entry.book.depth(levels);
        MarketData {
            symbol,
            best_bid: entry.book.best_bid(),
            best_ask: entry.book.best_ask(),
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    /// Copies a structural snapshot of every book under its own lock, briefly, then writes to
    /// disk with no book lock held (§5, §9).
    pub fn snapshot(&self) -> EngineResult<PathBuf> {
        let mut sequence_high_water_mark = 0;
        let mut snapshot = EngineSnapshot::new(0, Utc::now());

        let symbols: Vec<String> = self.books.read().keys().cloned().collect();
        for symbol in symbols {
            let entry_arc = self.book_entry(&symbol);
            let entry = entry_arc.lock();
            sequence_high_water_mark = sequence_high_water_mark.max(entry.next_sequence);

            let orders = resting_orders(&entry.book);
            snapshot.symbols.insert(symbol, orders);
        }
        snapshot.sequence_high_water_mark = sequence_high_water_mark;

        let path = snapshot::write(&self.snapshot_dir, &snapshot, self.snapshot_retain)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        info!(path = %path.display(), "snapshot written");
        Ok(path)
    }

    /// Loads the latest snapshot if one exists; otherwise replays the journal. Either way,
    /// resting orders are re-inserted without re-running matching (§4.7).
    pub fn recover(&self) -> EngineResult<()> {
        match snapshot::load_latest(&self.snapshot_dir)
            .map_err(|e| EngineError::Corruption(e.to_string()))?
        {
            Some(snap) => self.recover_from_snapshot(snap),
            None => self.recover_from_journal(),
        }
    }

    fn recover_from_snapshot(&self, snap: EngineSnapshot) -> EngineResult<()> {
        let mut books = self.books.write();
        for (symbol, orders) in snap.symbols {
            let mut entry = BookEntry::new(&symbol);
            for snapshot_order in orders {
                let order = snapshot_order.into_order(symbol.clone());
                entry.next_sequence = entry.next_sequence.max(order.sequence + 1);
                entry.book.restore(order);
            }
            books.insert(symbol, Arc::new(Mutex::new(entry)));
        }
        info!(
            high_water_mark = snap.sequence_high_water_mark,
            "recovered from snapshot"
        );
        Ok(())
    }

    fn recover_from_journal(&self) -> EngineResult<()> {
        let records = self
            .journal
            .replay()
            .map_err(|e| EngineError::Corruption(e.to_string()))?;

        let mut accepted: HashMap<String, Order> = HashMap::new();
        let mut order_symbol: HashMap<String, String> = HashMap::new();

        for record in records {
            match record {
                JournalRecord::OrderAccepted(order) => {
                    order_symbol.insert(order.id.clone(), order.symbol.clone());
                    accepted.insert(order.id.clone(), order);
                }
                JournalRecord::TradeExecuted(trade) => {
                    if let Some(order) = accepted.get_mut(&trade.buy_order_id) {
                        order.filled_qty += trade.quantity;
                    }
                    if let Some(order) = accepted.get_mut(&trade.sell_order_id) {
                        order.filled_qty += trade.quantity;
                    }
                }
                JournalRecord::OrderCancelled { order_id, .. } => {
                    accepted.remove(&order_id);
                }
                JournalRecord::OrderModified {
                    order_id,
                    new_qty,
                    new_price,
                    ..
                } => {
                    if let Some(order) = accepted.get_mut(&order_id) {
                        order.original_qty = new_qty;
                        order.price = new_price;
                    }
                }
            }
        }

        let mut resting: Vec<Order> = accepted
            .into_values()
            .filter(|o| o.remaining() > 0)
            .collect();
        resting.sort_by_key(|o| o.sequence);

        let mut books = self.books.write();
        for order in resting {
            let entry = books
                .entry(order.symbol.clone())
                .or_insert_with(|| Arc::new(Mutex::new(BookEntry::new(&order.symbol))));
            let mut entry = entry.lock();
            entry.next_sequence = entry.next_sequence.max(order.sequence + 1);
            entry.book.restore(order);
        }

        info!(symbols = books.len(), "recovered from journal replay");
        Ok(())
    }
}

/// Walks every resting order across both sides of a book, best-first, for snapshotting.
/// `OrderBook::depth` only aggregates per level, so the snapshot writer needs its own
/// per-order view.
fn resting_orders(book: &OrderBook) -> Vec<SnapshotOrder> {
    book.resting_orders().map(SnapshotOrder::from_order).collect()
}

fn validate_submit(req: &SubmitOrderRequest) -> EngineResult<()> {
    if req.symbol.trim().is_empty() {
        return Err(EngineError::Validation("symbol must not be empty".into()));
    }
    if req.quantity == 0 {
        return Err(EngineError::Validation("quantity must be > 0".into()));
    }
    if req.price <= 0 {
        return Err(EngineError::Validation("price must be > 0".into()));
    }
    Ok(())
}

fn book_error_to_engine(symbol: &str, err: OrderBookError) -> EngineError {
    match err {
        OrderBookError::NotFound(order_id) => EngineError::NotFound {
            symbol: symbol.to_string(),
            order_id,
        },
        OrderBookError::InvalidQuantity(msg) => EngineError::InvalidQuantity(msg),
        OrderBookError::WrongSymbol { expected, got } => {
            warn!(expected, got, "order routed to the wrong symbol's book");
            EngineError::Validation(format!("order symbol {got} does not match book {expected}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::NullJournal;

    fn engine() -> MatchingEngine {
        // None of these tests call snapshot()/recover(), so the directory never needs to exist.
        MatchingEngine::new(Arc::new(NullJournal), PathBuf::from("/tmp/unused-snapshot-dir"))
    }

    fn submit(engine: &MatchingEngine, user: &str, side: Side, qty: u64, price: i64) -> SubmitOutcome {
        engine
            .submit(SubmitOrderRequest {
                user_id: user.into(),
                symbol: "x".into(),
                side,
                quantity: qty,
                price,
            })
            .unwrap()
    }

    #[test]
    fn scenario_a_simple_full_match() {
        let engine = engine();
        submit(&engine, "u1", Side::Buy, 5, 100);
        let outcome = submit(&engine, "u2", Side::Sell, 5, 100);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].quantity, 5);
        assert_eq!(outcome.trades[0].price, 100);

        let data = engine.market_data("X", 10);
        assert!(data.best_bid.is_none());
        assert!(data.best_ask.is_none());
    }

    #[test]
    fn scenario_d_cancel_then_match() {
        let engine = engine();
        let first = submit(&engine, "u1", Side::Buy, 5, 100);
        engine.cancel("X", &first.order.id).unwrap();
        let second = submit(&engine, "u2", Side::Sell, 5, 100);
        assert!(second.trades.is_empty());
        assert_eq!(engine.market_data("X", 10).best_ask, Some(100));
    }

    #[test]
    fn symbol_is_case_normalized() {
        let engine = engine();
        engine
            .submit(SubmitOrderRequest {
                user_id: "u1".into(),
                symbol: "aapl".into(),
                side: Side::Buy,
                quantity: 1,
                price: 10,
            })
            .unwrap();
        assert_eq!(engine.market_data("AAPL", 5).best_bid, Some(10));
    }

    #[test]
    fn snapshot_then_recover_reproduces_depth() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MatchingEngine::new(Arc::new(NullJournal), dir.path());
        submit(&engine, "u1", Side::Buy, 5, 100);
        submit(&engine, "u2", Side::Buy, 3, 99);
        engine.snapshot().unwrap();

        let recovered = MatchingEngine::new(Arc::new(NullJournal), dir.path());
        recovered.recover().unwrap();

        let before = engine.market_data("X", 10);
        let after = recovered.market_data("X", 10);
        assert_eq!(before.best_bid, after.best_bid);
        assert_eq!(before.bids, after.bids);
    }
}
