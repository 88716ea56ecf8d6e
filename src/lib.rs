//--------------------------------------------------------------------------------------------------
// CRATE OVERVIEW
//--------------------------------------------------------------------------------------------------
// A continuous double-auction limit-order matching engine for multiple independent symbols.
//
// | Module    | Responsibility                                                               |
// |-----------|-------------------------------------------------------------------------------|
// | model     | Order, Trade, Side, OrderStatus                                              |
// | book      | Price level, book side, and the per-symbol order book + matching algorithm  |
// | engine    | Multi-symbol dispatcher: submit/cancel/modify/status/market_data/recover    |
// | journal   | Append-only durable record sink the engine writes transactionally to       |
// | snapshot  | Crash-atomic on-disk book snapshots and recovery                           |
// | config    | Environment-driven configuration                                            |
// | api       | Thin axum HTTP frontend over the engine                                    |
// | error     | Engine-level error kinds                                                    |
//--------------------------------------------------------------------------------------------------

pub mod api;
pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod model;
pub mod snapshot;

pub use engine::{MarketData, MatchingEngine, OrderStatusView, SubmitOrderRequest, SubmitOutcome};
pub use error::{EngineError, EngineResult};
pub use model::{Order, OrderStatus, Side, Trade};
