//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The single-symbol order book: price levels, book sides, and the book itself. This is where
// price-time priority and the non-crossed invariant are enforced.
//
// | Component   | Description                                                              |
// |-------------|---------------------------------------------------------------------------|
// | PriceLevel  | FIFO queue of resting orders at one price                               |
// | BookSide    | Ordered price -> PriceLevel map for one side, best-first iteration      |
// | OrderBook   | Both sides of a symbol plus the id -> location index; add/cancel/modify |
//--------------------------------------------------------------------------------------------------

mod book_side;
mod order_book;
mod price_level;

pub use book_side::BookSide;
pub use order_book::{DepthLevel, ModifyOutcome, OrderBook, OrderBookError};
pub use price_level::PriceLevel;
