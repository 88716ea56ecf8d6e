//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The engine-level error kinds from the error handling design: validation and NotFound/
// InvalidQuantity are caller-visible with no state change; PersistenceError is caller-visible
// and guarantees no phantom resting orders; Corruption is fatal to startup.
//--------------------------------------------------------------------------------------------------

use thiserror::Error;

/// Errors returned by `MatchingEngine` operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input: bad side, non-positive quantity or price. No state change.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `cancel`/`modify`/`status` targeted an id that isn't resting on the given symbol.
    #[error("order {order_id} not found on {symbol}")]
    NotFound { symbol: String, order_id: String },

    /// `modify` attempted `new_qty < filled_qty`.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// `submit` reused a previously accepted order id.
    #[error("duplicate order id: {0}")]
    Duplicate(String),

    /// The journal or snapshot write failed; the associated book mutation was rolled back.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Snapshot or journal failed checksum validation, or was internally inconsistent.
    /// Fatal to startup — the engine refuses to run with a partial book.
    #[error("recovery data corrupted: {0}")]
    Corruption(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
