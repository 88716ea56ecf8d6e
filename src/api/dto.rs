//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Request/response shapes for the HTTP frontend (§6). Thin wrappers around the engine's own
// types — the frontend's job is shape translation, not business logic.
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::book::DepthLevel;
use crate::engine::{MarketData, ModifyRequestOutcome, OrderStatusView, SubmitOrderRequest, SubmitOutcome};
use crate::model::{Order, OrderStatus, Side, Trade};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: i64,
}

impl From<CreateOrderRequest> for SubmitOrderRequest {
    fn from(req: CreateOrderRequest) -> Self {
        SubmitOrderRequest {
            user_id: req.user_id,
            symbol: req.symbol,
            side: req.side,
            quantity: req.quantity,
            price: req.price,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifyOrderRequest {
    pub new_qty: u64,
    pub new_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub side: Side,
    pub price: i64,
    pub original_qty: u64,
    pub filled_qty: u64,
    pub status: OrderStatus,
    pub sequence: u64,
    pub accepted_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            symbol: order.symbol,
            side: order.side,
            price: order.price,
            original_qty: order.original_qty,
            filled_qty: order.filled_qty,
            status: order.status,
            sequence: order.sequence,
            accepted_at: order.accepted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeResponse {
    pub id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub symbol: String,
    pub quantity: u64,
    pub price: i64,
    pub executed_at: DateTime<Utc>,
}

impl From<Trade> for TradeResponse {
    fn from(trade: Trade) -> Self {
        Self {
            id: trade.id,
            buy_order_id: trade.buy_order_id,
            sell_order_id: trade.sell_order_id,
            symbol: trade.symbol,
            quantity: trade.quantity,
            price: trade.price,
            executed_at: trade.executed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub order: OrderResponse,
    pub trades: Vec<TradeResponse>,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            order: outcome.order.into(),
            trades: outcome.trades.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ModifyRequestOutcome> for SubmitResponse {
    fn from(outcome: ModifyRequestOutcome) -> Self {
        Self {
            order: outcome.order.into(),
            trades: outcome.trades.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub order_id: String,
    pub symbol: String,
    pub status: OrderStatus,
    pub filled_qty: u64,
    pub remaining: u64,
}

impl From<OrderStatusView> for StatusResponse {
    fn from(view: OrderStatusView) -> Self {
        Self {
            order_id: view.order_id,
            symbol: view.symbol,
            status: view.status,
            filled_qty: view.filled_qty,
            remaining: view.remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DepthLevelResponse {
    pub price: i64,
    pub quantity: u64,
}

impl From<DepthLevel> for DepthLevelResponse {
    fn from(level: DepthLevel) -> Self {
        Self {
            price: level.price,
            quantity: level.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DepthResponse {
    pub symbol: String,
    pub best_bid: Option<i64>,
    pub best_ask: Option<i64>,
    pub bids: Vec<DepthLevelResponse>,
    pub asks: Vec<DepthLevelResponse>,
    pub timestamp: DateTime<Utc>,
}

impl From<MarketData> for DepthResponse {
    fn from(data: MarketData) -> Self {
        Self {
            symbol: data.symbol,
            best_bid: data.best_bid,
            best_ask: data.best_ask,
            bids: data.bids.into_iter().map(Into::into).collect(),
            asks: data.asks.into_iter().map(Into::into).collect(),
            timestamp: data.timestamp,
        }
    }
}
