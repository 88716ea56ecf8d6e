//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name              | Description                                   | Return Type        |
// |--------------------|----------------------------------------------|---------------------|
// | index              | Service banner                                | impl IntoResponse   |
// | health             | Liveness probe                                | impl IntoResponse   |
// | create_order       | Submit a new order                            | ApiResult<Response> |
// | cancel_order       | Cancel a resting order                        | ApiResult<Response> |
// | modify_order       | Modify a resting order                        | ApiResult<Response> |
// | get_order_status   | Read an order's lifecycle state               | ApiResult<Response> |
// | get_depth          | Read aggregated book depth for a symbol       | impl IntoResponse   |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::{
    CreateOrderRequest, DepthResponse, ModifyOrderRequest, OrderResponse, StatusResponse,
    SubmitResponse,
};
use super::{ApiResult, AppState};

pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({ "service": "limit-matching-engine" }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Response> {
    let outcome = state.engine.submit(req.into())?;
    Ok((StatusCode::CREATED, Json(SubmitResponse::from(outcome))).into_response())
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path((symbol, order_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let order = state.engine.cancel(&symbol, &order_id)?;
    Ok((StatusCode::OK, Json(OrderResponse::from(order))).into_response())
}

pub async fn modify_order(
    State(state): State<Arc<AppState>>,
    Path((symbol, order_id)): Path<(String, String)>,
    Json(req): Json<ModifyOrderRequest>,
) -> ApiResult<Response> {
    let outcome = state
        .engine
        .modify(&symbol, &order_id, req.new_qty, req.new_price)?;
    Ok((StatusCode::OK, Json(SubmitResponse::from(outcome))).into_response())
}

pub async fn get_order_status(
    State(state): State<Arc<AppState>>,
    Path((symbol, order_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let status = state.engine.status(&symbol, &order_id)?;
    Ok((StatusCode::OK, Json(StatusResponse::from(status))).into_response())
}

pub async fn get_depth(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let levels = params
        .get("levels")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let data = state.engine.market_data(&symbol, levels);
    Json(DepthResponse::from(data))
}
