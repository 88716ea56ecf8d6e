//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// A thin HTTP frontend over `MatchingEngine` (§1, §10): no auth, no rate limiting, no business
// logic beyond request/response shape translation — those concerns belong to the external
// request frontend the core spec treats as a collaborator.
//
// | Component | Description                                                                  |
// |-----------|-------------------------------------------------------------------------------|
// | AppState  | Shared handle to the engine                                                  |
// | Api       | Router assembly and the serve loop                                           |
// | dto       | Request/response shapes                                                     |
// | error     | Maps EngineError to HTTP status codes                                       |
//--------------------------------------------------------------------------------------------------

mod dto;
mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::MatchingEngine;

pub use dto::*;
pub use error::{ApiError, ApiResult};

pub struct AppState {
    pub engine: Arc<MatchingEngine>,
}

pub struct Api {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl Api {
    pub fn new(addr: SocketAddr, engine: Arc<MatchingEngine>) -> Self {
        Self {
            addr,
            state: Arc::new(AppState { engine }),
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]);

        Router::new()
            .route("/", get(routes::index))
            .route("/health", get(routes::health))
            .route("/orders", post(routes::create_order))
            .route(
                "/orders/:symbol/:id",
                get(routes::get_order_status)
                    .put(routes::modify_order)
                    .delete(routes::cancel_order),
            )
            .route("/symbols/:symbol/depth", get(routes::get_depth))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let app = self.router();
        info!(addr = %self.addr, "api listening");
        let listener = TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}
