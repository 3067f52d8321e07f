use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::error::CoreError;
use crate::engine::journal::TradeJournal;
use crate::engine::orderbook::OrderBook;
use crate::models::{Side, Ticker, TradeResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DepthQuery {
    #[serde(default = "default_depth")]
    pub depth: i64,
}

fn default_depth() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct OrderbookLevel {
    pub price: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderbookResponse {
    pub ticker: String,
    pub bids: Vec<OrderbookLevel>,
    pub asks: Vec<OrderbookLevel>,
}

/// `GET /instruments/:ticker/orderbook` -- spec.md §6 "Get orderbook".
/// Aggregates resting `amount` across all active orders at the same price;
/// bids descending, asks ascending, truncated to `depth`.
pub async fn get_orderbook(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(q): Query<DepthQuery>,
) -> Result<Json<OrderbookResponse>, CoreError> {
    let ticker = Ticker::parse(&ticker).map_err(CoreError::InvalidRequest)?;
    let depth = q.depth.clamp(1, 500);

    let bids = OrderBook::depth(&state.db.pool, &ticker, Side::Bid, depth).await?;
    let asks = OrderBook::depth(&state.db.pool, &ticker, Side::Ask, depth).await?;

    Ok(Json(OrderbookResponse {
        ticker: ticker.0,
        bids: bids
            .into_iter()
            .map(|(price, quantity)| OrderbookLevel { price, quantity })
            .collect(),
        asks: asks
            .into_iter()
            .map(|(price, quantity)| OrderbookLevel { price, quantity })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentTradesQuery {
    #[serde(default = "default_recent")]
    pub n: i64,
}

fn default_recent() -> i64 {
    50
}

/// `GET /instruments/:ticker/trades` -- spec.md §6 "Get recent trades",
/// newest first.
pub async fn get_recent_trades(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(q): Query<RecentTradesQuery>,
) -> Result<Json<Vec<TradeResponse>>, CoreError> {
    let ticker = Ticker::parse(&ticker).map_err(CoreError::InvalidRequest)?;
    let n = q.n.clamp(1, 500);
    let trades = TradeJournal::recent(&state.db.pool, &ticker, n).await?;
    Ok(Json(trades.into_iter().map(Into::into).collect()))
}
