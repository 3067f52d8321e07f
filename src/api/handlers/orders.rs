use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::sync::Arc;

use crate::auth::middleware::AuthUser;
use crate::engine::error::CoreError;
use crate::engine::lifecycle::OrderLifecycle;
use crate::engine::matching::MatchingEngine;
use crate::engine::unit_of_work::UnitOfWork;
use crate::models::{Order, OrderId, OrderResponse, SubmitOrderRequest, Ticker};
use crate::AppState;

/// `POST /orders` -- spec.md §4.3 `submit`. Maps BUY/SELL onto BID/ASK at
/// the wire boundary only; the core never sees the wire vocabulary.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<SubmitOrderRequest>,
) -> Result<Json<OrderResponse>, CoreError> {
    let ticker = Ticker::parse(&req.ticker).map_err(CoreError::InvalidRequest)?;
    let order = MatchingEngine::submit(
        &state.db.pool,
        caller.trader_id,
        ticker,
        req.side.into_side(),
        req.price,
        req.amount,
    )
    .await?;
    Ok(Json(order.into()))
}

/// `DELETE /orders/:order_id` -- spec.md §4.5 `cancel`.
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, CoreError> {
    let order = UnitOfWork::run(&state.db.pool, move |tx| {
        Box::pin(async move { OrderLifecycle::cancel(tx, order_id, caller.trader_id).await })
    })
    .await?;
    Ok(Json(order.into()))
}

/// `GET /orders/:order_id` -- owner-only read, per spec.md §6 "Get order".
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, CoreError> {
    let mut tx = state.db.pool.begin().await?;
    let order: Order = OrderLifecycle::get(&mut tx, order_id).await?;
    tx.rollback().await?;

    if order.trader_id != caller.trader_id {
        return Err(CoreError::Forbidden {
            order_id,
            trader_id: caller.trader_id,
        });
    }
    Ok(Json(order.into()))
}

/// `GET /orders` -- spec.md §6 "List trader orders".
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Vec<OrderResponse>>, CoreError> {
    let orders = OrderLifecycle::list_by_trader(&state.db.pool, caller.trader_id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}
