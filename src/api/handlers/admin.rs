use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::engine::admin::Admin;
use crate::engine::error::CoreError;
use crate::models::{AdminAdjustRequest, CreateInstrumentRequest, Instrument, Ticker, TraderId, TraderResponse};
use crate::AppState;

/// `POST /admin/instruments` -- spec.md §6 "Create instrument". Side effect:
/// a zero-quantity position row for every existing trader (§3 ownership
/// note, §9 retained design choice).
pub async fn create_instrument(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInstrumentRequest>,
) -> Result<Json<InstrumentResponse>, CoreError> {
    let ticker = Ticker::parse(&req.ticker).map_err(CoreError::InvalidRequest)?;
    let instrument = Admin::create_instrument(&state.db.pool, ticker, &req.name).await?;
    Ok(Json(instrument.into()))
}

/// `DELETE /admin/instruments/:ticker` -- cascades to positions and orders
/// for that instrument (§7); frozen cash tied to cascaded BID orders is
/// *not* refunded, per the Open Question resolution in DESIGN.md.
pub async fn delete_instrument(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<(), CoreError> {
    let ticker = Ticker::parse(&ticker).map_err(CoreError::InvalidRequest)?;
    Admin::delete_instrument(&state.db.pool, &ticker).await
}

/// `DELETE /admin/traders/:id` -- cascades to positions and orders.
pub async fn delete_trader(
    State(state): State<Arc<AppState>>,
    Path(trader_id): Path<TraderId>,
) -> Result<(), CoreError> {
    Admin::delete_trader(&state.db.pool, trader_id).await
}

/// `POST /admin/balance/adjust` -- spec.md §4.1/§6 "Admin adjust". `ticker`
/// may be the configured base currency (adjusts `balance`) or an instrument
/// ticker (adjusts that position's `quantity`).
pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminAdjustRequest>,
) -> Result<Json<TraderResponse>, CoreError> {
    let trader = Admin::adjust_balance(
        &state.db.pool,
        req.trader_id,
        &req.ticker,
        &state.config.base_currency_ticker,
        req.amount,
    )
    .await?;
    Ok(Json(trader.into()))
}

#[derive(Debug, serde::Serialize)]
pub struct InstrumentResponse {
    pub ticker: String,
    pub name: String,
}

impl From<Instrument> for InstrumentResponse {
    fn from(i: Instrument) -> Self {
        Self {
            ticker: i.ticker.0,
            name: i.name,
        }
    }
}
