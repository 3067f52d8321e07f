use axum::{extract::{Extension, State}, Json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::middleware::AuthUser;
use crate::engine::error::CoreError;
use crate::AppState;

/// `GET /account/balance` -- spec.md §6 "Get balance". Unifies free and
/// frozen into one figure per ticker: the base currency entry is
/// `balance + frozen` (frozen cash is whatever is reserved against open
/// BID orders); every instrument with a non-zero `quantity + frozen` gets
/// an entry too (frozen inventory is reserved against open ASK orders).
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<HashMap<String, i64>>, CoreError> {
    let trader = sqlx::query!(
        "SELECT balance, frozen FROM traders WHERE id = $1",
        caller.trader_id.0,
    )
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(CoreError::UnknownTrader(caller.trader_id))?;

    let mut out = HashMap::new();
    out.insert(
        state.config.base_currency_ticker.clone(),
        trader.balance + trader.frozen,
    );

    let positions = sqlx::query!(
        "SELECT ticker, quantity, frozen FROM positions WHERE trader_id = $1",
        caller.trader_id.0,
    )
    .fetch_all(&state.db.pool)
    .await?;

    for p in positions {
        let total = p.quantity + p.frozen;
        if total != 0 {
            out.insert(p.ticker, total);
        }
    }

    Ok(Json(out))
}
