use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::ids::{OrderId, Ticker, TradeId, TraderId};

#[derive(Debug, Clone, FromRow)]
pub struct Trade {
    pub id: TradeId,
    pub ticker: Ticker,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub from_trader_id: TraderId,
    pub to_trader_id: TraderId,
    pub amount: i64,
    pub price: i64,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TradeResponse {
    pub id: TradeId,
    pub ticker: String,
    pub amount: i64,
    pub price: i64,
    #[serde(serialize_with = "super::order::iso_millis::serialize")]
    pub executed_at: DateTime<Utc>,
}

impl From<Trade> for TradeResponse {
    fn from(t: Trade) -> Self {
        Self {
            id: t.id,
            ticker: t.ticker.0,
            amount: t.amount,
            price: t.price,
            executed_at: t.executed_at,
        }
    }
}
