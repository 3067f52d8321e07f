use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::{Role, Ticker, TraderId};

#[derive(Debug, Clone, FromRow)]
pub struct Trader {
    pub id: TraderId,
    pub name: String,
    pub role: Role,
    pub balance: i64,
    pub frozen: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterTraderRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TraderResponse {
    pub id: TraderId,
    pub name: String,
    pub role: Role,
}

impl From<Trader> for TraderResponse {
    fn from(t: Trader) -> Self {
        Self {
            id: t.id,
            name: t.name,
            role: t.role,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Position {
    pub trader_id: TraderId,
    pub ticker: Ticker,
    pub quantity: i64,
    pub frozen: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminAdjustRequest {
    pub trader_id: TraderId,
    /// Base currency ticker credits/debits `balance`; an instrument ticker
    /// credits/debits that position's `quantity` instead.
    pub ticker: String,
    /// Signed amount in minor units; positive credits, negative debits.
    pub amount: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Instrument {
    pub ticker: Ticker,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInstrumentRequest {
    pub ticker: String,
    pub name: String,
}

