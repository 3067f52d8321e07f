use sqlx::{Postgres, Transaction};

use crate::models::{OrderId, Ticker, Trade, TradeId, TraderId};

/// Append-only record of executed trades. Never updated or deleted once
/// written.
pub struct TradeJournal;

impl TradeJournal {
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        tx: &mut Transaction<'_, Postgres>,
        ticker: &Ticker,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        from_trader_id: TraderId,
        to_trader_id: TraderId,
        amount: i64,
        price: i64,
    ) -> Result<TradeId, sqlx::Error> {
        let id = sqlx::query_scalar!(
            "INSERT INTO trades
                (ticker, buy_order_id, sell_order_id, from_trader_id, to_trader_id, amount, price)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
            ticker.0,
            buy_order_id.0,
            sell_order_id.0,
            from_trader_id.0,
            to_trader_id.0,
            amount,
            price,
        )
        .fetch_one(tx.as_mut())
        .await?;
        Ok(TradeId(id))
    }

    pub async fn recent(
        pool: &sqlx::PgPool,
        ticker: &Ticker,
        n: i64,
    ) -> Result<Vec<Trade>, sqlx::Error> {
        sqlx::query_as!(
            Trade,
            r#"SELECT id as "id: TradeId", ticker as "ticker: Ticker",
                   buy_order_id as "buy_order_id: OrderId", sell_order_id as "sell_order_id: OrderId",
                   from_trader_id as "from_trader_id: TraderId", to_trader_id as "to_trader_id: TraderId",
                   amount, price, executed_at
            FROM trades WHERE ticker = $1 ORDER BY executed_at DESC LIMIT $2"#,
            ticker.0,
            n,
        )
        .fetch_all(pool)
        .await
    }
}
