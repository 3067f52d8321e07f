use sqlx::{Postgres, Transaction};

use crate::models::{Order, OrderId, OrderStatus, Side, Ticker, TraderId};

/// Reads and mutates the resting side of the book for one instrument. The
/// database row set under `status IN ('NEW', 'PARTIALLY_EXECUTED')` *is*
/// the book -- there is no separate in-process structure to keep in sync.
/// `top_n` takes row locks, so two submissions against the same instrument
/// serialize on whichever resting orders they both want to look at.
pub struct OrderBook;

impl OrderBook {
    /// Returns up to `limit` resting orders on `side` for `ticker`, in
    /// matching priority order (best price first, then FIFO by
    /// `created_at`), locked `FOR UPDATE` within the caller's transaction.
    pub async fn top_n(
        tx: &mut Transaction<'_, Postgres>,
        ticker: &Ticker,
        side: Side,
        limit: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let rows = if side.book_is_descending() {
            sqlx::query_as!(
                Order,
                r#"SELECT id as "id: OrderId", trader_id as "trader_id: TraderId",
                       ticker as "ticker: Ticker", side as "side: Side",
                       price, amount, filled, status as "status: OrderStatus", created_at
                FROM orders
                WHERE ticker = $1 AND side = $2
                  AND status IN ('NEW', 'PARTIALLY_EXECUTED')
                ORDER BY price DESC, created_at ASC
                LIMIT $3
                FOR UPDATE"#,
                ticker.0,
                side as Side,
                limit,
            )
            .fetch_all(&mut **tx)
            .await?
        } else {
            sqlx::query_as!(
                Order,
                r#"SELECT id as "id: OrderId", trader_id as "trader_id: TraderId",
                       ticker as "ticker: Ticker", side as "side: Side",
                       price, amount, filled, status as "status: OrderStatus", created_at
                FROM orders
                WHERE ticker = $1 AND side = $2
                  AND status IN ('NEW', 'PARTIALLY_EXECUTED')
                ORDER BY price ASC, created_at ASC
                LIMIT $3
                FOR UPDATE"#,
                ticker.0,
                side as Side,
                limit,
            )
            .fetch_all(&mut **tx)
            .await?
        };
        Ok(rows)
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), sqlx::Error> {
        sqlx::query!(
            "INSERT INTO orders (id, trader_id, ticker, side, price, amount, filled, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            order.id.0,
            order.trader_id.0,
            order.ticker.0,
            order.side as Side,
            order.price,
            order.amount,
            order.filled,
            order.status as OrderStatus,
            order.created_at,
        )
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Applies a fill of `qty` to a resting order, updating `amount`,
    /// `filled`, and `status` in one statement.
    pub async fn update_on_fill(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        qty: i64,
        new_status: OrderStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query!(
            "UPDATE orders SET amount = amount - $1, filled = filled + $1, status = $2
             WHERE id = $3",
            qty,
            new_status as OrderStatus,
            order_id.0,
        )
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query!(
            "UPDATE orders SET status = $1 WHERE id = $2",
            status as OrderStatus,
            order_id.0,
        )
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn get_for_update(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as!(
            Order,
            r#"SELECT id as "id: OrderId", trader_id as "trader_id: TraderId",
                   ticker as "ticker: Ticker", side as "side: Side",
                   price, amount, filled, status as "status: OrderStatus", created_at
            FROM orders WHERE id = $1 FOR UPDATE"#,
            order_id.0,
        )
        .fetch_optional(&mut **tx)
        .await
    }

    /// Aggregated depth snapshot for the public orderbook view: one row
    /// per price level with total resting quantity, best price first.
    pub async fn depth(
        pool: &sqlx::PgPool,
        ticker: &Ticker,
        side: Side,
        levels: i64,
    ) -> Result<Vec<(i64, i64)>, sqlx::Error> {
        let order_clause_desc = side.book_is_descending();
        let rows: Vec<(Option<i64>, Option<i64>)> = if order_clause_desc {
            sqlx::query_as(
                "SELECT price, SUM(amount)::BIGINT FROM orders
                 WHERE ticker = $1 AND side = $2 AND status IN ('NEW','PARTIALLY_EXECUTED')
                   AND price IS NOT NULL
                 GROUP BY price ORDER BY price DESC LIMIT $3",
            )
            .bind(&ticker.0)
            .bind(side)
            .bind(levels)
            .fetch_all(pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT price, SUM(amount)::BIGINT FROM orders
                 WHERE ticker = $1 AND side = $2 AND status IN ('NEW','PARTIALLY_EXECUTED')
                   AND price IS NOT NULL
                 GROUP BY price ORDER BY price ASC LIMIT $3",
            )
            .bind(&ticker.0)
            .bind(side)
            .bind(levels)
            .fetch_all(pool)
            .await?
        };
        Ok(rows
            .into_iter()
            .filter_map(|(p, q)| Some((p?, q?)))
            .collect())
    }
}
