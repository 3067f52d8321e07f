use sqlx::{Postgres, Transaction};

use crate::engine::error::CoreError;
use crate::engine::ledger::Ledger;
use crate::engine::orderbook::OrderBook;
use crate::models::{Order, OrderId, OrderStatus, Side, Ticker, TraderId};

/// Cancellation and read access over an order's lifecycle. Cancellation
/// takes the same `FOR UPDATE` row lock the matcher takes, so it always
/// serializes correctly against a submission racing to fill that order.
pub struct OrderLifecycle;

impl OrderLifecycle {
    /// Cancels `order_id` on behalf of `trader_id`, refunding whatever is
    /// still frozen against it. Errors are checked and returned in a fixed
    /// order: ownership before terminal-state before cancellability, so a
    /// trader probing someone else's already-filled order always sees
    /// `Forbidden`, never a state-leaking `AlreadyTerminal`.
    pub async fn cancel(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        trader_id: TraderId,
    ) -> Result<Order, CoreError> {
        let order = OrderBook::get_for_update(tx, order_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        if order.trader_id != trader_id {
            return Err(CoreError::Forbidden {
                order_id,
                trader_id,
            });
        }
        // PARTIALLY_EXECUTED is treated as terminal for cancellation
        // purposes, not just EXECUTED/CANCELLED -- a trader who wants out
        // of a partially filled order's remainder must wait for it to
        // finish matching. Unconventional, but retained deliberately.
        if order.status.is_terminal() || order.status == OrderStatus::PartiallyExecuted {
            return Err(CoreError::AlreadyTerminal(order_id));
        }
        // Market orders never rest on the book -- they're always terminal
        // by the time a cancel could reach them -- but the check stays
        // explicit rather than relying on that being true everywhere.
        if order.is_market() {
            return Err(CoreError::NotCancellable(order_id));
        }

        let remaining = order.remaining();
        match order.side {
            Side::Bid => {
                let refund = remaining * order.price.unwrap_or(0);
                Ledger::unfreeze_cash(tx, trader_id, refund).await?;
            }
            Side::Ask => {
                Ledger::unfreeze_position(tx, trader_id, &order.ticker, remaining).await?;
            }
        }

        OrderBook::set_status(tx, order_id, OrderStatus::Cancelled).await?;
        crate::metrics::record_order_cancelled();

        Ok(Order {
            status: OrderStatus::Cancelled,
            ..order
        })
    }

    pub async fn get(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
    ) -> Result<Order, CoreError> {
        OrderBook::get_for_update(tx, order_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    pub async fn list_by_trader(
        pool: &sqlx::PgPool,
        trader_id: TraderId,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as!(
            Order,
            r#"SELECT id as "id: OrderId", trader_id as "trader_id: TraderId",
                   ticker as "ticker: crate::models::Ticker", side as "side: Side",
                   price, amount, filled, status as "status: OrderStatus", created_at
            FROM orders WHERE trader_id = $1 ORDER BY created_at DESC"#,
            trader_id.0,
        )
        .fetch_all(pool)
        .await
    }

    /// Spec.md §4.5 `list_active(ticker, side, n)` -- up to `n` resting
    /// orders on `side` for `ticker`, in the same price-time priority order
    /// as the book the matcher walks. A read-only, non-locking sibling of
    /// `OrderBook::top_n`: that one takes `FOR UPDATE` locks because it
    /// feeds a matching transaction, this one is a plain query for
    /// external callers and takes no locks at all.
    pub async fn list_active(
        pool: &sqlx::PgPool,
        ticker: &Ticker,
        side: Side,
        n: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        if side.book_is_descending() {
            sqlx::query_as!(
                Order,
                r#"SELECT id as "id: OrderId", trader_id as "trader_id: TraderId",
                       ticker as "ticker: Ticker", side as "side: Side",
                       price, amount, filled, status as "status: OrderStatus", created_at
                FROM orders
                WHERE ticker = $1 AND side = $2
                  AND status IN ('NEW', 'PARTIALLY_EXECUTED')
                ORDER BY price DESC, created_at ASC
                LIMIT $3"#,
                ticker.0,
                side as Side,
                n,
            )
            .fetch_all(pool)
            .await
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
                LIMIT $3"#,
                ticker.0,
                side as Side,
                n,
            )
            .fetch_all(pool)
            .await
        }
    }
}
