use chrono::Utc;
use sqlx::PgPool;

use crate::engine::error::CoreError;
use crate::engine::journal::TradeJournal;
use crate::engine::ledger::Ledger;
use crate::engine::orderbook::OrderBook;
use crate::models::{Order, OrderId, OrderStatus, Side, Ticker, TraderId};

/// How many resting orders on the opposite side a single submission will
/// consider. Generous enough that a realistic book never truncates a
/// match; a market order that would need more than this to fill in one
/// shot is treated the same as one that ran out of book (the untouched
/// remainder is cancelled, never partially reserved for later).
const MAX_MATCH_CANDIDATES: i64 = 2_000;

struct PlannedFill {
    maker: Order,
    qty: i64,
    price: i64,
}

pub struct MatchingEngine;

impl MatchingEngine {
    /// Submits a new order. Runs the reservation + matching attempt in one
    /// transaction; if that attempt fails on insufficient funds or
    /// position, the failed transaction is rolled back and a fresh one
    /// persists a `CANCELLED` record instead of surfacing a bare error --
    /// callers always get an `Order` back, never a dangling half-applied
    /// submission.
    pub async fn submit(
        pool: &PgPool,
        trader_id: TraderId,
        ticker: Ticker,
        side: Side,
        price: Option<i64>,
        amount: i64,
    ) -> Result<Order, CoreError> {
        let match_timer = crate::metrics::Timer::new();
        crate::metrics::record_order_submitted(if side == Side::Bid { "BID" } else { "ASK" });

        let mut tx = pool.begin().await?;

        // Pre-conditions checked first, in order (spec.md §4.3): instrument
        // known, then amount positive, then price positive.
        let instrument_exists =
            sqlx::query_scalar!("SELECT 1 FROM instruments WHERE ticker = $1", ticker.0)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
        if !instrument_exists {
            return Err(CoreError::UnknownInstrument(ticker.0));
        }

        if amount <= 0 {
            return Err(CoreError::InvalidRequest("amount must be positive".into()));
        }
        if let Some(p) = price {
            if p <= 0 {
                return Err(CoreError::InvalidRequest("price must be positive".into()));
            }
        }

        let trader_exists = sqlx::query_scalar!(
            "SELECT 1 FROM traders WHERE id = $1",
            trader_id.0
        )
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
        if !trader_exists {
            return Err(CoreError::UnknownTrader(trader_id));
        }

        let order_id = OrderId::new();
        let created_at = Utc::now();

        let candidates = OrderBook::top_n(&mut tx, &ticker, side.opposite(), MAX_MATCH_CANDIDATES)
            .await?;

        let plan = Self::plan_fills(&candidates, side, price, amount);
        let matched_total: i64 = plan.iter().map(|f| f.qty).sum();
        let remaining_after_plan = amount - matched_total;
        let is_market = price.is_none();

        // Reserve. A limit BID reserves its full worst case (price*amount)
        // up front -- this always dominates what the plan below actually
        // needs, because the maker-price rule never lets a taker pay worse
        // than its own limit. A market BID has no limit to reserve against,
        // so it reserves exactly what the plan will spend instead. Both ASK
        // branches reserve the full submitted `amount` of inventory,
        // per spec.md §4.3's unconditional "ASK with price or market:
        // reserve qty inventory of ticker" -- unlike the BID-market case,
        // the spec gives no check-as-you-go carve-out for ASKs, so an ASK
        // market order that the book can't fully cross must fail the whole
        // reservation rather than partially execute.
        let reservation_result = match (side, is_market) {
            (Side::Bid, false) => {
                let reserve = amount * price.unwrap();
                Ledger::freeze_cash(&mut tx, trader_id, reserve).await
            }
            (Side::Bid, true) => {
                let spend: i64 = plan.iter().map(|f| f.qty * f.price).sum();
                if spend > 0 {
                    Ledger::freeze_cash(&mut tx, trader_id, spend).await
                } else {
                    Ok(())
                }
            }
            (Side::Ask, false) | (Side::Ask, true) => {
                Ledger::freeze_position(&mut tx, trader_id, &ticker, amount).await
            }
        };

        if let Err(CoreError::InsufficientFunds) = reservation_result {
            tx.rollback().await?;
            tracing::debug!(%trader_id, %ticker, "order rejected: insufficient funds/position");
            let cancelled =
                Self::persist_cancelled(pool, order_id, trader_id, ticker, side, price, amount, created_at)
                    .await?;
            crate::metrics::record_order_match_duration(match_timer.elapsed_secs());
            return Ok(cancelled);
        }
        reservation_result?;

        // Apply the plan: settle each fill and update the resting order it
        // matched against.
        for fill in &plan {
            let new_remaining = fill.maker.remaining() - fill.qty;
            let new_status = if new_remaining == 0 {
                OrderStatus::Executed
            } else {
                OrderStatus::PartiallyExecuted
            };
            OrderBook::update_on_fill(&mut tx, fill.maker.id, fill.qty, new_status).await?;

            let (buyer, seller, buy_order_id, sell_order_id) = match side {
                Side::Bid => (trader_id, fill.maker.trader_id, order_id, fill.maker.id),
                Side::Ask => (fill.maker.trader_id, trader_id, fill.maker.id, order_id),
            };
            let cash_amount = fill.qty * fill.price;
            Ledger::transfer_trade(&mut tx, buyer, seller, &ticker, fill.qty, cash_amount).await?;
            TradeJournal::append(
                &mut tx,
                &ticker,
                buy_order_id,
                sell_order_id,
                seller,
                buyer,
                fill.qty,
                fill.price,
            )
            .await?;
            crate::metrics::record_trade_executed();
        }

        // A filled-at-a-better-price limit BID holds back more cash than
        // it actually spent; hand the difference back now that settlement
        // is done.
        if side == Side::Bid && !is_market {
            let spent: i64 = plan.iter().map(|f| f.qty * f.price).sum();
            let overreserved = matched_total * price.unwrap() - spent;
            if overreserved > 0 {
                Ledger::unfreeze_cash(&mut tx, trader_id, overreserved).await?;
            }
        }
        // A market ASK reserves the full submitted amount of inventory up
        // front; whatever the book couldn't absorb is cancelled, not rested,
        // so its reservation must be released now rather than held against
        // an order that no longer exists.
        if side == Side::Ask && is_market && remaining_after_plan > 0 {
            Ledger::unfreeze_position(&mut tx, trader_id, &ticker, remaining_after_plan).await?;
        }

        let final_status = if remaining_after_plan == 0 {
            OrderStatus::Executed
        } else if is_market {
            OrderStatus::Cancelled
        } else if matched_total > 0 {
            OrderStatus::PartiallyExecuted
        } else {
            OrderStatus::New
        };

        let order = Order {
            id: order_id,
            trader_id,
            ticker: ticker.clone(),
            side,
            price,
            amount: remaining_after_plan,
            filled: matched_total,
            status: final_status,
            created_at,
        };
        OrderBook::insert(&mut tx, &order).await?;

        tx.commit().await?;
        crate::metrics::record_order_match_duration(match_timer.elapsed_secs());
        tracing::debug!(
            order_id = %order.id,
            ticker = %order.ticker,
            filled = order.filled,
            status = ?order.status,
            "order submission settled"
        );
        Ok(order)
    }

    /// Computes, without mutating anything, which resting orders a
    /// taker would fill against and at what price/quantity.
    fn plan_fills(
        candidates: &[Order],
        taker_side: Side,
        taker_price: Option<i64>,
        taker_amount: i64,
    ) -> Vec<PlannedFill> {
        let mut remaining = taker_amount;
        let mut plan = Vec::new();
        for maker in candidates {
            if remaining == 0 {
                break;
            }
            let maker_price = match maker.price {
                Some(p) => p,
                None => continue, // resting orders are always limit orders
            };
            let crosses = match (taker_side, taker_price) {
                (_, None) => true, // market order crosses at any resting price
                (Side::Bid, Some(limit)) => maker_price <= limit,
                (Side::Ask, Some(limit)) => maker_price >= limit,
            };
            if !crosses {
                // Book is price-ordered best-first, so nothing further out
                // can cross either.
                break;
            }
            let qty = remaining.min(maker.remaining());
            if qty > 0 {
                plan.push(PlannedFill {
                    maker: maker.clone(),
                    qty,
                    price: maker_price,
                });
                remaining -= qty;
            }
        }
        plan
    }

    async fn persist_cancelled(
        pool: &PgPool,
        order_id: OrderId,
        trader_id: TraderId,
        ticker: Ticker,
        side: Side,
        price: Option<i64>,
        amount: i64,
        created_at: chrono::DateTime<Utc>,
    ) -> Result<Order, CoreError> {
        let order = Order {
            id: order_id,
            trader_id,
            ticker,
            side,
            price,
            amount,
            filled: 0,
            status: OrderStatus::Cancelled,
            created_at,
        };
        let mut tx = pool.begin().await?;
        OrderBook::insert(&mut tx, &order).await?;
        tx.commit().await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maker(id: u128, price: i64, amount: i64) -> Order {
        Order {
            id: OrderId(uuid::Uuid::from_u128(id)),
            trader_id: TraderId(uuid::Uuid::from_u128(999)),
            ticker: Ticker("BTC".into()),
            side: Side::Ask,
            price: Some(price),
            amount,
            filled: 0,
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn plan_fills_respects_price_time_priority() {
        let candidates = vec![maker(1, 100, 5), maker(2, 100, 5), maker(3, 99, 5)];
        // a limit BID crossing at 100 should prefer the cheaper level first
        let plan = MatchingEngine::plan_fills(&candidates, Side::Bid, Some(100), 12);
        // candidates arrive already ordered best-price-first from the book
        // query; plan_fills must not reorder them itself
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].qty, 5);
        assert_eq!(plan[2].qty, 2);
    }

    #[test]
    fn plan_fills_stops_at_first_non_crossing_level() {
        let candidates = vec![maker(1, 100, 5), maker(2, 150, 5)];
        let plan = MatchingEngine::plan_fills(&candidates, Side::Bid, Some(110), 10);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].qty, 5);
    }

    #[test]
    fn market_order_crosses_regardless_of_price() {
        let candidates = vec![maker(1, 500, 3)];
        let plan = MatchingEngine::plan_fills(&candidates, Side::Bid, None, 10);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].qty, 3);
    }
}
