use sqlx::{Postgres, Transaction};

use crate::engine::error::CoreError;
use crate::models::{Ticker, TraderId};

/// Moves balances between a trader's available and frozen cash, and between
/// counterparties on a trade. Every method here runs inside the caller's
/// open transaction -- the ledger never opens one of its own -- so a
/// reservation and the match it backs always commit or roll back together.
pub struct Ledger;

impl Ledger {
    /// Applies a signed delta to a trader's available cash balance.
    /// Rejects the change (and the whole transaction, via the DB's
    /// CHECK constraint) if it would drive the balance negative.
    pub async fn adjust(
        tx: &mut Transaction<'_, Postgres>,
        trader_id: TraderId,
        delta: i64,
    ) -> Result<(), CoreError> {
        let result = sqlx::query!(
            "UPDATE traders SET balance = balance + $1 WHERE id = $2 AND balance + $1 >= 0",
            delta,
            trader_id.0,
        )
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientFunds);
        }
        Ok(())
    }

    /// Applies a signed delta to a trader's position quantity for an
    /// instrument -- the position-side counterpart of `adjust`, used by
    /// admin adjustment when `ticker` names an instrument rather than the
    /// base currency. Rejects the change if it would drive `quantity`
    /// negative.
    pub async fn adjust_position(
        tx: &mut Transaction<'_, Postgres>,
        trader_id: TraderId,
        ticker: &Ticker,
        delta: i64,
    ) -> Result<(), CoreError> {
        let result = sqlx::query!(
            "UPDATE positions SET quantity = quantity + $1
             WHERE trader_id = $2 AND ticker = $3 AND quantity + $1 >= 0",
            delta,
            trader_id.0,
            ticker.0,
        )
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientFunds);
        }
        Ok(())
    }

    /// Moves `amount` from available to frozen for the base-currency cash
    /// ledger, failing with `InsufficientFunds` if available is too low.
    pub async fn freeze_cash(
        tx: &mut Transaction<'_, Postgres>,
        trader_id: TraderId,
        amount: i64,
    ) -> Result<(), CoreError> {
        debug_assert!(amount >= 0);
        let result = sqlx::query!(
            "UPDATE traders SET balance = balance - $1, frozen = frozen + $1
             WHERE id = $2 AND balance >= $1",
            amount,
            trader_id.0,
        )
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientFunds);
        }
        Ok(())
    }

    /// Reverses a prior `freeze_cash`, moving `amount` back from frozen to
    /// available. Frozen accounting is an internal invariant -- if frozen
    /// underflows here, the reservation bookkeeping upstream is broken.
    pub async fn unfreeze_cash(
        tx: &mut Transaction<'_, Postgres>,
        trader_id: TraderId,
        amount: i64,
    ) -> Result<(), CoreError> {
        debug_assert!(amount >= 0);
        let result = sqlx::query!(
            "UPDATE traders SET balance = balance + $1, frozen = frozen - $1
             WHERE id = $2 AND frozen >= $1",
            amount,
            trader_id.0,
        )
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AccountingError(format!(
                "unfreeze_cash({trader_id}, {amount}) underflowed frozen balance"
            )));
        }
        Ok(())
    }

    /// Freezes `quantity` units of `ticker` position for an ASK order.
    pub async fn freeze_position(
        tx: &mut Transaction<'_, Postgres>,
        trader_id: TraderId,
        ticker: &Ticker,
        quantity: i64,
    ) -> Result<(), CoreError> {
        debug_assert!(quantity >= 0);
        let result = sqlx::query!(
            "UPDATE positions SET quantity = quantity - $1, frozen = frozen + $1
             WHERE trader_id = $2 AND ticker = $3 AND quantity >= $1",
            quantity,
            trader_id.0,
            ticker.0,
        )
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientFunds);
        }
        Ok(())
    }

    pub async fn unfreeze_position(
        tx: &mut Transaction<'_, Postgres>,
        trader_id: TraderId,
        ticker: &Ticker,
        quantity: i64,
    ) -> Result<(), CoreError> {
        debug_assert!(quantity >= 0);
        let result = sqlx::query!(
            "UPDATE positions SET quantity = quantity + $1, frozen = frozen - $1
             WHERE trader_id = $2 AND ticker = $3 AND frozen >= $1",
            quantity,
            trader_id.0,
            ticker.0,
        )
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AccountingError(format!(
                "unfreeze_position({trader_id}, {ticker}, {quantity}) underflowed frozen position"
            )));
        }
        Ok(())
    }

    /// Settles one matched fill between a buyer and a seller: credits the
    /// buyer's position and the seller's cash, and releases the matching
    /// slice of whichever side had funds frozen for this trade. The
    /// counterparties' frozen reservations were debited up front at order
    /// submission time, so settlement here is credit-only -- it never
    /// debits a balance, which is what keeps a mid-match crash from ever
    /// leaving one side paid and the other not.
    pub async fn transfer_trade(
        tx: &mut Transaction<'_, Postgres>,
        buyer_id: TraderId,
        seller_id: TraderId,
        ticker: &Ticker,
        quantity: i64,
        cash_amount: i64,
    ) -> Result<(), CoreError> {
        debug_assert!(quantity >= 0 && cash_amount >= 0);

        // Seller's frozen position shrinks by the traded quantity (it was
        // reserved at order entry); buyer receives the quantity outright.
        let result = sqlx::query!(
            "UPDATE positions SET frozen = frozen - $1
             WHERE trader_id = $2 AND ticker = $3 AND frozen >= $1",
            quantity,
            seller_id.0,
            ticker.0,
        )
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::AccountingError(format!(
                "transfer_trade: seller {seller_id} frozen position underflow for {ticker}"
            )));
        }

        sqlx::query!(
            "INSERT INTO positions (trader_id, ticker, quantity, frozen)
             VALUES ($1, $2, $3, 0)
             ON CONFLICT (trader_id, ticker)
             DO UPDATE SET quantity = positions.quantity + $3",
            buyer_id.0,
            ticker.0,
            quantity,
        )
        .execute(&mut **tx)
        .await?;

        // Buyer's frozen cash shrinks by the traded notional (reserved at
        // order entry); seller receives the cash outright.
        let result = sqlx::query!(
            "UPDATE traders SET frozen = frozen - $1
             WHERE id = $2 AND frozen >= $1",
            cash_amount,
            buyer_id.0,
        )
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::AccountingError(format!(
                "transfer_trade: buyer {buyer_id} frozen cash underflow"
            )));
        }

        sqlx::query!(
            "UPDATE traders SET balance = balance + $1 WHERE id = $2",
            cash_amount,
            seller_id.0,
        )
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
