use sqlx::PgPool;

use crate::engine::error::CoreError;
use crate::engine::ledger::Ledger;
use crate::models::{Instrument, Role, Ticker, Trader, TraderId};

/// Registration, instrument lifecycle, and admin balance adjustment --
/// everything outside the order-matching hot path that still needs a
/// transactional boundary because it touches more than one table.
pub struct Admin;

impl Admin {
    /// Creates a trader and, per every instrument that already exists, a
    /// zero-quantity position row -- so a freshly registered trader can be
    /// credited a position in any instrument without a first-touch insert
    /// racing the matcher.
    pub async fn register_trader(
        pool: &PgPool,
        name: &str,
        role: Role,
    ) -> Result<Trader, CoreError> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_scalar!("SELECT 1 FROM traders WHERE name = $1", name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(CoreError::Conflict(format!("trader '{name}' already exists")));
        }

        let trader_id = TraderId::new();
        sqlx::query!(
            "INSERT INTO traders (id, name, role, balance, frozen) VALUES ($1, $2, $3, 0, 0)",
            trader_id.0,
            name,
            role as Role,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query!(
            "INSERT INTO positions (trader_id, ticker, quantity, frozen)
             SELECT $1, ticker, 0, 0 FROM instruments",
            trader_id.0,
        )
        .execute(&mut *tx)
        .await?;

        let trader = sqlx::query_as!(
            Trader,
            r#"SELECT id as "id: TraderId", name, role as "role: Role", balance, frozen, created_at
               FROM traders WHERE id = $1"#,
            trader_id.0,
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(trader)
    }

    /// Creates an instrument and a zero-quantity position for every
    /// existing trader, mirroring `register_trader`'s symmetry.
    pub async fn create_instrument(
        pool: &PgPool,
        ticker: Ticker,
        name: &str,
    ) -> Result<Instrument, CoreError> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_scalar!(
            "SELECT 1 FROM instruments WHERE ticker = $1",
            ticker.0
        )
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(CoreError::Conflict(format!(
                "instrument '{}' already exists",
                ticker.0
            )));
        }

        sqlx::query!(
            "INSERT INTO instruments (ticker, name) VALUES ($1, $2)",
            ticker.0,
            name,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query!(
            "INSERT INTO positions (trader_id, ticker, quantity, frozen)
             SELECT id, $1, 0, 0 FROM traders",
            ticker.0,
        )
        .execute(&mut *tx)
        .await?;

        let instrument = sqlx::query_as!(
            Instrument,
            r#"SELECT ticker as "ticker: Ticker", name, created_at FROM instruments WHERE ticker = $1"#,
            ticker.0,
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(instrument)
    }

    /// Deletes an instrument. Cascades to orders/positions/trades via FK;
    /// any cash frozen against open BID orders on this instrument is *not*
    /// refunded -- a known gap, left exactly as specified.
    pub async fn delete_instrument(pool: &PgPool, ticker: &Ticker) -> Result<(), CoreError> {
        let result = sqlx::query!("DELETE FROM instruments WHERE ticker = $1", ticker.0)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::UnknownInstrument(ticker.0.clone()));
        }
        Ok(())
    }

    pub async fn delete_trader(pool: &PgPool, trader_id: TraderId) -> Result<(), CoreError> {
        let result = sqlx::query!("DELETE FROM traders WHERE id = $1", trader_id.0)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::UnknownTrader(trader_id));
        }
        Ok(())
    }

    /// Credits or debits a trader's available cash balance or, when `ticker`
    /// names an instrument rather than the configured base currency, that
    /// instrument's position `quantity` directly -- bypassing the
    /// frozen/available split entirely. Mirrors the source's
    /// `__change_balance` dispatch on `ticker == BASE_CURRENCY_TICKER`.
    pub async fn adjust_balance(
        pool: &PgPool,
        trader_id: TraderId,
        ticker: &str,
        base_currency_ticker: &str,
        delta: i64,
    ) -> Result<Trader, CoreError> {
        let mut tx = pool.begin().await?;

        let trader_exists = sqlx::query_scalar!("SELECT 1 FROM traders WHERE id = $1", trader_id.0)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !trader_exists {
            return Err(CoreError::UnknownTrader(trader_id));
        }

        if ticker == base_currency_ticker {
            Ledger::adjust(&mut tx, trader_id, delta).await?;
        } else {
            let instrument_ticker = Ticker::parse(ticker).map_err(CoreError::InvalidRequest)?;
            let instrument_exists = sqlx::query_scalar!(
                "SELECT 1 FROM instruments WHERE ticker = $1",
                instrument_ticker.0,
            )
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
            if !instrument_exists {
                return Err(CoreError::UnknownInstrument(instrument_ticker.0));
            }
            Ledger::adjust_position(&mut tx, trader_id, &instrument_ticker, delta).await?;
        }

        let trader = sqlx::query_as!(
            Trader,
            r#"SELECT id as "id: TraderId", name, role as "role: Role", balance, frozen, created_at
               FROM traders WHERE id = $1"#,
            trader_id.0,
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(trader)
    }
}
