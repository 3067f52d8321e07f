use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

use super::ids::{OrderId, Ticker, TraderId};

/// Serializes a `DateTime<Utc>` as an ISO-8601 string with millisecond
/// precision and a trailing `Z`, matching the wire format trades and orders
/// have always used on this API (chrono's default RFC3339 impl emits
/// `+00:00`, not `Z`, so this is hand-rolled rather than derived).
pub(crate) mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        serializer.serialize_str(&formatted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// BID books sort best-first as highest price; ASK books sort
    /// best-first as lowest price.
    pub fn book_is_descending(self) -> bool {
        matches!(self, Side::Bid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    PartiallyExecuted,
    Executed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Executed | OrderStatus::Cancelled)
    }
}

/// `amount` holds the *remaining* unfilled quantity and is decremented in
/// place as the order is matched; `filled` is the cumulative quantity
/// already executed. The original order size a trader submitted is always
/// `amount + filled`, never stored directly.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub trader_id: TraderId,
    pub ticker: Ticker,
    pub side: Side,
    /// `None` for a market order.
    pub price: Option<i64>,
    pub amount: i64,
    pub filled: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_market(&self) -> bool {
        self.price.is_none()
    }

    pub fn remaining(&self) -> i64 {
        self.amount
    }

    pub fn original_size(&self) -> i64 {
        self.amount + self.filled
    }
}

/// Wire-only direction vocabulary -- spec.md §6: "Submit order(... side ∈
/// {BUY, SELL} ...). Maps BUY→BID, SELL→ASK." The core never sees `BUY`/
/// `SELL`; callers translate at the handler boundary via `OrderDirection::
/// into_side`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Buy,
    Sell,
}

impl OrderDirection {
    pub fn into_side(self) -> Side {
        match self {
            OrderDirection::Buy => Side::Bid,
            OrderDirection::Sell => Side::Ask,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub ticker: String,
    pub side: OrderDirection,
    /// Omitted or null submits a market order.
    pub price: Option<i64>,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub ticker: String,
    pub side: Side,
    pub price: Option<i64>,
    /// Original order size plus whatever has already been filled -- the
    /// convention this API has always used for "amount" in responses.
    pub amount: i64,
    pub filled: i64,
    pub status: OrderStatus,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            ticker: order.ticker.0.clone(),
            side: order.side,
            price: order.price,
            amount: order.original_size(),
            filled: order.filled,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_opposite_is_involutive() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::Bid.opposite().opposite(), Side::Bid);
    }

    #[test]
    fn book_ordering_direction_matches_side() {
        assert!(Side::Bid.book_is_descending());
        assert!(!Side::Ask.book_is_descending());
    }

    #[test]
    fn only_executed_and_cancelled_are_terminal() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::PartiallyExecuted.is_terminal());
        assert!(OrderStatus::Executed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    fn sample_order(price: Option<i64>, amount: i64, filled: i64) -> Order {
        Order {
            id: OrderId::new(),
            trader_id: TraderId::new(),
            ticker: Ticker("BTCUSD".to_string()),
            side: Side::Bid,
            price,
            amount,
            filled,
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn original_size_is_remaining_plus_filled() {
        let order = sample_order(Some(100), 30, 70);
        assert_eq!(order.remaining(), 30);
        assert_eq!(order.original_size(), 100);
    }

    #[test]
    fn order_without_price_is_a_market_order() {
        assert!(sample_order(None, 10, 0).is_market());
        assert!(!sample_order(Some(5), 10, 0).is_market());
    }

    #[test]
    fn response_amount_reports_original_size_not_remaining() {
        let order = sample_order(Some(100), 40, 60);
        let response: OrderResponse = order.into();
        assert_eq!(response.amount, 100);
        assert_eq!(response.filled, 60);
    }
}
