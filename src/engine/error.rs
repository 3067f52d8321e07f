use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::models::{OrderId, TraderId};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("unknown trader: {0}")]
    UnknownTrader(TraderId),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: order {order_id} does not belong to trader {trader_id}")]
    Forbidden {
        order_id: OrderId,
        trader_id: TraderId,
    },

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("order {0} is already in a terminal state")]
    AlreadyTerminal(OrderId),

    #[error("order {0} cannot be cancelled from its current state")]
    NotCancellable(OrderId),

    #[error("accounting invariant violated: {0}")]
    AccountingError(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        // An accounting invariant slipping past application logic is a bug,
        // not a client-facing error: fail the worker loudly instead of
        // returning a 500 that looks routine.
        if let CoreError::AccountingError(ref msg) = self {
            panic!("accounting invariant violated: {msg}");
        }

        let (status, code) = match &self {
            CoreError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            CoreError::UnknownInstrument(_) => (StatusCode::NOT_FOUND, "UNKNOWN_INSTRUMENT"),
            CoreError::UnknownTrader(_) => (StatusCode::NOT_FOUND, "UNKNOWN_TRADER"),
            CoreError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            CoreError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CoreError::InsufficientFunds => (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_FUNDS"),
            CoreError::AlreadyTerminal(_) => (StatusCode::CONFLICT, "ALREADY_TERMINAL"),
            CoreError::NotCancellable(_) => (StatusCode::CONFLICT, "NOT_CANCELLABLE"),
            CoreError::AccountingError(_) => unreachable!("panicked above"),
            CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            CoreError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
        }

        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
