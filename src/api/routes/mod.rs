use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::auth::middleware::{auth_middleware, require_admin};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/instruments/:ticker/orderbook",
            get(handlers::market::get_orderbook),
        )
        .route(
            "/instruments/:ticker/trades",
            get(handlers::market::get_recent_trades),
        );

    let trader_routes = Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route(
            "/orders/:order_id",
            get(handlers::orders::get_order).delete(handlers::orders::cancel_order),
        )
        .route("/account/balance", get(handlers::account::get_balance))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin/instruments", post(handlers::admin::create_instrument))
        .route(
            "/admin/instruments/:ticker",
            delete(handlers::admin::delete_instrument),
        )
        .route("/admin/traders/:id", delete(handlers::admin::delete_trader))
        .route("/admin/balance/adjust", post(handlers::admin::adjust_balance))
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(trader_routes)
        .merge(admin_routes)
}
