use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::jwt::JwtManager;
use crate::models::{Role, TraderId};
use crate::AppState;

/// The authenticated caller, injected into request extensions by
/// [`auth_middleware`]. Handlers that need to know who is calling pull this
/// out instead of re-parsing the bearer token.
#[derive(Clone, Copy)]
pub struct AuthUser {
    pub trader_id: TraderId,
    pub role: Role,
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let jwt_manager = JwtManager::new(&state.config.jwt_secret, state.config.jwt_expiry_seconds);
    let claims = jwt_manager
        .verify(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser {
        trader_id: claims.sub,
        role: claims.role,
    });
    Ok(next.run(request).await)
}

/// Layered after `auth_middleware` on admin-only routes. Rejects with 403
/// any caller whose token role isn't `Admin`.
pub async fn require_admin(
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let role = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.role)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if role != Role::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(request).await)
}
