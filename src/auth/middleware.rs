//! Authentication Middleware
//! Mission: Guard protected routes with bearer-token verification

use crate::auth::error::AuthError;
use crate::auth::service::AuthService;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extract a bearer token from the Authorization header.
///
/// Returns `Err(MissingToken)` when the header is absent and
/// `Err(InvalidAuthHeader)` when it is present but not `Bearer {token}`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Auth middleware that verifies bearer tokens on protected routes.
///
/// This is the only place token extraction happens. An absent or malformed
/// header is rejected before the Auth Core is consulted. On success the
/// verified claims are attached to request extensions for handlers.
pub async fn auth_middleware(
    State(service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?.to_string();

    let claims = service.verify_token(&token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
