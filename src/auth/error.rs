//! Authentication Errors
//! Mission: One typed taxonomy, mapped to HTTP status codes at the boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Token verification failures (Token Codec level)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Token structure could not be parsed
    Malformed,
    /// Signature does not match header+payload
    InvalidSignature,
    /// Token is past its expiry
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Auth errors surfaced by the core and the HTTP boundary
#[derive(Debug)]
pub enum AuthError {
    /// Username already taken (pre-check or store unique constraint)
    DuplicateUsername,
    /// Email already registered (pre-check or store unique constraint)
    DuplicateEmail,
    /// Covers both unknown username and wrong password - no enumeration
    InvalidCredentials,
    /// Request payload failed validation
    InvalidInput(&'static str),
    /// Token verification failed, wrapping the codec's reason
    Unauthenticated(TokenError),
    /// No bearer token supplied
    MissingToken,
    /// Authorization header present but not `Bearer {token}`
    InvalidAuthHeader,
    /// Caller's role does not permit the operation
    Forbidden,
    /// No user with the requested id
    NotFound,
    /// Store or hashing backend failure
    Internal(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::DuplicateUsername => write!(f, "Username already exists"),
            AuthError::DuplicateEmail => write!(f, "Email already registered"),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::InvalidInput(msg) => write!(f, "{msg}"),
            AuthError::Unauthenticated(reason) => write!(f, "{reason}"),
            AuthError::MissingToken => write!(f, "Missing authorization token"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization format. Use: Bearer {{token}}")
            }
            AuthError::Forbidden => write!(f, "Insufficient permissions"),
            AuthError::NotFound => write!(f, "User not found"),
            AuthError::Internal(detail) => write!(f, "Internal error: {detail}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::DuplicateUsername | AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated(_)
            | AuthError::MissingToken
            | AuthError::InvalidAuthHeader => StatusCode::UNAUTHORIZED,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Never leak backend details to the client
        let message = match &self {
            AuthError::Internal(detail) => {
                error!("Internal auth error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, message).into_response()
    }
}
