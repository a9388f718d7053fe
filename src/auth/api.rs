//! Authentication API Endpoints
//! Mission: Thin axum boundary over the Auth Core

use crate::auth::middleware::bearer_token;
use crate::auth::models::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, UserResponse,
    UserRole, ValidateResponse,
};
use crate::auth::service::AuthService;
use crate::auth::user_store::UserStore;
use crate::auth::AuthError;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(user_store: Arc<UserStore>, service: Arc<AuthService>) -> Self {
        Self {
            user_store,
            service,
        }
    }
}

/// Register endpoint - POST /auth/register
///
/// Creates an account with the default `user` role and returns a token so
/// the client is logged in immediately.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let user = state
        .service
        .register(&payload.username, &payload.email, &payload.password)?;

    let (token, expires_in) = state.service.issue_token(&user)?;

    Ok(Json(LoginResponse {
        token,
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Login endpoint - POST /auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    info!("🔐 Login attempt: {}", payload.username);

    let (token, expires_in, user) = state.service.login(&payload.username, &payload.password)?;

    Ok(Json(LoginResponse {
        token,
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Token validation endpoint - POST /auth/validate
///
/// Always answers 200 with a boolean; verification failures become
/// `{valid: false, message}` rather than an error status.
pub async fn validate(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Json<ValidateResponse> {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(e) => {
            return Json(ValidateResponse {
                valid: false,
                user: None,
                message: Some(e.to_string()),
            })
        }
    };

    match state.service.verify_token(token) {
        Ok(claims) => Json(ValidateResponse {
            valid: true,
            user: Some(claims),
            message: None,
        }),
        Err(e) => Json(ValidateResponse {
            valid: false,
            user: None,
            message: Some(e.to_string()),
        }),
    }
}

/// Current user info - GET /auth/me
///
/// Built entirely from the verified claims; no store lookup.
pub async fn get_current_user(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

/// List all users - GET /users (any authenticated role)
pub async fn list_users(
    State(state): State<AuthState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = state.user_store.list()?;
    let response: Vec<UserResponse> = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(response))
}

/// Get one user - GET /users/:id
pub async fn get_user(
    State(state): State<AuthState>,
    Extension(_claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state
        .user_store
        .find_by_id(user_id)?
        .ok_or(AuthError::NotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Create user - POST /users (authenticated)
///
/// Same validation and defaults as self-registration.
pub async fn create_user(
    State(state): State<AuthState>,
    Extension(_claims): Extension<Claims>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state
        .service
        .register(&payload.username, &payload.email, &payload.password)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Update user - PATCH /users/:id
///
/// Role changes require a super_admin caller and are never allowed on the
/// caller's own record. Other fields are open to any authenticated caller.
pub async fn update_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    if payload.role.is_some() {
        if !AuthService::authorize(&claims, &[UserRole::SuperAdmin]) {
            return Err(AuthError::Forbidden);
        }
        if claims.sub == user_id {
            // Not even a super_admin may change their own role
            return Err(AuthError::Forbidden);
        }
    }

    let user = state.service.update_user(user_id, payload)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Delete user - DELETE /users/:id
pub async fn delete_user(
    State(state): State<AuthState>,
    Extension(_claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AuthError> {
    state.user_store.delete(user_id)?;
    info!("🗑️  User deleted: {}", user_id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use chrono::Utc;

    #[test]
    fn test_user_response_from_user() {
        let user = User {
            id: 7,
            username: "testuser".to_string(),
            email: "t@x.com".to_string(),
            password_hash: "hash123".to_string(),
            role: UserRole::Premium,
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        };

        let response = UserResponse::from_user(&user);
        assert_eq!(response.id, 7);
        assert_eq!(response.username, "testuser");
        assert_eq!(response.role, UserRole::Premium);

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("hash123"));
    }

    #[test]
    fn test_validate_response_shapes() {
        let ok = ValidateResponse {
            valid: true,
            user: Some(Claims {
                sub: 1,
                username: "alice".to_string(),
                role: UserRole::User,
                iat: 0,
                exp: 0,
            }),
            message: None,
        };
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains(r#""valid":true"#));
        assert!(!json.contains("message"));

        let bad = ValidateResponse {
            valid: false,
            user: None,
            message: Some("Token expired".to_string()),
        };
        let json = serde_json::to_string(&bad).unwrap();
        assert!(json.contains(r#""valid":false"#));
        assert!(!json.contains("user"));
    }
}
