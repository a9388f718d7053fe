//! JWT Token Handler
//! Mission: Generate and validate JWT tokens securely

use crate::auth::error::{AuthError, TokenError};
use crate::auth::models::{Claims, User};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Default token lifetime: 7 days
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 3600;

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    ttl_secs: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key and the default TTL
    pub fn new(secret: String) -> Self {
        Self::with_ttl(secret, DEFAULT_TTL_SECS)
    }

    /// Create a handler with an explicit TTL in seconds.
    /// Negative TTLs produce already-expired tokens (used in tests).
    pub fn with_ttl(secret: String, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &User) -> Result<(String, i64), AuthError> {
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}s",
            user.username, user.id, self.ttl_secs
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to generate JWT: {e}")))?;

        Ok((token, self.ttl_secs))
    }

    /// Validate a JWT token and extract claims.
    ///
    /// Both the signature check and the expiry check run on every call;
    /// there is no mode that disables either.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0; // exp is a hard cutoff

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

        debug!("Validated JWT for user {}", decoded.claims.username);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;

    fn create_test_user() -> User {
        User {
            id: 42,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = JwtHandler::new("test-secret-key-12345".to_string());
        let user = create_test_user();

        let (token, expires_in) = handler.generate_token(&user).unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, DEFAULT_TTL_SECS);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, user.role);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_malformed_token_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345".to_string());

        assert_eq!(
            handler.validate_token("not-a-token"),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            handler.validate_token("a.b.c"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative TTL issues a token that is already past its expiry
        let handler = JwtHandler::with_ttl("test-secret-key-12345".to_string(), -120);
        let user = create_test_user();

        let (token, _) = handler.generate_token(&user).unwrap();
        assert_eq!(handler.validate_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345".to_string());
        let user = create_test_user();

        let (token, _) = handler.generate_token(&user).unwrap();

        // Flip a character in the middle of the signature segment
        let mut parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let mut sig: Vec<u8> = parts[2].bytes().collect();
        let mid = sig.len() / 2;
        sig[mid] = if sig[mid] == b'A' { b'B' } else { b'A' };
        let sig = String::from_utf8(sig).unwrap();
        parts[2] = &sig;
        let tampered = parts.join(".");

        assert_eq!(
            handler.validate_token(&tampered),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new("secret1".to_string());
        let handler2 = JwtHandler::new("secret2".to_string());
        let user = create_test_user();

        let (token, _) = handler1.generate_token(&user).unwrap();

        assert_eq!(
            handler2.validate_token(&token),
            Err(TokenError::InvalidSignature)
        );
    }
}
