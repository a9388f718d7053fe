//! Auth Core
//! Mission: Credential verification, token issuance, and role authorization

use crate::auth::error::AuthError;
use crate::auth::jwt::JwtHandler;
use crate::auth::models::{Claims, UpdateUserRequest, User, UserRole};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::user_store::{UserPatch, UserStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates the user store, password hasher, and token codec.
///
/// Framework-free: handlers and middleware call into this, nothing here
/// knows about HTTP.
pub struct AuthService {
    store: Arc<UserStore>,
    jwt: Arc<JwtHandler>,
}

impl AuthService {
    pub fn new(store: Arc<UserStore>, jwt: Arc<JwtHandler>) -> Self {
        Self { store, jwt }
    }

    /// Register a new account with the default `user` role.
    ///
    /// Username is checked before email, so when both collide the caller
    /// sees the username conflict. A store-level unique-constraint hit
    /// (lost race) surfaces as the same duplicate error.
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.store.find_by_username(username)?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }
        if self.store.find_by_email(email)?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(password)?;
        let user = self
            .store
            .insert(username, email, &password_hash, UserRole::User)?;

        info!("✅ Registered user: {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown username and wrong password both produce
    /// `InvalidCredentials` - no username enumeration.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, i64, User), AuthError> {
        let user = match self.store.find_by_username(username)? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!("❌ Failed login attempt: {}", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let (token, expires_in) = self.jwt.generate_token(&user)?;
        info!("✅ Login successful: {} ({})", user.username, user.role.as_str());

        Ok((token, expires_in, user))
    }

    /// Issue a token for an already-authenticated user (post-registration)
    pub fn issue_token(&self, user: &User) -> Result<(String, i64), AuthError> {
        self.jwt.generate_token(user)
    }

    /// Apply a partial update. Present fields pass the same validation as
    /// registration; absent fields are left untouched. Role-change policy
    /// is the caller's responsibility (it needs the caller's claims).
    pub fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<User, AuthError> {
        if let Some(username) = update.username.as_deref() {
            validate_username(username)?;
        }
        if let Some(email) = update.email.as_deref() {
            validate_email(email)?;
        }
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = self.store.update(
            id,
            UserPatch {
                username: update.username,
                email: update.email,
                password_hash,
                role: update.role,
            },
        )?;

        info!("✏️  Updated user: {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Verify a token, wrapping the codec's specific failure reason
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt
            .validate_token(token)
            .map_err(AuthError::Unauthenticated)
    }

    /// Pure role check: the claim's role must be one of the allowed roles.
    ///
    /// Strict membership, no hierarchy - an `admin` is not implicitly a
    /// `super_admin` and vice versa. Each permission names the exact roles
    /// it accepts.
    pub fn authorize(claims: &Claims, allowed: &[UserRole]) -> bool {
        allowed.contains(&claims.role)
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(AuthError::InvalidInput(
            "Username must be 3-20 characters",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if !(6..=20).contains(&len) {
        return Err(AuthError::InvalidInput(
            "Password must be 6-20 characters",
        ));
    }
    Ok(())
}

/// Syntactic email check: non-empty local part, non-empty domain with a
/// dot, no whitespace.
fn validate_email(email: &str) -> Result<(), AuthError> {
    const MSG: &str = "Invalid email address";

    if email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidInput(MSG));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidInput(MSG));
    };
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.contains('@')
    {
        return Err(AuthError::InvalidInput(MSG));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_service() -> (AuthService, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(UserStore::new(temp_file.path().to_str().unwrap()).unwrap());
        let jwt = Arc::new(JwtHandler::new("test-secret-key-12345".to_string()));
        (AuthService::new(store, jwt), temp_file)
    }

    #[test]
    fn test_register_then_login_roundtrip() {
        let (service, _temp) = create_test_service();

        let user = service
            .register("alice", "a@x.com", "secret1")
            .unwrap();
        assert_eq!(user.role, UserRole::User);

        let (token, expires_in, logged_in) = service.login("alice", "secret1").unwrap();
        assert!(expires_in > 0);
        assert_eq!(logged_in.id, user.id);

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::User);
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let (service, _temp) = create_test_service();
        service.register("alice", "a@x.com", "secret1").unwrap();

        let err = service.login("alice", "wrong-password").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_unknown_user_is_same_invalid_credentials() {
        let (service, _temp) = create_test_service();

        // Same variant as a wrong password - no enumeration signal
        let err = service.login("ghost", "whatever").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_duplicate_username_detected_first() {
        let (service, _temp) = create_test_service();
        service.register("alice", "a@x.com", "secret1").unwrap();

        // Both username and email collide; username wins
        let err = service.register("alice", "a@x.com", "secret2").unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[test]
    fn test_duplicate_email_different_username() {
        let (service, _temp) = create_test_service();
        service.register("alice", "a@x.com", "secret1").unwrap();

        let err = service.register("bob", "a@x.com", "secret2").unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[test]
    fn test_input_validation() {
        let (service, _temp) = create_test_service();

        // Username too short / too long
        assert!(matches!(
            service.register("ab", "a@x.com", "secret1").unwrap_err(),
            AuthError::InvalidInput(_)
        ));
        assert!(matches!(
            service
                .register(&"x".repeat(21), "a@x.com", "secret1")
                .unwrap_err(),
            AuthError::InvalidInput(_)
        ));

        // Bad email syntax
        for email in ["", "nodomain", "a@b", "a@.com", "@x.com", "a b@x.com"] {
            assert!(
                matches!(
                    service.register("alice", email, "secret1").unwrap_err(),
                    AuthError::InvalidInput(_)
                ),
                "email {email:?} should be rejected"
            );
        }

        // Password too short
        assert!(matches!(
            service.register("alice", "a@x.com", "12345").unwrap_err(),
            AuthError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_update_validates_present_fields() {
        let (service, _temp) = create_test_service();
        let user = service.register("alice", "a@x.com", "secret1").unwrap();

        // Present fields must meet the same rules as registration
        let bad_username = UpdateUserRequest {
            username: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_user(user.id, bad_username).unwrap_err(),
            AuthError::InvalidInput(_)
        ));

        let bad_email = UpdateUserRequest {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_user(user.id, bad_email).unwrap_err(),
            AuthError::InvalidInput(_)
        ));

        let bad_password = UpdateUserRequest {
            password: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_user(user.id, bad_password).unwrap_err(),
            AuthError::InvalidInput(_)
        ));

        // Nothing was written by the rejected patches
        let reloaded = service
            .store
            .find_by_id(user.id)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.username, "alice");
        assert_eq!(reloaded.email, "a@x.com");

        // A valid patch still goes through, and the new password works
        let ok = UpdateUserRequest {
            email: Some("alice@new.com".to_string()),
            password: Some("secret2".to_string()),
            ..Default::default()
        };
        let updated = service.update_user(user.id, ok).unwrap();
        assert_eq!(updated.email, "alice@new.com");
        assert!(service.login("alice", "secret2").is_ok());
    }

    #[test]
    fn test_verify_token_wraps_codec_reason() {
        let (service, _temp) = create_test_service();

        let err = service.verify_token("garbage").unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unauthenticated(crate::auth::error::TokenError::Malformed)
        ));
    }

    #[test]
    fn test_authorize_strict_membership() {
        let claims = Claims {
            sub: 1,
            username: "alice".to_string(),
            role: UserRole::User,
            iat: 0,
            exp: 0,
        };

        assert!(AuthService::authorize(&claims, &[UserRole::User]));
        assert!(!AuthService::authorize(&claims, &[UserRole::Admin]));
        assert!(AuthService::authorize(
            &claims,
            &[UserRole::User, UserRole::Premium]
        ));

        // No hierarchy: admin does not satisfy a super_admin requirement
        let admin = Claims {
            role: UserRole::Admin,
            ..claims.clone()
        };
        assert!(!AuthService::authorize(&admin, &[UserRole::SuperAdmin]));

        let super_admin = Claims {
            role: UserRole::SuperAdmin,
            ..claims
        };
        assert!(AuthService::authorize(&super_admin, &[UserRole::SuperAdmin]));
        // ...and super_admin does not satisfy an admin-only requirement
        assert!(!AuthService::authorize(&super_admin, &[UserRole::Admin]));
    }

    #[test]
    fn test_full_scenario() {
        // register -> login -> verify -> authorize
        let (service, _temp) = create_test_service();

        service.register("alice", "a@x.com", "secret1").unwrap();
        let (token, _, _) = service.login("alice", "secret1").unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert!(!AuthService::authorize(&claims, &[UserRole::SuperAdmin]));
    }
}
