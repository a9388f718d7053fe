//! Authentication Module
//! Mission: Credential verification, JWT issuance, and role-gated access

pub mod api;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use error::{AuthError, TokenError};
pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use service::AuthService;
pub use user_store::UserStore;
