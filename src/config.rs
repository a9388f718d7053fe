//! Service configuration
//! Mission: Collect environment settings once, pass them explicitly

use crate::auth::jwt::DEFAULT_TTL_SECS;
use std::env;
use tracing::warn;

/// Explicit configuration passed into constructors at startup.
/// No ambient globals: the signing secret lives here and in the
/// `JwtHandler` built from it, nowhere else.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: String,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_path = env::var("AUTH_DB_PATH").unwrap_or_else(|_| "gatekeeper_auth.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("⚠️  JWT_SECRET not set - using development default");
            "dev-secret-change-in-production-minimum-32-characters".to_string()
        });

        let jwt_ttl_secs = env::var("JWT_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_TTL_SECS);

        Self {
            bind_addr,
            db_path,
            jwt_secret,
            jwt_ttl_secs,
        }
    }
}
