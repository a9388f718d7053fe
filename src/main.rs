//! Gatekeeper - JWT Authentication Service
//! Mission: Registration, login, stateless token verification, and
//! role-gated user management over SQLite

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Json, Router,
};
use dotenv::dotenv;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatekeeper_backend::{
    auth::{api as auth_api, auth_middleware, AuthService, AuthState, JwtHandler, UserStore},
    config::Config,
    middleware::request_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🔐 Gatekeeper Auth Service starting");

    let config = Config::from_env();

    let user_store =
        Arc::new(UserStore::new(&config.db_path).context("Failed to open user store")?);
    let jwt_handler = Arc::new(JwtHandler::with_ttl(
        config.jwt_secret.clone(),
        config.jwt_ttl_secs,
    ));
    let service = Arc::new(AuthService::new(user_store.clone(), jwt_handler));
    let auth_state = AuthState::new(user_store, service.clone());

    info!("📊 User store initialized at: {}", config.db_path);

    // Public routes: health + authentication entry points
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth_api::register))
        .route("/auth/login", post(auth_api::login))
        .route("/auth/validate", post(auth_api::validate))
        .with_state(auth_state.clone());

    // Protected routes behind the bearer-token guard
    let protected_routes = Router::new()
        .route("/auth/me", get(auth_api::get_current_user))
        .route(
            "/users",
            get(auth_api::list_users).post(auth_api::create_user),
        )
        .route(
            "/users/:id",
            get(auth_api::get_user)
                .patch(auth_api::update_user)
                .delete(auth_api::delete_user),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            service,
            auth_middleware,
        ))
        .with_state(auth_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate directory (common when running with --manifest-path
    // from elsewhere)
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
