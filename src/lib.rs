//! Gatekeeper Backend Library
//!
//! Exposes the auth core and supporting modules for use by the server
//! binary and the integration tests.

pub mod auth;
pub mod config;
pub mod middleware;
