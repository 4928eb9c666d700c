//! Vidora API library crate.
//!
//! Everything lives here so integration tests can exercise the services and
//! handlers; `main.rs` is a thin wrapper around [`setup::initialize_app`].

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

/// Versioned API prefix for all routes.
pub const API_PREFIX: &str = "/api/v1";
