//! HTTP API layer for Folia
//!
//! Thin actix-web handlers over the service layer. Domain errors map to
//! HTTP responses through `AppError`'s `ResponseError` implementation.

pub mod handlers;
pub mod state;

pub use state::AppState;
