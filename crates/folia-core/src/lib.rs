//! Folia Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Folia clinical credit ledger. It includes:
//!
//! - Domain models (CreditBalance, CreditTransaction, AdminAdjustment)
//! - Repository traits for the persisted collections
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
