//! Domain models for Folia
//!
//! This module contains all the core domain models used throughout the application.

pub mod adjustment;
pub mod balance;
pub mod transaction;

pub use adjustment::{AdminAdjustment, NewAdjustment};
pub use balance::{AccountPlan, CreditBalance, CreditPool};
pub use transaction::{CreditTransaction, NewTransaction, TransactionKind};
