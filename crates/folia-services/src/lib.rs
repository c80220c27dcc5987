//! Business logic services for Folia
//!
//! This crate contains the services that orchestrate the credit ledger
//! operations against the persisted collections.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service works against the repository traits, never a concrete store
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - Every balance mutation runs under a per-professional lock from a shared
//!   [`UserLocks`] registry, closing the check-then-act races
//! - All operations are instrumented with tracing and emit one audit event
//!
//! # Services
//!
//! - [`CreditService`] - reservation/consumption/release lifecycle of a
//!   billable clinical session
//! - [`AdjustmentService`] - administrator top-ups under the shared monthly
//!   quota
//! - [`FolioSequence`] - human-readable record numbers per clinic scope

pub mod adjustments;
pub mod audit;
pub mod credits;
pub mod folio;
pub mod locks;

pub use adjustments::{AdjustmentService, GrantOutcome, GrantRequest};
pub use credits::{ConsumeOutcome, CreditService, ReleaseOutcome, ReserveOutcome};
pub use folio::FolioSequence;
pub use locks::UserLocks;
