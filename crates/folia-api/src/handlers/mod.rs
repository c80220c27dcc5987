//! HTTP handlers
//!
//! One module per resource, each exposing a `configure` function wired into
//! the server's route table.

pub mod adjustments;
pub mod credits;
pub mod folios;

pub use adjustments::configure as configure_adjustments;
pub use credits::configure as configure_credits;
pub use folios::configure as configure_folios;
