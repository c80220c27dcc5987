//! Persistence layer for Folia
//!
//! The ledger core operates against a single shared persisted store laid out
//! as independent keyed collections: balances by professional, the
//! append-only transaction sequence, the bounded adjustment sequence, and
//! the folio counters.
//!
//! Each repository caches its collection in memory behind its own lock and
//! writes the serialized document through to a [`backend::StorageBackend`]
//! on every mutation. Unreadable stored documents self-heal to empty;
//! capacity-exceeded writes on the adjustment log retry once after
//! truncation.

pub mod adjustments;
pub mod backend;
pub mod balances;
pub mod folios;
pub mod ledger;

pub use adjustments::PersistentAdjustmentLog;
pub use backend::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use balances::PersistentBalanceStore;
pub use folios::PersistentFolioCounters;
pub use ledger::PersistentTransactionLedger;
