//! Storage module - durable token ledger
//!
//! The [`TokenLedger`] trait is the only way the watcher touches persisted
//! state; [`SqliteTokenLedger`] is the production backend.

pub mod ledger;
pub mod sqlite_ledger;

pub use ledger::{TokenLedger, UpsertOutcome};
pub use sqlite_ledger::SqliteTokenLedger;
