//! Core types and data structures for the pool-sentinel watcher.

use serde::{Deserialize, Serialize};

/// A simple public key representation (base58 string as it appears on the wire)
pub type Pubkey = String;

/// Placeholder used for display fields we cannot resolve.
pub const UNKNOWN_DISPLAY: &str = "unknown";

/// One admitted token as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The mint address of the token (primary key)
    pub mint: Pubkey,
    /// Best-effort ticker symbol
    pub symbol: String,
    /// Best-effort display name
    pub name: String,
    /// Market cap in USD captured at admission time
    pub initial_market_cap_usd: f64,
    /// Highest whole-number multiple already notified
    pub last_multiple: i64,
}

impl TokenRecord {
    /// Whether the baseline is usable for multiplier evaluation.
    pub fn has_valid_baseline(&self) -> bool {
        self.initial_market_cap_usd > 0.0
    }
}

/// A pool-creation event that carried a transaction signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolCandidate {
    /// Signature of the transaction that emitted the creation log
    pub signature: String,
    /// The log line that matched a creation keyword
    pub matched_line: String,
    /// Slot the notification was observed at, when the node reported one
    pub slot: Option<u64>,
}

/// A mint that passed every admission gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmittedToken {
    pub mint: Pubkey,
    pub market_cap_usd: f64,
    pub top10_percent: f64,
}
