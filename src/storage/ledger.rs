//! Storage contract for admitted tokens.
//!
//! The discovery path writes through [`TokenLedger::upsert`]; the multiplier
//! scanner reads batches and advances `last_multiple`. Both share a single
//! implementation concurrently, so implementations serialize access internally.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::TokenRecord;

/// What an upsert did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The mint was unknown and a fresh record was created
    Inserted,
    /// The mint already existed; only display fields were refreshed
    DisplayUpdated,
}

/// Formal contract for the durable token ledger.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Insert a new record, or refresh `symbol`/`name` of an existing one.
    /// The baseline market cap and `last_multiple` of an existing record are never touched.
    async fn upsert(
        &self,
        mint: &str,
        symbol: &str,
        name: &str,
        initial_market_cap_usd: f64,
    ) -> Result<UpsertOutcome>;

    /// Unconditionally overwrite `last_multiple`. Callers enforce monotonicity.
    async fn set_last_multiple(&self, mint: &str, multiple: i64) -> Result<()>;

    async fn get(&self, mint: &str) -> Result<Option<TokenRecord>>;

    /// Every record, ordered by mint.
    async fn list_all(&self) -> Result<Vec<TokenRecord>>;

    /// Up to `limit` records with a mint strictly greater than `after_mint`, ordered by mint.
    async fn list_batch(&self, after_mint: Option<&str>, limit: u32) -> Result<Vec<TokenRecord>>;

    /// Most recently inserted records first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<TokenRecord>>;

    async fn count(&self) -> Result<i64>;

    async fn health_check(&self) -> Result<bool>;
}
