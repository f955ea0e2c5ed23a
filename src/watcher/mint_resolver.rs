//! Mint resolver.
//!
//! A freshly created pool surfaces a token balance for a mint that had no
//! balance before the transaction. Diffing the pre/post balance listings finds it.

use crate::types::Pubkey;
use crate::watcher::data_sources::{ChainDataSource, TokenBalanceMints};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// First mint in the post-balance listing that is absent from the pre-balance listing.
pub fn first_new_mint(balances: &TokenBalanceMints) -> Option<Pubkey> {
    let before: HashSet<&str> = balances.pre.iter().map(String::as_str).collect();
    balances
        .post
        .iter()
        .find(|mint| !before.contains(mint.as_str()))
        .cloned()
}

pub struct MintResolver {
    chain: Arc<dyn ChainDataSource>,
}

impl MintResolver {
    pub fn new(chain: Arc<dyn ChainDataSource>) -> Self {
        Self { chain }
    }

    /// Resolve the newly created mint of a transaction. Lookup failures count as "no mint".
    #[instrument(skip(self))]
    pub async fn resolve(&self, signature: &str) -> Option<Pubkey> {
        let balances = match self.chain.transaction_token_mints(signature).await {
            Ok(Some(balances)) => balances,
            Ok(None) => {
                debug!("Transaction {} not found or has no metadata", signature);
                return None;
            }
            Err(e) => {
                warn!("Failed to fetch transaction {}: {}", signature, e);
                return None;
            }
        };

        let mint = first_new_mint(&balances);
        if mint.is_none() {
            debug!("No new token balance surfaced in {}", signature);
        }
        mint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mints(pre: &[&str], post: &[&str]) -> TokenBalanceMints {
        TokenBalanceMints {
            pre: pre.iter().map(|m| m.to_string()).collect(),
            post: post.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_same_sets_yield_nothing() {
        assert_eq!(first_new_mint(&mints(&["USDC", "WSOL"], &["WSOL", "USDC"])), None);
        assert_eq!(first_new_mint(&mints(&[], &[])), None);
    }

    #[test]
    fn test_first_new_mint_in_post_order_wins() {
        let balances = mints(&["WSOL"], &["WSOL", "NEW_B", "NEW_A"]);
        assert_eq!(first_new_mint(&balances), Some("NEW_B".to_string()));
    }

    #[test]
    fn test_repeated_pre_entries_do_not_matter() {
        let balances = mints(&["WSOL", "WSOL", "USDC"], &["USDC", "WSOL", "MINT1", "MINT1"]);
        assert_eq!(first_new_mint(&balances), Some("MINT1".to_string()));
    }
}
