//! In-process fakes for the chain, price and notification seams.

#![allow(dead_code)]

use async_trait::async_trait;
use pool_sentinel::error::{WatchError, WatchResult};
use pool_sentinel::watcher::{ChainDataSource, Notifier, QuoteProvider, TokenBalanceMints, TokenSupply};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeChain {
    supplies: Mutex<HashMap<String, TokenSupply>>,
    holders: Mutex<HashMap<String, Vec<u64>>>,
    transactions: Mutex<HashMap<String, TokenBalanceMints>>,
    supply_lookups: AtomicUsize,
}

impl FakeChain {
    pub fn with_supply(self, mint: &str, amount: u64, decimals: u8) -> Self {
        self.set_supply(mint, amount, decimals);
        self
    }

    pub fn set_supply(&self, mint: &str, amount: u64, decimals: u8) {
        self.supplies
            .lock()
            .unwrap()
            .insert(mint.to_string(), TokenSupply { amount, decimals });
    }

    /// Number of `token_supply` calls so far, failed ones included.
    pub fn supply_lookups(&self) -> usize {
        self.supply_lookups.load(Ordering::SeqCst)
    }

    pub fn with_holders(self, mint: &str, amounts: Vec<u64>) -> Self {
        self.holders.lock().unwrap().insert(mint.to_string(), amounts);
        self
    }

    pub fn with_transaction(self, signature: &str, pre: &[&str], post: &[&str]) -> Self {
        self.transactions.lock().unwrap().insert(
            signature.to_string(),
            TokenBalanceMints {
                pre: pre.iter().map(|s| s.to_string()).collect(),
                post: post.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl ChainDataSource for FakeChain {
    async fn token_supply(&self, mint: &str) -> WatchResult<TokenSupply> {
        self.supply_lookups.fetch_add(1, Ordering::SeqCst);
        self.supplies
            .lock()
            .unwrap()
            .get(mint)
            .copied()
            .ok_or_else(|| WatchError::InvalidIdentifier(format!("no supply for {}", mint)))
    }

    async fn largest_holder_amounts(&self, mint: &str) -> WatchResult<Vec<u64>> {
        Ok(self.holders.lock().unwrap().get(mint).cloned().unwrap_or_default())
    }

    async fn transaction_token_mints(&self, signature: &str) -> WatchResult<Option<TokenBalanceMints>> {
        Ok(self.transactions.lock().unwrap().get(signature).cloned())
    }
}

#[derive(Default)]
pub struct FakeQuotes {
    prices: Mutex<HashMap<String, f64>>,
}

impl FakeQuotes {
    pub fn with_price(self, mint: &str, price: f64) -> Self {
        self.set_price(mint, price);
        self
    }

    pub fn set_price(&self, mint: &str, price: f64) {
        self.prices.lock().unwrap().insert(mint.to_string(), price);
    }
}

#[async_trait]
impl QuoteProvider for FakeQuotes {
    async fn price_usd(&self, mint: &str) -> WatchResult<Option<f64>> {
        Ok(self.prices.lock().unwrap().get(mint).copied())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}
