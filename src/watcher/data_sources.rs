//! Data sources for on-chain and off-chain token information.
//!
//! Two seams: [`ChainDataSource`] answers supply, holder and transaction
//! queries over Solana JSON-RPC, and [`QuoteProvider`] answers spot prices in
//! USD. Both are traits so the pipeline can run against in-process fakes.

use crate::config::WatcherConfig;
use crate::error::{WatchError, WatchResult};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey as SolanaPubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::{UiTransactionEncoding, UiTransactionTokenBalance};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, instrument, warn};

const PRICE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const QUOTE_PRICE_TTL: Duration = Duration::from_secs(60);
const PRICE_RETRY_ATTEMPTS: usize = 3;

/// Raw total supply of a mint and its decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSupply {
    pub amount: u64,
    pub decimals: u8,
}

/// Token-balance mints of a transaction, in the order the node listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBalanceMints {
    pub pre: Vec<String>,
    pub post: Vec<String>,
}

#[async_trait]
pub trait ChainDataSource: Send + Sync {
    async fn token_supply(&self, mint: &str) -> WatchResult<TokenSupply>;

    /// Raw balances of the largest holder accounts, largest first.
    async fn largest_holder_amounts(&self, mint: &str) -> WatchResult<Vec<u64>>;

    /// `Ok(None)` when the transaction is unknown or carries no status metadata.
    async fn transaction_token_mints(&self, signature: &str) -> WatchResult<Option<TokenBalanceMints>>;
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Spot price in USD. `Ok(None)` when the provider has no price for the mint.
    async fn price_usd(&self, mint: &str) -> WatchResult<Option<f64>>;
}

fn parse_pubkey(value: &str) -> WatchResult<SolanaPubkey> {
    SolanaPubkey::from_str(value).map_err(|_| WatchError::InvalidIdentifier(value.to_string()))
}

fn parse_raw_amount(value: &str) -> WatchResult<u64> {
    value
        .parse::<u64>()
        .map_err(|_| WatchError::Decode(format!("token amount '{}' is not an integer", value)))
}

fn balance_mints(balances: Option<Vec<UiTransactionTokenBalance>>) -> Vec<String> {
    balances
        .unwrap_or_default()
        .into_iter()
        .map(|balance| balance.mint)
        .collect()
}

/// Solana JSON-RPC backed chain data, throttled by a direct rate limiter.
pub struct RpcChainData {
    client: RpcClient,
    limiter: DefaultDirectRateLimiter,
}

impl RpcChainData {
    pub fn new(endpoint: String, timeout: Duration, requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            client: RpcClient::new_with_timeout(endpoint, timeout),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new(
            config.resolved_rpc(),
            config.rpc_timeout(),
            config.rpc_requests_per_second,
        )
    }

    async fn throttle(&self) {
        self.limiter.until_ready().await;
    }
}

#[async_trait]
impl ChainDataSource for RpcChainData {
    #[instrument(skip(self))]
    async fn token_supply(&self, mint: &str) -> WatchResult<TokenSupply> {
        let pubkey = parse_pubkey(mint)?;
        self.throttle().await;

        let supply = self.client.get_token_supply(&pubkey).await?;
        debug!("Supply for {}: {} ({} decimals)", mint, supply.amount, supply.decimals);

        Ok(TokenSupply {
            amount: parse_raw_amount(&supply.amount)?,
            decimals: supply.decimals,
        })
    }

    #[instrument(skip(self))]
    async fn largest_holder_amounts(&self, mint: &str) -> WatchResult<Vec<u64>> {
        let pubkey = parse_pubkey(mint)?;
        self.throttle().await;

        let accounts = self.client.get_token_largest_accounts(&pubkey).await?;
        accounts
            .iter()
            .map(|account| parse_raw_amount(&account.amount.amount))
            .collect()
    }

    #[instrument(skip(self))]
    async fn transaction_token_mints(&self, signature: &str) -> WatchResult<Option<TokenBalanceMints>> {
        let signature = Signature::from_str(signature)
            .map_err(|_| WatchError::InvalidIdentifier(signature.to_string()))?;
        self.throttle().await;

        let tx = self
            .client
            .get_transaction_with_config(
                &signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Json),
                    commitment: Some(CommitmentConfig::confirmed()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await?;

        let Some(meta) = tx.transaction.meta else {
            debug!("Transaction {} has no status metadata", signature);
            return Ok(None);
        };

        Ok(Some(TokenBalanceMints {
            pre: balance_mints(meta.pre_token_balances.into()),
            post: balance_mints(meta.post_token_balances.into()),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: HashMap<String, PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    #[serde(default)]
    price: Option<f64>,
}

/// Spot prices from the Jupiter price API, converted to USD through the quote currency.
pub struct JupiterQuoteProvider {
    http_client: Client,
    base_url: String,
    quote_token: String,
    quote_prices: Cache<String, f64>,
}

impl JupiterQuoteProvider {
    pub fn new(http_client: Client, base_url: String, quote_token: String) -> Self {
        Self {
            http_client,
            base_url,
            quote_token: quote_token.to_uppercase(),
            quote_prices: Cache::builder()
                .max_capacity(16)
                .time_to_live(QUOTE_PRICE_TTL)
                .build(),
        }
    }

    pub fn from_config(http_client: Client, config: &WatcherConfig) -> Self {
        Self::new(http_client, config.price_api_url.clone(), config.quote_token.clone())
    }

    /// One price lookup. Non-success statuses and missing entries are `Ok(None)`.
    async fn fetch_price(&self, id: &str, vs_token: Option<&str>) -> WatchResult<Option<f64>> {
        let mut query = vec![("ids", id)];
        if let Some(vs) = vs_token {
            query.push(("vsToken", vs));
        }

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&query)
            .timeout(PRICE_REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Price API returned {} for {}", response.status(), id);
            return Ok(None);
        }

        let body: PriceResponse = response.json().await?;
        Ok(body
            .data
            .get(id)
            .and_then(|entry| entry.price)
            .filter(|price| *price > 0.0))
    }

    async fn fetch_price_with_retries(&self, id: &str, vs_token: Option<&str>) -> WatchResult<Option<f64>> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(2))
            .take(PRICE_RETRY_ATTEMPTS);

        Retry::spawn(retry_strategy, || self.fetch_price(id, vs_token)).await
    }

    /// USD value of one unit of the quote currency. Unknown quotes and failed lookups count as 1.0.
    async fn quote_usd(&self) -> f64 {
        match self.quote_token.as_str() {
            "USDC" => 1.0,
            "SOL" => {
                if let Some(cached) = self.quote_prices.get(&self.quote_token).await {
                    return cached;
                }
                match self.fetch_price_with_retries("SOL", None).await {
                    Ok(Some(price)) => {
                        self.quote_prices.insert(self.quote_token.clone(), price).await;
                        price
                    }
                    Ok(None) => 1.0,
                    Err(e) => {
                        warn!("SOL quote price lookup failed, assuming 1.0: {}", e);
                        1.0
                    }
                }
            }
            _ => 1.0,
        }
    }
}

#[async_trait]
impl QuoteProvider for JupiterQuoteProvider {
    #[instrument(skip(self))]
    async fn price_usd(&self, mint: &str) -> WatchResult<Option<f64>> {
        let Some(price) = self
            .fetch_price_with_retries(mint, Some(&self.quote_token))
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(price * self.quote_usd().await))
    }
}
