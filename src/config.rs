//! Watcher configuration.
//!
//! Built once at startup (from the environment, or programmatically through
//! [`WatcherConfigBuilder`]) and handed to each component's constructor. Nothing
//! downstream reads process state directly.

use crate::error::{WatchError, WatchResult};
use crate::types::Pubkey;
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PROGRAMS: &str = "raydium_amm:675kPX9MHTjS2zt1qfr1nyH7r7YG1JYHFeq9gS4j1h4,raydium_clmm:CAMMCzo5v5wzjMNk1E1vDLz8Y1gcF5sBf7bYkq7V88Y";
pub const DEFAULT_PYTH_SOL_USD: &str = "J83w4HKfqxwcq3BEMMkPFSppX3gqekLyLJBexebFVkix";
pub const PUBLIC_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const PUBLIC_WS_URL: &str = "wss://api.mainnet-beta.solana.com";

/// A program whose logs we subscribe to, parsed from `name:identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRef {
    pub name: String,
    pub program_id: Pubkey,
}

/// Admission gates. Values equal to a threshold pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdmissionThresholds {
    pub min_market_cap_usd: f64,
    pub max_top10_holder_percent: f64,
}

impl Default for AdmissionThresholds {
    fn default() -> Self {
        Self {
            min_market_cap_usd: 15_000.0,
            max_top10_holder_percent: 20.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Helius API key, used to derive endpoints when explicit URLs are absent
    pub helius_api_key: Option<String>,
    /// Explicit RPC endpoint
    pub rpc_url: Option<String>,
    /// Explicit websocket endpoint
    pub ws_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Quote currency prices are expressed in (upper-cased)
    pub quote_token: String,
    pub thresholds: AdmissionThresholds,
    /// Programs whose log streams are subscribed
    pub programs: NonEmpty<ProgramRef>,
    /// Reference SOL/USD oracle account. Carried for completeness; no component reads it yet.
    pub pyth_sol_usd_account: Pubkey,
    pub database_path: String,
    pub http_listen: String,
    pub scan_interval_seconds: u64,
    pub scan_batch_size: u32,
    pub rpc_timeout_seconds: u64,
    pub notify_timeout_seconds: u64,
    pub rpc_requests_per_second: u32,
    pub event_channel_capacity: usize,
    pub price_api_url: String,
    pub logs_commitment: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            helius_api_key: None,
            rpc_url: None,
            ws_url: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
            quote_token: "USDC".to_string(),
            thresholds: AdmissionThresholds::default(),
            programs: default_programs(),
            pyth_sol_usd_account: DEFAULT_PYTH_SOL_USD.to_string(),
            database_path: "data.db".to_string(),
            http_listen: "0.0.0.0:10000".to_string(),
            scan_interval_seconds: 45,
            scan_batch_size: 200,
            rpc_timeout_seconds: 20,
            notify_timeout_seconds: 10,
            rpc_requests_per_second: 10,
            event_channel_capacity: 1024,
            price_api_url: "https://price.jup.ag/v4/price".to_string(),
            logs_commitment: "finalized".to_string(),
        }
    }
}

impl WatcherConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> WatchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> WatchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let programs_raw = get("RAYDIUM_PROGRAMS").unwrap_or_else(|| DEFAULT_PROGRAMS.to_string());
        let programs = NonEmpty::from_vec(parse_programs(&programs_raw)).ok_or_else(|| {
            WatchError::Config(format!("no usable 'name:identifier' entries in '{}'", programs_raw))
        })?;

        Ok(Self {
            helius_api_key: get("HELIUS_API_KEY"),
            rpc_url: get("SOLANA_RPC_URL"),
            ws_url: get("SOLANA_WS_URL"),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            quote_token: get("QUOTE_TOKEN")
                .map(|q| q.to_uppercase())
                .unwrap_or(defaults.quote_token),
            thresholds: AdmissionThresholds {
                min_market_cap_usd: parse_or("MIN_MARKET_CAP_USD", get("MIN_MARKET_CAP_USD"), defaults.thresholds.min_market_cap_usd),
                max_top10_holder_percent: parse_or("MAX_TOP10_HOLDER_PERCENT", get("MAX_TOP10_HOLDER_PERCENT"), defaults.thresholds.max_top10_holder_percent),
            },
            programs,
            pyth_sol_usd_account: get("PYTH_SOL_USD").unwrap_or(defaults.pyth_sol_usd_account),
            database_path: get("DATABASE_PATH").unwrap_or(defaults.database_path),
            http_listen: get("HTTP_LISTEN").unwrap_or(defaults.http_listen),
            scan_interval_seconds: parse_or("SCAN_INTERVAL_SECS", get("SCAN_INTERVAL_SECS"), defaults.scan_interval_seconds),
            scan_batch_size: parse_or("SCAN_BATCH_SIZE", get("SCAN_BATCH_SIZE"), defaults.scan_batch_size),
            rpc_timeout_seconds: parse_or("RPC_TIMEOUT_SECS", get("RPC_TIMEOUT_SECS"), defaults.rpc_timeout_seconds),
            notify_timeout_seconds: parse_or("NOTIFY_TIMEOUT_SECS", get("NOTIFY_TIMEOUT_SECS"), defaults.notify_timeout_seconds),
            rpc_requests_per_second: parse_or("RPC_REQUESTS_PER_SECOND", get("RPC_REQUESTS_PER_SECOND"), defaults.rpc_requests_per_second),
            event_channel_capacity: parse_or("EVENT_CHANNEL_CAPACITY", get("EVENT_CHANNEL_CAPACITY"), defaults.event_channel_capacity),
            price_api_url: get("PRICE_API_URL").unwrap_or(defaults.price_api_url),
            logs_commitment: get("LOGS_COMMITMENT").unwrap_or(defaults.logs_commitment),
        })
    }

    /// RPC endpoint: explicit URL, then Helius, then the public endpoint.
    pub fn resolved_rpc(&self) -> String {
        if let Some(url) = &self.rpc_url {
            return url.clone();
        }
        if let Some(key) = &self.helius_api_key {
            return format!("https://mainnet.helius-rpc.com/?api-key={}", key);
        }
        PUBLIC_RPC_URL.to_string()
    }

    /// Websocket endpoint: explicit URL, then Helius, then the public endpoint.
    pub fn resolved_ws(&self) -> String {
        if let Some(url) = &self.ws_url {
            return url.clone();
        }
        if let Some(key) = &self.helius_api_key {
            return format!("wss://mainnet.helius-rpc.com/?api-key={}", key);
        }
        PUBLIC_WS_URL.to_string()
    }

    /// Bot token and chat id, only when both are present.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat)) => Some((token.as_str(), chat.as_str())),
            _ => None,
        }
    }

    pub fn program_ids(&self) -> Vec<Pubkey> {
        self.programs.iter().map(|p| p.program_id.clone()).collect()
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_seconds)
    }
}

fn default_programs() -> NonEmpty<ProgramRef> {
    // DEFAULT_PROGRAMS always yields at least one entry
    NonEmpty::from_vec(parse_programs(DEFAULT_PROGRAMS)).unwrap_or_else(|| {
        NonEmpty::new(ProgramRef {
            name: "raydium_amm".to_string(),
            program_id: "675kPX9MHTjS2zt1qfr1nyH7r7YG1JYHFeq9gS4j1h4".to_string(),
        })
    })
}

/// Parse `name:identifier` pairs separated by commas. Entries without a colon
/// or with an empty identifier are ignored.
pub fn parse_programs(raw: &str) -> Vec<ProgramRef> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, id) = entry.trim().split_once(':')?;
            let id = id.trim();
            if id.is_empty() {
                return None;
            }
            Some(ProgramRef {
                name: name.trim().to_string(),
                program_id: id.to_string(),
            })
        })
        .collect()
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed value '{}' for {}", value, key);
            default
        }),
        None => default,
    }
}

/// Builder for programmatic construction with sensible defaults.
pub struct WatcherConfigBuilder {
    config: WatcherConfig,
}

impl WatcherConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: WatcherConfig::default(),
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = Some(url.into());
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.config.ws_url = Some(url.into());
        self
    }

    pub fn with_thresholds(mut self, min_market_cap_usd: f64, max_top10_holder_percent: f64) -> Self {
        self.config.thresholds = AdmissionThresholds {
            min_market_cap_usd,
            max_top10_holder_percent,
        };
        self
    }

    pub fn with_quote_token(mut self, quote: impl Into<String>) -> Self {
        self.config.quote_token = quote.into().to_uppercase();
        self
    }

    pub fn with_telegram(mut self, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        self.config.telegram_bot_token = Some(bot_token.into());
        self.config.telegram_chat_id = Some(chat_id.into());
        self
    }

    pub fn with_programs(mut self, programs: NonEmpty<ProgramRef>) -> Self {
        self.config.programs = programs;
        self
    }

    /// Set the sweep interval and the ledger batch size used per read.
    pub fn with_scan(mut self, interval_seconds: u64, batch_size: u32) -> Self {
        self.config.scan_interval_seconds = interval_seconds;
        self.config.scan_batch_size = batch_size;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn build(self) -> WatcherConfig {
        self.config
    }
}

impl Default for WatcherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
