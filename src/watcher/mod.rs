//! Watcher module - pool discovery and multiplier tracking
//!
//! Discovery path: [`LogsSubscription`] → [`pool_filter`] → [`MintResolver`] →
//! [`AdmissionEvaluator`] → ledger + [`Notifier`], driven by [`DiscoveryPipeline`].
//! Tracking path: [`MultiplierScanner`] sweeping the ledger on a timer.

pub mod types;
pub mod pool_filter;
pub mod event_source;
pub mod data_sources;
pub mod mint_resolver;
pub mod admission;
pub mod notifier;
pub mod discovery;
pub mod scanner;

// Re-export main types
pub use types::{
    AdmissionDecision, PoolDecision, RawLogEvent, SkipReason, SweepReport,
    RawLogEventSender, RawLogEventReceiver,
};

// Re-export key components
pub use admission::{AdmissionEvaluator, compute_market_cap, top_holders_percent};
pub use data_sources::{
    ChainDataSource, QuoteProvider, RpcChainData, JupiterQuoteProvider, TokenSupply, TokenBalanceMints,
};
pub use discovery::{DiscoveryPipeline, DiscoveryOutcome};
pub use event_source::LogsSubscription;
pub use mint_resolver::MintResolver;
pub use notifier::{Notifier, NoopNotifier, TelegramNotifier, notifier_from_config};
pub use scanner::{MultiplierScanner, reached_milestone};
