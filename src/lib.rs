//! pool-sentinel - Solana liquidity pool watcher
//!
//! Detects newly created pools from program logs, admits the freshly minted
//! token when its market cap and holder concentration pass the configured
//! gates, and keeps announcing whole-number growth multiples of every admitted
//! token against its admission baseline.

pub mod types;
pub mod error;
pub mod config;
pub mod storage;
pub mod watcher;
pub mod health;

// Re-export main types for convenience
pub use config::{WatcherConfig, WatcherConfigBuilder, AdmissionThresholds, ProgramRef};
pub use error::{WatchError, WatchResult};
pub use types::{TokenRecord, PoolCandidate, AdmittedToken};
