//! Types flowing through the discovery pipeline and the multiplier scanner.

use crate::types::{AdmittedToken, PoolCandidate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `logsNotification` as delivered by the subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLogEvent {
    /// Transaction signature, when the node included one
    pub signature: Option<String>,
    /// Program log lines emitted by the transaction
    pub logs: Vec<String>,
    /// Slot from the notification context
    pub slot: Option<u64>,
    /// Local receive time in unix millis
    pub received_at: u64,
}

impl RawLogEvent {
    pub fn new(signature: Option<String>, logs: Vec<String>) -> Self {
        Self {
            signature,
            logs,
            slot: None,
            received_at: chrono::Utc::now().timestamp_millis() as u64,
        }
    }
}

/// Verdict of the pool event filter.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolDecision {
    Creation(PoolCandidate),
    /// A creation keyword matched but the event had no signature to follow up on
    MissingSignature,
    NotPoolEvent,
}

/// Why a candidate mint was not admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoPrice,
    MarketCapBelowMinimum { market_cap_usd: f64, minimum: f64 },
    ConcentrationAboveMaximum { top10_percent: f64, maximum: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoPrice => write!(f, "no usable price"),
            SkipReason::MarketCapBelowMinimum { market_cap_usd, minimum } => {
                write!(f, "market cap ${:.2} below minimum ${:.2}", market_cap_usd, minimum)
            }
            SkipReason::ConcentrationAboveMaximum { top10_percent, maximum } => {
                write!(f, "top-10 holders {:.2}% above maximum {:.2}%", top10_percent, maximum)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Admitted(AdmittedToken),
    Rejected(SkipReason),
}

/// Summary of one scanner sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub records_seen: usize,
    pub skipped_invalid_baseline: usize,
    pub skipped_no_price: usize,
    pub milestones_notified: usize,
}

pub type RawLogEventSender = tokio::sync::mpsc::Sender<RawLogEvent>;
pub type RawLogEventReceiver = tokio::sync::mpsc::Receiver<RawLogEvent>;
