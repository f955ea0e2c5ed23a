//! Discovery pipeline.
//!
//! Consumes raw log events one at a time: filter, resolve the new mint, run
//! admission, record the baseline and announce it. A failure on one event is
//! logged and the loop moves on to the next.

use crate::error::{WatchError, WatchResult};
use crate::storage::{TokenLedger, UpsertOutcome};
use crate::types::{AdmittedToken, Pubkey, UNKNOWN_DISPLAY};
use crate::watcher::admission::AdmissionEvaluator;
use crate::watcher::mint_resolver::MintResolver;
use crate::watcher::notifier::{format_admission_message, Notifier};
use crate::watcher::pool_filter;
use crate::watcher::types::{AdmissionDecision, PoolDecision, RawLogEvent, RawLogEventReceiver, SkipReason};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one event.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    NotPoolEvent,
    MissingSignature,
    NoMint,
    Rejected { mint: Pubkey, reason: SkipReason },
    /// Passed admission; `upsert` says whether the mint was new to the ledger
    Admitted { token: AdmittedToken, upsert: UpsertOutcome },
}

pub struct DiscoveryPipeline {
    resolver: MintResolver,
    evaluator: AdmissionEvaluator,
    ledger: Arc<dyn TokenLedger>,
    notifier: Arc<dyn Notifier>,
}

impl DiscoveryPipeline {
    pub fn new(
        resolver: MintResolver,
        evaluator: AdmissionEvaluator,
        ledger: Arc<dyn TokenLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            evaluator,
            ledger,
            notifier,
        }
    }

    /// Main execution loop - runs until the event channel closes.
    pub async fn run(&self, mut events: RawLogEventReceiver) {
        info!("DiscoveryPipeline is running...");

        while let Some(event) = events.recv().await {
            match self.process_event(&event).await {
                Ok(DiscoveryOutcome::Admitted { token, upsert: UpsertOutcome::Inserted }) => {
                    info!("Admitted {} (mc=${:.2}, top10={:.2}%)", token.mint, token.market_cap_usd, token.top10_percent);
                }
                Ok(DiscoveryOutcome::Rejected { mint, reason }) => {
                    debug!("Rejected {}: {}", mint, reason);
                }
                Ok(outcome) => debug!("Event outcome: {:?}", outcome),
                Err(e) if e.is_transient() => warn!("Skipping event {:?}: {}", event.signature, e),
                Err(e) => error!("Dropping event {:?}: {}", event.signature, e),
            }
        }

        info!("Event channel closed. DiscoveryPipeline shutting down.");
    }

    pub async fn process_event(&self, event: &RawLogEvent) -> WatchResult<DiscoveryOutcome> {
        match pool_filter::classify(event) {
            PoolDecision::Creation(candidate) => {
                debug!("Pool creation candidate {} ({})", candidate.signature, candidate.matched_line);
                self.process_signature(&candidate.signature).await
            }
            PoolDecision::MissingSignature => Ok(DiscoveryOutcome::MissingSignature),
            PoolDecision::NotPoolEvent => Ok(DiscoveryOutcome::NotPoolEvent),
        }
    }

    /// Resolve, admit, record and announce the mint created by `signature`.
    /// The admission alert goes out only when the mint is new to the ledger.
    #[instrument(skip(self))]
    pub async fn process_signature(&self, signature: &str) -> WatchResult<DiscoveryOutcome> {
        let Some(mint) = self.resolver.resolve(signature).await else {
            return Ok(DiscoveryOutcome::NoMint);
        };

        let token = match self.evaluator.evaluate(&mint).await? {
            AdmissionDecision::Admitted(token) => token,
            AdmissionDecision::Rejected(reason) => {
                return Ok(DiscoveryOutcome::Rejected { mint, reason });
            }
        };

        let upsert = self
            .ledger
            .upsert(&token.mint, UNKNOWN_DISPLAY, UNKNOWN_DISPLAY, token.market_cap_usd)
            .await
            .map_err(WatchError::storage)?;

        match upsert {
            UpsertOutcome::Inserted => {
                self.notifier.notify(&format_admission_message(&token)).await;
            }
            UpsertOutcome::DisplayUpdated => {
                debug!("{} already tracked; baseline kept", token.mint);
            }
        }

        Ok(DiscoveryOutcome::Admitted { token, upsert })
    }
}
