//! MultiplierScanner - periodic sweep over the token ledger
//!
//! Each sweep compares every token's current market cap with its admission
//! baseline and announces new whole-number multiples. Sweeps run back to back
//! with a fixed sleep in between; a failed sweep is logged and retried after
//! the same sleep.

use crate::error::{WatchError, WatchResult};
use crate::storage::TokenLedger;
use crate::types::TokenRecord;
use crate::watcher::admission::market_cap_for;
use crate::watcher::data_sources::{ChainDataSource, QuoteProvider};
use crate::watcher::notifier::{format_milestone_message, Notifier};
use crate::watcher::types::SweepReport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The multiple to announce, if any.
///
/// The first milestone is always 2x. A token that jumps several multiples
/// between sweeps yields only the highest one.
pub fn reached_milestone(initial_market_cap_usd: f64, last_multiple: i64, current_market_cap_usd: f64) -> Option<i64> {
    if initial_market_cap_usd <= 0.0 {
        return None;
    }

    let ratio = current_market_cap_usd / initial_market_cap_usd;
    let target = last_multiple.saturating_add(1).max(2);
    let hit = ratio.floor() as i64;

    (hit >= target).then_some(hit)
}

pub struct MultiplierScanner {
    ledger: Arc<dyn TokenLedger>,
    chain: Arc<dyn ChainDataSource>,
    quotes: Arc<dyn QuoteProvider>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    batch_size: u32,
}

impl MultiplierScanner {
    pub fn new(
        ledger: Arc<dyn TokenLedger>,
        chain: Arc<dyn ChainDataSource>,
        quotes: Arc<dyn QuoteProvider>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            ledger,
            chain,
            quotes,
            notifier,
            interval,
            batch_size: batch_size.max(1),
        }
    }

    /// Main execution loop - never returns.
    pub async fn run(self) {
        info!("MultiplierScanner is running. Sweep every {:?}, batch size {}.", self.interval, self.batch_size);

        loop {
            match self.sweep().await {
                Ok(report) => info!(
                    "Sweep complete: {} records, {} milestones, {} without price, {} invalid baseline",
                    report.records_seen,
                    report.milestones_notified,
                    report.skipped_no_price,
                    report.skipped_invalid_baseline
                ),
                Err(e) => warn!("Sweep aborted: {}", e),
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass over the whole ledger, read in batches.
    pub async fn sweep(&self) -> WatchResult<SweepReport> {
        let mut report = SweepReport::default();
        let mut after: Option<String> = None;

        loop {
            let batch = self
                .ledger
                .list_batch(after.as_deref(), self.batch_size)
                .await
                .map_err(WatchError::storage)?;

            for record in &batch {
                self.evaluate_record(record, &mut report).await?;
            }

            if (batch.len() as u32) < self.batch_size {
                break;
            }
            after = batch.last().map(|record| record.mint.clone());
        }

        Ok(report)
    }

    async fn evaluate_record(&self, record: &TokenRecord, report: &mut SweepReport) -> WatchResult<()> {
        report.records_seen += 1;

        if !record.has_valid_baseline() {
            report.skipped_invalid_baseline += 1;
            return Ok(());
        }

        let price = match self.quotes.price_usd(&record.mint).await {
            Ok(Some(price)) if price > 0.0 => price,
            Ok(_) => {
                report.skipped_no_price += 1;
                return Ok(());
            }
            Err(e) => {
                debug!("No price for {}: {}", record.mint, e);
                report.skipped_no_price += 1;
                return Ok(());
            }
        };

        let market_cap_usd = market_cap_for(self.chain.as_ref(), &record.mint, price).await?;

        if let Some(hit) = reached_milestone(record.initial_market_cap_usd, record.last_multiple, market_cap_usd) {
            info!("{} reached {}x", record.mint, hit);
            self.notifier
                .notify(&format_milestone_message(&record.mint, hit, market_cap_usd))
                .await;
            self.ledger
                .set_last_multiple(&record.mint, hit)
                .await
                .map_err(WatchError::storage)?;
            report.milestones_notified += 1;
        }

        Ok(())
    }
}
