//! Admission evaluator.
//!
//! Prices a candidate mint, derives its market cap and top-10 holder
//! concentration, and applies the configured gates. Every gate must pass;
//! values equal to a threshold pass.

use crate::config::AdmissionThresholds;
use crate::error::WatchResult;
use crate::types::AdmittedToken;
use crate::watcher::data_sources::{ChainDataSource, QuoteProvider};
use crate::watcher::types::{AdmissionDecision, SkipReason};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of largest holder accounts that make up the concentration figure.
pub const TOP_HOLDERS: usize = 10;

/// Decimal-adjusted supply times spot price.
pub fn compute_market_cap(supply: u64, decimals: u8, price_usd: f64) -> f64 {
    (supply as f64 / 10f64.powi(decimals as i32)) * price_usd
}

/// Share of the listed balance held by the `top_n` largest accounts, in percent.
/// An empty or all-zero listing is 0%.
pub fn top_holders_percent(amounts: &[u64], top_n: usize) -> f64 {
    let total: u128 = amounts.iter().map(|a| *a as u128).sum();
    if total == 0 {
        return 0.0;
    }

    let mut sorted = amounts.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let top: u128 = sorted.iter().take(top_n).map(|a| *a as u128).sum();

    (top as f64 / total as f64) * 100.0
}

pub fn check_market_cap(market_cap_usd: f64, thresholds: &AdmissionThresholds) -> Result<(), SkipReason> {
    if market_cap_usd < thresholds.min_market_cap_usd {
        return Err(SkipReason::MarketCapBelowMinimum {
            market_cap_usd,
            minimum: thresholds.min_market_cap_usd,
        });
    }
    Ok(())
}

pub fn check_concentration(top10_percent: f64, thresholds: &AdmissionThresholds) -> Result<(), SkipReason> {
    if top10_percent > thresholds.max_top10_holder_percent {
        return Err(SkipReason::ConcentrationAboveMaximum {
            top10_percent,
            maximum: thresholds.max_top10_holder_percent,
        });
    }
    Ok(())
}

/// Fetch supply and turn a known price into a market cap.
pub async fn market_cap_for(chain: &dyn ChainDataSource, mint: &str, price_usd: f64) -> WatchResult<f64> {
    let supply = chain.token_supply(mint).await?;
    Ok(compute_market_cap(supply.amount, supply.decimals, price_usd))
}

pub struct AdmissionEvaluator {
    chain: Arc<dyn ChainDataSource>,
    quotes: Arc<dyn QuoteProvider>,
    thresholds: AdmissionThresholds,
}

impl AdmissionEvaluator {
    pub fn new(
        chain: Arc<dyn ChainDataSource>,
        quotes: Arc<dyn QuoteProvider>,
        thresholds: AdmissionThresholds,
    ) -> Self {
        Self {
            chain,
            quotes,
            thresholds,
        }
    }

    #[instrument(skip(self))]
    pub async fn evaluate(&self, mint: &str) -> WatchResult<AdmissionDecision> {
        let price = match self.quotes.price_usd(mint).await? {
            Some(price) if price > 0.0 => price,
            _ => return Ok(AdmissionDecision::Rejected(SkipReason::NoPrice)),
        };

        let market_cap_usd = market_cap_for(self.chain.as_ref(), mint, price).await?;
        if let Err(reason) = check_market_cap(market_cap_usd, &self.thresholds) {
            return Ok(AdmissionDecision::Rejected(reason));
        }

        let amounts = self.chain.largest_holder_amounts(mint).await?;
        let top10_percent = top_holders_percent(&amounts, TOP_HOLDERS);
        if let Err(reason) = check_concentration(top10_percent, &self.thresholds) {
            return Ok(AdmissionDecision::Rejected(reason));
        }

        debug!("{} passed admission: mc=${:.2} top10={:.2}%", mint, market_cap_usd, top10_percent);
        Ok(AdmissionDecision::Admitted(AdmittedToken {
            mint: mint.to_string(),
            market_cap_usd,
            top10_percent,
        }))
    }
}
