//! End-to-end discovery: log event → mint → admission → ledger + alert

mod common;

use common::{FakeChain, FakeQuotes, RecordingNotifier};
use pool_sentinel::config::AdmissionThresholds;
use pool_sentinel::storage::{SqliteTokenLedger, TokenLedger, UpsertOutcome};
use pool_sentinel::watcher::{
    AdmissionEvaluator, DiscoveryOutcome, DiscoveryPipeline, MintResolver, RawLogEvent, SkipReason,
};
use std::sync::Arc;
use tokio::sync::mpsc;

fn pipeline(
    chain: FakeChain,
    quotes: FakeQuotes,
    ledger: Arc<SqliteTokenLedger>,
    notifier: Arc<RecordingNotifier>,
) -> DiscoveryPipeline {
    let chain = Arc::new(chain);
    DiscoveryPipeline::new(
        MintResolver::new(chain.clone()),
        AdmissionEvaluator::new(chain, Arc::new(quotes), AdmissionThresholds::default()),
        ledger,
        notifier,
    )
}

fn creation_event(signature: &str) -> RawLogEvent {
    RawLogEvent::new(
        Some(signature.to_string()),
        vec![
            "Program 675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8 invoke [1]".to_string(),
            "Program log: initialize2: InitializeInstruction2 { nonce: 254 }".to_string(),
        ],
    )
}

#[tokio::test]
async fn test_low_market_cap_candidate_is_rejected() {
    // 500 whole tokens at 0.002 USD is a 1 USD market cap
    let chain = FakeChain::default()
        .with_transaction("SIG1", &[], &["MINT1"])
        .with_supply("MINT1", 500_000_000_000, 9)
        .with_holders("MINT1", vec![1_000; 60]);
    let quotes = FakeQuotes::default().with_price("MINT1", 0.002);
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());

    let pipeline = pipeline(chain, quotes, ledger.clone(), notifier.clone());
    let outcome = pipeline.process_event(&creation_event("SIG1")).await.unwrap();

    match outcome {
        DiscoveryOutcome::Rejected { mint, reason: SkipReason::MarketCapBelowMinimum { market_cap_usd, .. } } => {
            assert_eq!(mint, "MINT1");
            assert!((market_cap_usd - 1.0).abs() < 1e-9);
        }
        other => panic!("expected market cap rejection, got {:?}", other),
    }
    assert_eq!(ledger.count().await.unwrap(), 0);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_admitted_token_is_recorded_and_announced_once() {
    // 20_000 USD market cap; 60 equal holders put the top ten at ~16.7%
    let chain = FakeChain::default()
        .with_transaction("SIG2", &["So11111111111111111111111111111111111111112"], &[
            "So11111111111111111111111111111111111111112",
            "MINT2",
        ])
        .with_supply("MINT2", 10_000_000_000, 6)
        .with_holders("MINT2", vec![1_000; 60]);
    let quotes = FakeQuotes::default().with_price("MINT2", 2.0);
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());

    let pipeline = pipeline(chain, quotes, ledger.clone(), notifier.clone());

    let outcome = pipeline.process_event(&creation_event("SIG2")).await.unwrap();
    match outcome {
        DiscoveryOutcome::Admitted { token, upsert } => {
            assert_eq!(token.mint, "MINT2");
            assert_eq!(upsert, UpsertOutcome::Inserted);
        }
        other => panic!("expected admission, got {:?}", other),
    }

    let record = ledger.get("MINT2").await.unwrap().expect("admitted token must be stored");
    assert_eq!(record.symbol, "unknown");
    assert_eq!(record.name, "unknown");
    assert_eq!(record.initial_market_cap_usd, 20_000.0);
    assert_eq!(record.last_multiple, 1);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("CA: MINT2\n"));
    assert!(messages[0].contains("├ MC: $20.00K"));

    // Redelivery of the same signature keeps the baseline and stays quiet
    let outcome = pipeline.process_event(&creation_event("SIG2")).await.unwrap();
    assert!(matches!(
        outcome,
        DiscoveryOutcome::Admitted { upsert: UpsertOutcome::DisplayUpdated, .. }
    ));
    assert_eq!(ledger.count().await.unwrap(), 1);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_concentrated_holders_are_rejected() {
    let chain = FakeChain::default()
        .with_transaction("SIG3", &[], &["MINT3"])
        .with_supply("MINT3", 10_000_000_000, 6)
        .with_holders("MINT3", vec![1_000; 12]);
    let quotes = FakeQuotes::default().with_price("MINT3", 2.0);
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());

    let pipeline = pipeline(chain, quotes, ledger.clone(), notifier.clone());
    let outcome = pipeline.process_signature("SIG3").await.unwrap();

    assert!(matches!(
        outcome,
        DiscoveryOutcome::Rejected { reason: SkipReason::ConcentrationAboveMaximum { .. }, .. }
    ));
    assert_eq!(ledger.count().await.unwrap(), 0);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_non_pool_and_unsigned_events_are_ignored() {
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = pipeline(FakeChain::default(), FakeQuotes::default(), ledger.clone(), notifier.clone());

    let swap = RawLogEvent::new(Some("SIG4".to_string()), vec!["Program log: Instruction: Swap".to_string()]);
    assert_eq!(pipeline.process_event(&swap).await.unwrap(), DiscoveryOutcome::NotPoolEvent);

    let mut unsigned = creation_event("");
    unsigned.signature = None;
    assert_eq!(pipeline.process_event(&unsigned).await.unwrap(), DiscoveryOutcome::MissingSignature);

    // Unknown transaction resolves to no mint
    assert_eq!(pipeline.process_event(&creation_event("SIG_UNKNOWN")).await.unwrap(), DiscoveryOutcome::NoMint);

    assert_eq!(ledger.count().await.unwrap(), 0);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_run_drains_channel_and_stops_when_closed() {
    let chain = FakeChain::default()
        .with_transaction("SIG5", &[], &["MINT5"])
        .with_supply("MINT5", 10_000_000_000, 6)
        .with_holders("MINT5", vec![1_000; 60]);
    let quotes = FakeQuotes::default().with_price("MINT5", 2.0);
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = pipeline(chain, quotes, ledger.clone(), notifier.clone());

    let (sender, receiver) = mpsc::channel(8);
    sender.send(creation_event("SIG5")).await.unwrap();
    sender.send(creation_event("SIG5")).await.unwrap();
    drop(sender);

    pipeline.run(receiver).await;

    assert_eq!(ledger.count().await.unwrap(), 1);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_run_keeps_going_after_a_failed_event() {
    // MINT_BAD has a price but no supply, so its admission errors out
    let chain = FakeChain::default()
        .with_transaction("SIG_BAD", &[], &["MINT_BAD"])
        .with_transaction("SIG_GOOD", &[], &["MINT_GOOD"])
        .with_supply("MINT_GOOD", 10_000_000_000, 6)
        .with_holders("MINT_GOOD", vec![1_000; 60]);
    let quotes = FakeQuotes::default()
        .with_price("MINT_BAD", 1.0)
        .with_price("MINT_GOOD", 2.0);
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = pipeline(chain, quotes, ledger.clone(), notifier.clone());

    assert!(pipeline.process_event(&creation_event("SIG_BAD")).await.is_err());

    let (sender, receiver) = mpsc::channel(8);
    sender.send(creation_event("SIG_BAD")).await.unwrap();
    sender.send(creation_event("SIG_GOOD")).await.unwrap();
    drop(sender);

    pipeline.run(receiver).await;

    assert_eq!(ledger.count().await.unwrap(), 1);
    assert!(ledger.get("MINT_GOOD").await.unwrap().is_some());
    assert!(ledger.get("MINT_BAD").await.unwrap().is_none());

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("CA: MINT_GOOD\n"));
}
