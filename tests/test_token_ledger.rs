//! Durability and upsert semantics of the SQLite token ledger

use pool_sentinel::storage::{SqliteTokenLedger, TokenLedger, UpsertOutcome};

#[tokio::test]
async fn test_upsert_keeps_baseline_and_refreshes_display() {
    let ledger = SqliteTokenLedger::in_memory().await.expect("Failed to create ledger");

    let first = ledger.upsert("MINT_A", "unknown", "unknown", 20_000.0).await.unwrap();
    assert_eq!(first, UpsertOutcome::Inserted);
    ledger.set_last_multiple("MINT_A", 3).await.unwrap();

    let second = ledger.upsert("MINT_A", "AAA", "Token A", 99_999.0).await.unwrap();
    assert_eq!(second, UpsertOutcome::DisplayUpdated);

    let record = ledger.get("MINT_A").await.unwrap().expect("record should exist");
    assert_eq!(record.symbol, "AAA");
    assert_eq!(record.name, "Token A");
    assert_eq!(record.initial_market_cap_usd, 20_000.0);
    assert_eq!(record.last_multiple, 3);
    assert_eq!(ledger.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tokens.db");
    let path = path.to_str().unwrap();

    {
        let ledger = SqliteTokenLedger::open(path).await.unwrap();
        ledger.upsert("MINT_B", "unknown", "unknown", 15_500.0).await.unwrap();
        ledger.set_last_multiple("MINT_B", 2).await.unwrap();
        ledger.close().await;
    }

    let reopened = SqliteTokenLedger::open(path).await.unwrap();
    let all = reopened.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].mint, "MINT_B");
    assert_eq!(all[0].initial_market_cap_usd, 15_500.0);
    assert_eq!(all[0].last_multiple, 2);
    assert!(reopened.health_check().await.unwrap());
}

#[tokio::test]
async fn test_set_last_multiple_on_unknown_mint_is_noop() {
    let ledger = SqliteTokenLedger::in_memory().await.unwrap();
    ledger.set_last_multiple("GHOST", 4).await.unwrap();
    assert!(ledger.get("GHOST").await.unwrap().is_none());
    assert_eq!(ledger.count().await.unwrap(), 0);
}
