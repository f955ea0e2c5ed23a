//! Health and debug HTTP surface.
//!
//! `/` answers liveness, `/debug_tokens` dumps the newest ledger rows and
//! `/trigger_test` inserts a synthetic record to exercise the write path.

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::storage::TokenLedger;

const DEBUG_ROW_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct HealthState {
    ledger: Arc<dyn TokenLedger>,
}

pub fn router(ledger: Arc<dyn TokenLedger>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/debug_tokens", get(debug_tokens))
        .route("/trigger_test", get(trigger_test))
        .with_state(HealthState { ledger })
}

/// Bind `listen` and serve until the task is dropped.
pub async fn serve(listen: &str, ledger: Arc<dyn TokenLedger>) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind health endpoint on {}", listen))?;
    info!("Health endpoint listening on http://{}", listen);

    axum::serve(listener, router(ledger))
        .await
        .context("Health endpoint stopped")?;
    Ok(())
}

async fn liveness() -> &'static str {
    "Solana pool watcher is running"
}

async fn debug_tokens(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    match state.ledger.list_recent(DEBUG_ROW_LIMIT).await {
        Ok(records) => {
            let rows: Vec<Value> = records
                .iter()
                .map(|r| json!([r.mint, r.initial_market_cap_usd, r.last_multiple]))
                .collect();
            (StatusCode::OK, Json(json!({ "count": rows.len(), "rows": rows })))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{:#}", e) })),
        ),
    }
}

async fn trigger_test(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    let mint = format!("TEST{}", rand::thread_rng().gen_range(1000..=9999));

    match state.ledger.upsert(&mint, "TST", "Test Token", 12345.0).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "triggered", "mint": mint }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{:#}", e) })),
        ),
    }
}
