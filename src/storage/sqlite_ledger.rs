//! SqliteTokenLedger - SQLite implementation of the token ledger
//!
//! Persists one row per admitted mint in the `tokens` table. The schema is
//! created on open so a fresh database file is usable immediately.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::storage::ledger::{TokenLedger, UpsertOutcome};
use crate::types::{TokenRecord, UNKNOWN_DISPLAY};

/// Helper type for deserializing rows; legacy files may carry NULLs.
#[derive(FromRow)]
struct TokenRow {
    mint: String,
    symbol: Option<String>,
    name: Option<String>,
    initial_mc_usd: Option<f64>,
    last_multiple: Option<i64>,
}

impl From<TokenRow> for TokenRecord {
    fn from(row: TokenRow) -> Self {
        TokenRecord {
            mint: row.mint,
            symbol: row.symbol.unwrap_or_else(|| UNKNOWN_DISPLAY.to_string()),
            name: row.name.unwrap_or_else(|| UNKNOWN_DISPLAY.to_string()),
            initial_market_cap_usd: row.initial_mc_usd.unwrap_or(0.0),
            last_multiple: row.last_multiple.unwrap_or(1),
        }
    }
}

/// SQLite-backed ledger of admitted tokens.
pub struct SqliteTokenLedger {
    pool: Pool<Sqlite>,
}

impl SqliteTokenLedger {
    /// Open (or create) the ledger database file at `path`.
    pub async fn open(path: &str) -> Result<Arc<Self>> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
            .context("Invalid SQLite path")?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        Self::create_schema(&pool).await?;

        info!("SqliteTokenLedger initialized and connected to {}", path);

        Ok(Arc::new(Self { pool }))
    }

    /// Private in-memory ledger. A single connection keeps the database alive.
    pub async fn in_memory() -> Result<Arc<Self>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::create_schema(&pool).await?;

        Ok(Arc::new(Self { pool }))
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                mint TEXT PRIMARY KEY,
                symbol TEXT,
                name TEXT,
                initial_mc_usd REAL,
                last_multiple INTEGER DEFAULT 1
            );
            "#
        )
        .execute(pool)
        .await
        .context("Failed to create tokens table")?;

        Ok(())
    }

    /// Close every pooled connection, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TokenLedger for SqliteTokenLedger {
    async fn upsert(
        &self,
        mint: &str,
        symbol: &str,
        name: &str,
        initial_market_cap_usd: f64,
    ) -> Result<UpsertOutcome> {
        debug!("Upserting token record for mint: {}", mint);

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO tokens (mint, symbol, name, initial_mc_usd, last_multiple)
            VALUES (?, ?, ?, ?, 1)
            "#
        )
        .bind(mint)
        .bind(symbol)
        .bind(name)
        .bind(initial_market_cap_usd)
        .execute(&mut *tx)
        .await
        .context("Failed to insert token record")?
        .rows_affected();

        let outcome = if inserted > 0 {
            UpsertOutcome::Inserted
        } else {
            sqlx::query("UPDATE tokens SET symbol = ?, name = ? WHERE mint = ?")
                .bind(symbol)
                .bind(name)
                .bind(mint)
                .execute(&mut *tx)
                .await
                .context("Failed to refresh display fields")?;
            UpsertOutcome::DisplayUpdated
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn set_last_multiple(&self, mint: &str, multiple: i64) -> Result<()> {
        debug!("Setting last_multiple={} for mint: {}", multiple, mint);

        sqlx::query("UPDATE tokens SET last_multiple = ? WHERE mint = ?")
            .bind(multiple)
            .bind(mint)
            .execute(&self.pool)
            .await
            .context("Failed to update last_multiple")?;

        Ok(())
    }

    async fn get(&self, mint: &str) -> Result<Option<TokenRecord>> {
        let row: Option<TokenRow> = sqlx::query_as(
            "SELECT mint, symbol, name, initial_mc_usd, last_multiple FROM tokens WHERE mint = ?"
        )
        .bind(mint)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch token record")?;

        Ok(row.map(TokenRecord::from))
    }

    async fn list_all(&self) -> Result<Vec<TokenRecord>> {
        let rows: Vec<TokenRow> = sqlx::query_as(
            "SELECT mint, symbol, name, initial_mc_usd, last_multiple FROM tokens ORDER BY mint ASC"
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list token records")?;

        Ok(rows.into_iter().map(TokenRecord::from).collect())
    }

    async fn list_batch(&self, after_mint: Option<&str>, limit: u32) -> Result<Vec<TokenRecord>> {
        let rows: Vec<TokenRow> = sqlx::query_as(
            r#"
            SELECT mint, symbol, name, initial_mc_usd, last_multiple FROM tokens
            WHERE mint > ?
            ORDER BY mint ASC
            LIMIT ?
            "#
        )
        .bind(after_mint.unwrap_or(""))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read token batch")?;

        Ok(rows.into_iter().map(TokenRecord::from).collect())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<TokenRecord>> {
        let rows: Vec<TokenRow> = sqlx::query_as(
            r#"
            SELECT mint, symbol, name, initial_mc_usd, last_multiple FROM tokens
            ORDER BY rowid DESC
            LIMIT ?
            "#
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent token records")?;

        Ok(rows.into_iter().map(TokenRecord::from).collect())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count token records")?;
        Ok(count)
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}
