//! Typed failure kinds shared by the watcher components.
//!
//! Every fallible operation in the discovery path and the scanner returns one
//! of these. Callers decide skip-vs-abort explicitly; nothing here is fatal to
//! the long-running loops.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("rpc request failed: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl WatchError {
    /// Wrap a ledger failure, keeping the whole context chain in the message.
    pub fn storage(err: anyhow::Error) -> Self {
        WatchError::Storage(format!("{:#}", err))
    }

    /// Transport failures are expected to clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WatchError::Rpc(_) | WatchError::Http(_) | WatchError::WebSocket(_)
        )
    }
}

impl From<serde_json::Error> for WatchError {
    fn from(err: serde_json::Error) -> Self {
        WatchError::Decode(err.to_string())
    }
}

pub type WatchResult<T> = Result<T, WatchError>;
