//! Log subscription over the Solana websocket API.
//!
//! A producer task owns the socket and pushes every `logsNotification` onto a
//! bounded channel. Cancelling the subscription aborts the producer, which
//! drops the sender; the consumer sees the channel close and stops.

use crate::error::WatchResult;
use crate::types::Pubkey;
use crate::watcher::types::{RawLogEvent, RawLogEventReceiver, RawLogEventSender};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Notification {
    method: Option<String>,
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    context: Option<NotificationContext>,
    value: LogsValue,
}

#[derive(Debug, Deserialize)]
struct NotificationContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct LogsValue {
    signature: Option<String>,
    #[serde(default)]
    logs: Option<Vec<String>>,
}

/// Turn one websocket text frame into an event.
/// Subscription acknowledgements and other methods yield `Ok(None)`.
pub fn parse_notification(text: &str) -> WatchResult<Option<RawLogEvent>> {
    let notification: Notification = serde_json::from_str(text)?;
    if notification.method.as_deref() != Some("logsNotification") {
        return Ok(None);
    }

    let Some(params) = notification.params else {
        return Ok(None);
    };

    let mut event = RawLogEvent::new(
        params.result.value.signature,
        params.result.value.logs.unwrap_or_default(),
    );
    event.slot = params.result.context.map(|c| c.slot);
    Ok(Some(event))
}

/// JSON-RPC `logsSubscribe` request for one program.
pub fn subscribe_request(id: u64, program_id: &str, commitment: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [program_id] },
            { "commitment": commitment },
        ],
    })
    .to_string()
}

#[derive(Debug)]
enum StreamEnd {
    /// The socket closed or the server hung up
    Disconnected,
    /// Nobody is listening any more
    ReceiverClosed,
}

/// Handle to a running log subscription.
pub struct LogsSubscription {
    handle: JoinHandle<()>,
}

impl LogsSubscription {
    /// Start the producer task and return the consuming end of its channel.
    pub fn spawn(
        ws_url: String,
        program_ids: Vec<Pubkey>,
        commitment: String,
        capacity: usize,
    ) -> (Self, RawLogEventReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_subscription(ws_url, program_ids, commitment, sender));
        (Self { handle }, receiver)
    }

    /// Stop producing. The receiver drains what is buffered and then closes.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

async fn run_subscription(
    ws_url: String,
    program_ids: Vec<Pubkey>,
    commitment: String,
    sender: RawLogEventSender,
) {
    let new_backoff = || {
        ExponentialBackoff::from_millis(2)
            .factor(500)
            .max_delay(MAX_RECONNECT_DELAY)
    };
    let mut backoff = new_backoff();

    loop {
        let mut established = false;
        let outcome = stream_once(&ws_url, &program_ids, &commitment, &sender, &mut established).await;

        // Any session that got as far as subscribing starts the delays over
        if established {
            backoff = new_backoff();
        }

        match outcome {
            Ok(StreamEnd::ReceiverClosed) => {
                info!("Event consumer went away; closing log subscription");
                return;
            }
            Ok(StreamEnd::Disconnected) => warn!("Log subscription disconnected"),
            Err(e) => warn!("Log subscription failed: {}", e),
        }

        if sender.is_closed() {
            return;
        }

        let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
        info!("Reconnecting log subscription in {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

async fn stream_once(
    ws_url: &str,
    program_ids: &[Pubkey],
    commitment: &str,
    sender: &RawLogEventSender,
    established: &mut bool,
) -> WatchResult<StreamEnd> {
    let (ws_stream, _) = connect_async(ws_url).await?;
    let (mut write, mut read) = ws_stream.split();

    for (i, program_id) in program_ids.iter().enumerate() {
        write
            .send(Message::Text(subscribe_request(i as u64 + 1, program_id, commitment)))
            .await?;
    }
    *established = true;
    info!("Subscribed to logs of {} program(s)", program_ids.len());

    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => match parse_notification(&text) {
                Ok(Some(event)) => {
                    if sender.send(event).await.is_err() {
                        return Ok(StreamEnd::ReceiverClosed);
                    }
                }
                Ok(None) => debug!("Ignoring non-notification frame"),
                Err(e) => debug!("Dropping malformed frame: {}", e),
            },
            Message::Close(frame) => {
                debug!("Server closed the socket: {:?}", frame);
                return Ok(StreamEnd::Disconnected);
            }
            _ => {}
        }
    }

    Ok(StreamEnd::Disconnected)
}
