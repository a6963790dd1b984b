/*
[INPUT]:  WebSocket URL and price channel subscriptions
[OUTPUT]: Parsed price frames via channel + connection liveness flag
[POS]:    WebSocket layer - raw stream handling beneath the StandX provider
[UPDATE]: When adding new channels or changing connection logic
*/

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};

use crate::error::{Result, RtdError};

pub const MARKET_STREAM_URL: &str = "wss://perps.standx.com/ws-stream/v1";
const SUBSCRIPTION_LOG_LIMIT: usize = 10;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static SUBSCRIBE_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// WebSocket message types
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "channel")]
pub enum WebSocketMessage {
    #[serde(rename = "price")]
    Price { symbol: String, data: serde_json::Value },
    #[serde(other)]
    Other,
}

/// WebSocket client for the StandX market stream
#[derive(Debug)]
pub struct StandxWebSocket {
    url: String,
    message_tx: mpsc::Sender<WebSocketMessage>,
    message_rx: Option<mpsc::Receiver<WebSocketMessage>>,
    outbound_tx: Arc<Mutex<Option<mpsc::Sender<WsMessage>>>>,
    connected: Arc<AtomicBool>,
}

impl StandxWebSocket {
    /// Create a client for the public market stream
    pub fn new() -> Self {
        Self::with_url(MARKET_STREAM_URL)
    }

    /// Create a client for a specific stream URL
    pub fn with_url(url: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(100);
        Self {
            url: url.into(),
            message_tx: tx,
            message_rx: Some(rx),
            outbound_tx: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the message receiver
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<WebSocketMessage>> {
        self.message_rx.take()
    }

    /// Whether the socket task is still running
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Subscribe to price updates for a symbol
    pub async fn subscribe_price(&self, symbol: &str) -> Result<()> {
        let msg = serde_json::json!({
            "subscribe": {
                "channel": "price",
                "symbol": symbol
            }
        });
        self.send_subscription(msg).await
    }

    /// Unsubscribe from price updates for a symbol
    pub async fn unsubscribe_price(&self, symbol: &str) -> Result<()> {
        let msg = serde_json::json!({
            "unsubscribe": {
                "channel": "price",
                "symbol": symbol
            }
        });
        self.send_subscription(msg).await
    }

    /// Close the stream. Dropping the outbound sender makes the socket task send a close frame.
    pub async fn close(&self) {
        let mut guard = self.outbound_tx.lock().await;
        guard.take();
    }

    pub async fn connect(&self) -> Result<()> {
        let (ws_stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|err| RtdError::WebSocket(err.to_string()))?;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel(100);
        let outbound_state = self.outbound_tx.clone();

        {
            let mut guard = outbound_state.lock().await;
            if guard.is_some() {
                return Err(RtdError::WebSocket("WebSocket already connected".to_string()));
            }
            *guard = Some(outbound_tx);
        }

        let message_tx = self.message_tx.clone();
        let outbound_state_for_task = outbound_state.clone();
        let connected = self.connected.clone();
        connected.store(true, Ordering::SeqCst);
        info!(url = %self.url, "market stream connected");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if write.send(message).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                            Some(Ok(message)) => {
                                if let Some(parsed) = Self::parse_message(message)
                                    && message_tx.send(parsed).await.is_err()
                                {
                                    break;
                                }
                            }
                            Some(Err(_)) | None => {
                                break;
                            }
                        }
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
            let mut guard = outbound_state_for_task.lock().await;
            *guard = None;
            debug!("market stream task finished");
        });

        Ok(())
    }

    async fn send_subscription(&self, message: serde_json::Value) -> Result<()> {
        let sender = {
            let guard = self.outbound_tx.lock().await;
            guard
                .clone()
                .ok_or_else(|| RtdError::WebSocket("WebSocket not connected".to_string()))?
        };

        sender
            .send(WsMessage::Text(message.to_string().into()))
            .await
            .map_err(|_| RtdError::WebSocket("WebSocket send channel closed".to_string()))?;

        log_subscription_sent(&message);

        Ok(())
    }

    fn parse_message(message: WsMessage) -> Option<WebSocketMessage> {
        let text: String = match message {
            WsMessage::Text(text) => text.to_string(),
            WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok()?,
            _ => return Some(WebSocketMessage::Other),
        };

        match serde_json::from_str::<WebSocketMessage>(&text) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                log_parse_fail_once(&err, &text);
                Some(WebSocketMessage::Other)
            }
        }
    }
}

impl Default for StandxWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

fn log_subscription_sent(message: &serde_json::Value) {
    let count = SUBSCRIBE_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= SUBSCRIPTION_LOG_LIMIT {
        return;
    }

    if let Some((action, channel, symbol)) = describe_subscription(message) {
        info!(
            sample_index = count + 1,
            sample_limit = SUBSCRIPTION_LOG_LIMIT,
            action,
            channel,
            symbol = symbol.unwrap_or(""),
            "ws subscription sent"
        );
        return;
    }

    let preview = truncate_for_log(&message.to_string(), RAW_LOG_MAX_BYTES);
    info!(
        sample_index = count + 1,
        sample_limit = SUBSCRIPTION_LOG_LIMIT,
        message = %preview,
        "ws subscription sent"
    );
}

fn describe_subscription(message: &serde_json::Value) -> Option<(&'static str, &str, Option<&str>)> {
    let (action, payload) = if let Some(payload) = message.get("subscribe") {
        ("subscribe", payload)
    } else if let Some(payload) = message.get("unsubscribe") {
        ("unsubscribe", payload)
    } else {
        return None;
    };

    let channel = payload.get("channel")?.as_str()?;
    let symbol = payload.get("symbol").and_then(|value| value.as_str());
    Some((action, channel, symbol))
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            message = %preview,
            "ws message parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
