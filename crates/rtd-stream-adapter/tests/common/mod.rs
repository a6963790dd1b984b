/*
[INPUT]:  Test scenarios needing a callback object or a price endpoint
[OUTPUT]: Shared test utilities, fixtures, and a local price server
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for rtd-stream-adapter tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use rtd_stream_adapter::{Result, UpdateEvent};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Callback object that counts what the provider sends it
#[derive(Default)]
pub struct CountingEvent {
    pub notified: AtomicUsize,
    pub disconnected: AtomicUsize,
}

impl UpdateEvent for CountingEvent {
    fn update_notify(&self) -> Result<()> {
        self.notified.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(100)
    }

    fn set_heartbeat_interval(&self, _interval: Duration) -> Result<()> {
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll `condition` for up to five seconds
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// URL of a local port nobody listens on
pub fn unused_ws_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("ws://{addr}")
}

/// Start a one-connection WebSocket server that answers every price subscription
/// with a single frame carrying `last_price`.
pub fn spawn_price_server(last_price: &'static str) -> String {
    let (addr_tx, addr_rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build server runtime");

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind price server");
            addr_tx
                .send(listener.local_addr().expect("server address"))
                .expect("report address");

            let (stream, _) = listener.accept().await.expect("accept client");
            let mut ws = accept_async(stream).await.expect("websocket handshake");

            while let Some(Ok(message)) = ws.next().await {
                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                let request: serde_json::Value =
                    serde_json::from_str(text.as_str()).expect("json request");
                let Some(symbol) = request
                    .pointer("/subscribe/symbol")
                    .and_then(|value| value.as_str())
                else {
                    continue;
                };

                let frame = serde_json::json!({
                    "channel": "price",
                    "symbol": symbol,
                    "data": {
                        "base": "BTC",
                        "index_price": "100",
                        "last_price": last_price,
                        "mark_price": "100.5",
                        "mid_price": "100.7",
                        "quote": "USD",
                        "spread": ["100.6", "100.8"],
                        "symbol": symbol,
                        "time": "2026-02-03T00:00:00Z"
                    }
                });
                if ws.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
        });
    });

    let addr = addr_rx.recv().expect("price server address");
    format!("ws://{addr}")
}
