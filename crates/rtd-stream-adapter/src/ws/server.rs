/*
[INPUT]:  Provider session calls + StandX market price frames
[OUTPUT]: Push/pull provider session backed by the market WebSocket
[POS]:    Provider layer - network provider bridging async stream to sync contract
[UPDATE]: When changing topic mapping, runtime ownership, or stream teardown
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::{MARKET_STREAM_URL, StandxWebSocket, WebSocketMessage};
use super::message::{PriceData, PriceField};
use crate::error::{Result, RtdError};
use crate::pending::{Generation, UpdateQueue};
use crate::provider::{RtdServer, UpdateEventHandle};
use crate::types::{RefreshBatch, RtdValue, TopicArgs, TopicId};

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings for the StandX provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StandxSettings {
    /// Market stream endpoint
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

impl Default for StandxSettings {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
        }
    }
}

fn default_ws_url() -> String {
    MARKET_STREAM_URL.to_string()
}

#[derive(Debug, Clone)]
struct PriceTopic {
    symbol: String,
    field: PriceField,
    generation: Generation,
}

type TopicTable = Arc<Mutex<HashMap<TopicId, PriceTopic>>>;

fn lock_topics(topics: &TopicTable) -> MutexGuard<'_, HashMap<TopicId, PriceTopic>> {
    topics.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Session {
    runtime: Runtime,
    ws: StandxWebSocket,
    pump: JoinHandle<()>,
}

/// Provider session over the StandX public price channel.
///
/// Owns a private tokio runtime so the blocking session contract can drive the
/// async stream; price frames are routed to connected topics on that runtime.
pub struct StandxRtdServer {
    settings: StandxSettings,
    queue: Arc<UpdateQueue>,
    topics: TopicTable,
    session: Option<Session>,
    terminated: bool,
}

impl StandxRtdServer {
    pub fn new(settings: StandxSettings) -> Self {
        Self {
            settings,
            queue: Arc::new(UpdateQueue::new()),
            topics: Arc::new(Mutex::new(HashMap::new())),
            session: None,
            terminated: false,
        }
    }

    pub fn settings(&self) -> &StandxSettings {
        &self.settings
    }

    fn session(&self) -> Result<&Session> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        self.session.as_ref().ok_or(RtdError::NotStarted)
    }

    fn symbol_in_use(&self, symbol: &str) -> bool {
        lock_topics(&self.topics)
            .values()
            .any(|topic| topic.symbol == symbol)
    }
}

impl RtdServer for StandxRtdServer {
    fn server_start(&mut self, callback: UpdateEventHandle) -> Result<()> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        if self.session.is_some() {
            return Err(RtdError::AlreadyStarted);
        }

        url::Url::parse(&self.settings.ws_url)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("standx-rtd")
            .enable_all()
            .build()
            .map_err(|err| RtdError::StartFailed(err.to_string()))?;

        let mut ws = StandxWebSocket::with_url(self.settings.ws_url.clone());
        runtime
            .block_on(ws.connect())
            .map_err(|err| RtdError::StartFailed(err.to_string()))?;
        let rx = ws
            .take_receiver()
            .ok_or_else(|| RtdError::StartFailed("receiver already taken".to_string()))?;

        self.queue.attach(callback);
        let pump = runtime.spawn(pump_prices(rx, self.topics.clone(), self.queue.clone()));

        info!(ws_url = %self.settings.ws_url, "StandX provider started");
        self.session = Some(Session { runtime, ws, pump });
        Ok(())
    }

    fn connect_data(
        &mut self,
        topic_id: TopicId,
        args: &TopicArgs,
        get_new_values: bool,
    ) -> Result<RtdValue> {
        let session = self.session()?;
        let field = PriceField::parse(args.topic().as_str())
            .ok_or_else(|| RtdError::UnknownTopic(args.topic().to_string()))?;
        let symbol = args.symbol().as_str();
        if symbol.is_empty() {
            return Err(RtdError::InvalidArguments("empty symbol".to_string()));
        }

        if !self.symbol_in_use(symbol) {
            session
                .runtime
                .block_on(session.ws.subscribe_price(symbol))
                .map_err(|err| RtdError::connect_failed(topic_id, err.to_string()))?;
        }

        let generation = self.queue.open(topic_id);
        lock_topics(&self.topics).insert(
            topic_id,
            PriceTopic {
                symbol: symbol.to_string(),
                field,
                generation,
            },
        );
        debug!(topic_id, symbol, get_new_values, "price topic connected");

        // The stream carries no snapshot; the first frame arrives through the callback.
        Ok(RtdValue::empty())
    }

    fn refresh_data(&mut self) -> Result<RefreshBatch> {
        self.session()?;
        Ok(self.queue.drain())
    }

    fn disconnect_data(&mut self, topic_id: TopicId) -> Result<()> {
        self.session()?;
        let removed = lock_topics(&self.topics).remove(&topic_id);
        self.queue.forget(topic_id);

        let Some(topic) = removed else {
            debug!(topic_id, "disconnect for unknown topic ignored");
            return Ok(());
        };

        if !self.symbol_in_use(&topic.symbol) {
            let session = self.session()?;
            session
                .runtime
                .block_on(session.ws.unsubscribe_price(&topic.symbol))?;
        }
        Ok(())
    }

    fn heartbeat(&mut self) -> Result<bool> {
        let session = self.session()?;
        Ok(session.ws.is_connected() && !session.pump.is_finished())
    }

    fn server_terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        self.terminated = true;
        lock_topics(&self.topics).clear();

        if let Some(session) = self.session.take() {
            session.runtime.block_on(session.ws.close());
            session.pump.abort();
            session.runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
        }

        self.queue.release();
        info!("StandX provider terminated");
        Ok(())
    }
}

impl Drop for StandxRtdServer {
    fn drop(&mut self) {
        if !self.terminated && self.session.is_some() {
            if let Err(err) = self.server_terminate() {
                warn!(error = %err, "StandX provider terminate failed during drop");
            }
        }
    }
}

async fn pump_prices(
    mut rx: mpsc::Receiver<WebSocketMessage>,
    topics: TopicTable,
    queue: Arc<UpdateQueue>,
) {
    while let Some(message) = rx.recv().await {
        let WebSocketMessage::Price { symbol, data } = message else {
            continue;
        };

        let price = match serde_json::from_value::<PriceData>(data) {
            Ok(price) => price,
            Err(err) => {
                debug!(%symbol, error = %err, "Failed to deserialize price payload");
                continue;
            }
        };

        let updates: Vec<(TopicId, Generation, RtdValue)> = lock_topics(&topics)
            .iter()
            .filter(|(_, topic)| topic.symbol == symbol)
            .filter_map(|(topic_id, topic)| {
                topic
                    .field
                    .extract(&price)
                    .map(|value| (*topic_id, topic.generation, value))
            })
            .collect();

        for (topic_id, generation, value) in updates {
            queue.publish(topic_id, generation, value);
        }
    }

    debug!("price pump finished");
}
