/*
[INPUT]:  Scripted provider behavior for client tests
[OUTPUT]: Recording mock provider, shared output buffer, dispatcher builder
[POS]:    Test support - shared across client integration tests
[UPDATE]: When the provider contract or dispatcher wiring changes
*/

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::io::{self, Write};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rtd_stream_adapter::{
    RefreshBatch, Result as RtdResult, RtdError, RtdServer, RtdValue, Topic, TopicArgs, TopicId,
    UpdateEventHandle,
};
use rtd_stream_client::notifier::as_event_handle;
use rtd_stream_client::{
    DispatchConfig, Dispatcher, NotificationFlag, PumpMessage, SharedIntent, SubscriptionManager,
    UpdateNotifier,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start,
    Connect { topic_id: TopicId, symbol: String, topic: String },
    Refresh,
    Disconnect(TopicId),
    Heartbeat,
    Terminate,
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    rejected: HashSet<String>,
    batches: VecDeque<RtdResult<RefreshBatch>>,
    callback: Option<UpdateEventHandle>,
}

/// Provider double that records every call; clones share state.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<MockState>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(symbols: &[&str]) -> Self {
        let server = Self::new();
        server.state.lock().unwrap().rejected = symbols.iter().map(|s| s.to_string()).collect();
        server
    }

    pub fn push_batch(&self, batch: RefreshBatch) {
        self.state.lock().unwrap().batches.push_back(Ok(batch));
    }

    pub fn push_refresh_error(&self, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .batches
            .push_back(Err(RtdError::Refresh(reason.to_string())));
    }

    /// Invoke the callback the way a provider thread would.
    pub fn notify(&self) {
        let callback = self.state.lock().unwrap().callback.clone();
        if let Some(callback) = callback {
            callback.update_notify().unwrap();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matcher: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matcher(call)).count()
    }

    pub fn holds_callback(&self) -> bool {
        self.state.lock().unwrap().callback.is_some()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl RtdServer for MockServer {
    fn server_start(&mut self, callback: UpdateEventHandle) -> RtdResult<()> {
        self.record(Call::Start);
        self.state.lock().unwrap().callback = Some(callback);
        Ok(())
    }

    fn connect_data(
        &mut self,
        topic_id: TopicId,
        args: &TopicArgs,
        _get_new_values: bool,
    ) -> RtdResult<RtdValue> {
        let [topic, symbol] = args.as_strings();
        self.record(Call::Connect {
            topic_id,
            symbol: symbol.to_string(),
            topic: topic.to_string(),
        });
        if self.state.lock().unwrap().rejected.contains(symbol) {
            return Err(RtdError::connect_failed(topic_id, "symbol rejected"));
        }
        Ok(RtdValue::Double(100.0))
    }

    fn refresh_data(&mut self) -> RtdResult<RefreshBatch> {
        self.record(Call::Refresh);
        self.state
            .lock()
            .unwrap()
            .batches
            .pop_front()
            .unwrap_or_else(|| Ok(RefreshBatch::empty()))
    }

    fn disconnect_data(&mut self, topic_id: TopicId) -> RtdResult<()> {
        self.record(Call::Disconnect(topic_id));
        Ok(())
    }

    fn heartbeat(&mut self) -> RtdResult<bool> {
        self.record(Call::Heartbeat);
        Ok(true)
    }

    fn server_terminate(&mut self) -> RtdResult<()> {
        self.record(Call::Terminate);
        let callback = self.state.lock().unwrap().callback.take();
        if let Some(callback) = callback {
            callback.disconnect()?;
        }
        Ok(())
    }
}

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Harness {
    pub dispatcher: Dispatcher<MockServer, SharedBuffer>,
    pub server: MockServer,
    pub intent: SharedIntent,
    pub flag: NotificationFlag,
    pub notifier: Arc<UpdateNotifier>,
    pub pump: Sender<PumpMessage>,
    pub out: SharedBuffer,
}

pub fn fast_dispatch() -> DispatchConfig {
    DispatchConfig {
        poll_interval_ms: 1,
        health_check_interval_ms: 0,
        ..DispatchConfig::default()
    }
}

/// Dispatcher over a started mock session subscribed to `symbol` on `topic`.
pub fn harness(server: MockServer, topic: &str, symbol: &str) -> Harness {
    let flag = NotificationFlag::new();
    let notifier = UpdateNotifier::new(flag.clone(), Duration::from_millis(100)).into_handle();
    let mut manager = SubscriptionManager::start(
        server.clone(),
        as_event_handle(&notifier),
        Topic::new(topic),
    )
    .unwrap();
    manager
        .connect(&rtd_stream_adapter::Symbol::new(symbol))
        .unwrap();

    let intent = SharedIntent::new();
    let (pump, pump_rx) = mpsc::channel();
    let out = SharedBuffer::new();
    let dispatcher = Dispatcher::new(
        manager,
        intent.clone(),
        flag.clone(),
        pump_rx,
        out.clone(),
        &fast_dispatch(),
    );

    Harness {
        dispatcher,
        server,
        intent,
        flag,
        notifier,
        pump,
        out,
    }
}

/// Strip the `[HH:MM:SS.mmm] ` prefix from a data line.
pub fn strip_timestamp(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let (stamp, rest) = rest.split_once("] ")?;
    (stamp.len() == 12).then_some(rest)
}
