/*
[INPUT]:  Subscriptions (topic, symbol) and simulation settings
[OUTPUT]: Random-walk values pushed through the update callback, pulled as batches
[POS]:    Provider layer - in-process provider for offline use and tests
[UPDATE]: When adding simulated topics or changing the walk model
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, RtdError};
use crate::pending::{Generation, UpdateQueue};
use crate::provider::{RtdServer, UpdateEventHandle};
use crate::types::{RefreshBatch, RtdValue, TopicArgs, TopicId};

const SPREAD_RATIO: f64 = 0.0005;

/// Settings for the simulated provider
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimSettings {
    /// Interval between generated updates
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Maximum relative price move per tick
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// Fixed RNG seed for reproducible walks
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            volatility: default_volatility(),
            seed: None,
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_volatility() -> f64 {
    0.002
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimField {
    Last,
    Bid,
    Ask,
    Mark,
    Volume,
    Description,
    Time,
}

impl SimField {
    fn parse(topic: &str) -> Option<Self> {
        match topic.to_ascii_uppercase().as_str() {
            "LAST" => Some(SimField::Last),
            "BID" => Some(SimField::Bid),
            "ASK" => Some(SimField::Ask),
            "MARK" => Some(SimField::Mark),
            "VOLUME" => Some(SimField::Volume),
            "DESCRIPTION" => Some(SimField::Description),
            "TIME" => Some(SimField::Time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct SimTopic {
    symbol: String,
    field: SimField,
    generation: Generation,
    price: f64,
    volume: i32,
}

impl SimTopic {
    fn new(symbol: &str, field: SimField, generation: Generation) -> Self {
        Self {
            symbol: symbol.to_string(),
            field,
            generation,
            price: seed_price(symbol),
            volume: 0,
        }
    }

    fn step(&mut self, rng: &mut StdRng, volatility: f64) {
        let change = rng.gen_range(-volatility..=volatility);
        self.price = (self.price * (1.0 + change)).max(0.01);
        self.volume = self.volume.saturating_add(rng.gen_range(1..=500));
    }

    fn value(&self) -> RtdValue {
        let spread = self.price * SPREAD_RATIO;
        match self.field {
            SimField::Last | SimField::Mark => RtdValue::Double(self.price),
            SimField::Bid => RtdValue::Double(self.price - spread),
            SimField::Ask => RtdValue::Double(self.price + spread),
            SimField::Volume => RtdValue::Int(self.volume),
            SimField::Description => RtdValue::Text(format!("{} simulated", self.symbol)),
            SimField::Time => RtdValue::Text(chrono::Local::now().format("%H:%M:%S").to_string()),
        }
    }
}

type TopicTable = Arc<Mutex<HashMap<TopicId, SimTopic>>>;

fn lock_topics(topics: &TopicTable) -> MutexGuard<'_, HashMap<TopicId, SimTopic>> {
    topics.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process provider producing random-walk values.
pub struct SimulatedRtdServer {
    settings: SimSettings,
    queue: Arc<UpdateQueue>,
    topics: TopicTable,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    terminated: bool,
}

impl SimulatedRtdServer {
    pub fn new(settings: SimSettings) -> Self {
        Self {
            settings,
            queue: Arc::new(UpdateQueue::new()),
            topics: Arc::new(Mutex::new(HashMap::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
            terminated: false,
        }
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn connected_topics(&self) -> usize {
        lock_topics(&self.topics).len()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        if self.worker.is_none() {
            return Err(RtdError::NotStarted);
        }
        Ok(())
    }

    fn spawn_worker(&self) -> std::io::Result<JoinHandle<()>> {
        let queue = self.queue.clone();
        let topics = self.topics.clone();
        let shutdown = self.shutdown.clone();
        let tick = Duration::from_millis(self.settings.tick_interval_ms.max(1));
        let volatility = self.settings.volatility;
        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        thread::Builder::new()
            .name("sim-rtd-ticker".to_string())
            .spawn(move || {
                debug!(?tick, "simulated provider ticker started");
                while !shutdown.load(Ordering::SeqCst) {
                    thread::park_timeout(tick);
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }

                    let updates: Vec<(TopicId, Generation, RtdValue)> = {
                        let mut topics = lock_topics(&topics);
                        topics
                            .iter_mut()
                            .map(|(topic_id, topic)| {
                                topic.step(&mut rng, volatility);
                                (*topic_id, topic.generation, topic.value())
                            })
                            .collect()
                    };

                    for (topic_id, generation, value) in updates {
                        queue.publish(topic_id, generation, value);
                    }
                }
                debug!("simulated provider ticker stopped");
            })
    }
}

impl RtdServer for SimulatedRtdServer {
    fn server_start(&mut self, callback: UpdateEventHandle) -> Result<()> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        if self.worker.is_some() {
            return Err(RtdError::AlreadyStarted);
        }
        if !(self.settings.volatility > 0.0 && self.settings.volatility <= 1.0) {
            return Err(RtdError::StartFailed(format!(
                "volatility must be within (0, 1], got {}",
                self.settings.volatility
            )));
        }

        self.queue.attach(callback);
        let worker = self.spawn_worker().map_err(|err| {
            self.queue.detach();
            RtdError::StartFailed(err.to_string())
        })?;
        self.worker = Some(worker);

        info!(
            tick_interval_ms = self.settings.tick_interval_ms,
            "simulated provider started"
        );
        Ok(())
    }

    fn connect_data(
        &mut self,
        topic_id: TopicId,
        args: &TopicArgs,
        get_new_values: bool,
    ) -> Result<RtdValue> {
        self.ensure_running()?;

        let field = SimField::parse(args.topic().as_str())
            .ok_or_else(|| RtdError::UnknownTopic(args.topic().to_string()))?;

        let symbol = args.symbol().as_str();
        if !is_valid_symbol(symbol) {
            return Err(RtdError::connect_failed(
                topic_id,
                format!("unknown symbol {symbol:?}"),
            ));
        }

        let topic = SimTopic::new(symbol, field, self.queue.open(topic_id));
        let initial = topic.value();
        lock_topics(&self.topics).insert(topic_id, topic);
        debug!(topic_id, symbol, topic = %args.topic(), "simulated topic connected");

        Ok(if get_new_values {
            initial
        } else {
            RtdValue::empty()
        })
    }

    fn refresh_data(&mut self) -> Result<RefreshBatch> {
        self.ensure_running()?;
        Ok(self.queue.drain())
    }

    fn disconnect_data(&mut self, topic_id: TopicId) -> Result<()> {
        self.ensure_running()?;
        if lock_topics(&self.topics).remove(&topic_id).is_none() {
            debug!(topic_id, "disconnect for unknown topic ignored");
        }
        self.queue.forget(topic_id);
        Ok(())
    }

    fn heartbeat(&mut self) -> Result<bool> {
        self.ensure_running()?;
        Ok(self
            .worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished()))
    }

    fn server_terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        self.terminated = true;
        self.shutdown.store(true, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            worker.thread().unpark();
            if worker.join().is_err() {
                warn!("simulated provider ticker panicked");
            }
        }

        lock_topics(&self.topics).clear();
        self.queue.release();
        info!("simulated provider terminated");
        Ok(())
    }
}

impl Drop for SimulatedRtdServer {
    fn drop(&mut self) {
        if !self.terminated && self.worker.is_some() {
            if let Err(err) = self.server_terminate() {
                warn!(error = %err, "simulated provider terminate failed during drop");
            }
        }
    }
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | '_'))
}

fn seed_price(symbol: &str) -> f64 {
    let sum: u32 = symbol.bytes().map(u32::from).sum();
    10.0 + f64::from(sum % 490)
}
