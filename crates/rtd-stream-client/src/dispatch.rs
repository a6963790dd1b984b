/*
[INPUT]:  Notification flag, shared intent, pump messages, provider batches
[OUTPUT]: Timestamped console lines + session teardown on exit
[POS]:    Dispatch layer - the single thread that talks to the provider
[UPDATE]: When changing loop ordering, pause semantics, or output format
*/

use std::io::Write;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use rtd_stream_adapter::RtdServer;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::ClientError;
use crate::format::ValueFormatter;
use crate::intent::SharedIntent;
use crate::notifier::NotificationFlag;
use crate::stats::DispatchStats;
use crate::subscription::SubscriptionManager;

const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Running,
    Paused,
    ShuttingDown,
}

/// Out-of-band messages for the dispatch thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpMessage {
    Quit,
    Interrupt,
}

pub struct Dispatcher<S: RtdServer, W: Write> {
    manager: SubscriptionManager<S>,
    intent: SharedIntent,
    flag: NotificationFlag,
    pump: Receiver<PumpMessage>,
    out: W,
    formatter: ValueFormatter,
    poll_interval: Duration,
    health_check_interval: Option<Duration>,
    last_health_check: Instant,
    state: DispatchState,
    stats: DispatchStats,
}

impl<S: RtdServer, W: Write> Dispatcher<S, W> {
    pub fn new(
        manager: SubscriptionManager<S>,
        intent: SharedIntent,
        flag: NotificationFlag,
        pump: Receiver<PumpMessage>,
        out: W,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            manager,
            intent,
            flag,
            pump,
            out,
            formatter: ValueFormatter::new(config.value_buffer_len),
            poll_interval: config.poll_interval(),
            health_check_interval: config.health_check_interval(),
            last_health_check: Instant::now(),
            state: DispatchState::Running,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    pub fn manager(&self) -> &SubscriptionManager<S> {
        &self.manager
    }

    /// One loop iteration, without the trailing sleep.
    pub fn step(&mut self) -> Result<DispatchState, ClientError> {
        if self.state == DispatchState::ShuttingDown {
            return Ok(self.state);
        }

        if self.drain_pump()? || self.intent.exit_requested() {
            self.state = DispatchState::ShuttingDown;
            return Ok(self.state);
        }

        self.apply_reconnect()?;

        if self.intent.is_paused() {
            if self.state != DispatchState::Paused {
                debug!("dispatch paused");
            }
            self.state = DispatchState::Paused;
            return Ok(self.state);
        }
        self.state = DispatchState::Running;

        self.check_health();

        if self.flag.take() {
            self.pull_and_emit()?;
        }
        Ok(self.state)
    }

    /// Loop until shutdown, then tear the session down.
    pub fn run(mut self) -> Result<DispatchStats, ClientError> {
        loop {
            match self.step() {
                Ok(DispatchState::ShuttingDown) => break,
                Ok(_) => thread::sleep(self.poll_interval),
                Err(err) => {
                    self.shutdown()?;
                    return Err(err);
                }
            }
        }
        self.shutdown()?;
        Ok(self.stats)
    }

    /// Disconnect and terminate the provider session. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<(), ClientError> {
        self.state = DispatchState::ShuttingDown;
        if self.manager.is_terminated() {
            return Ok(());
        }

        writeln!(self.out, "Cleaning up and exiting")?;
        self.out.flush()?;
        if let Err(err) = self.manager.shutdown() {
            warn!(error = %err, "provider terminate failed");
        }
        info!(
            pulls = self.stats.pulls,
            rows_emitted = self.stats.rows_emitted,
            reconnects = self.stats.reconnects,
            reconnect_failures = self.stats.reconnect_failures,
            "dispatch loop stopped"
        );
        Ok(())
    }

    fn drain_pump(&mut self) -> Result<bool, ClientError> {
        match self.pump.try_recv() {
            Ok(PumpMessage::Quit) => {
                info!("quit message received");
                Ok(true)
            }
            Ok(PumpMessage::Interrupt) => {
                info!("interrupt received");
                writeln!(self.out, "\nShutting down...")?;
                self.intent.request_exit();
                Ok(true)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(false),
        }
    }

    fn apply_reconnect(&mut self) -> Result<(), ClientError> {
        let Some(symbol) = self.intent.take_reconnect() else {
            return Ok(());
        };

        writeln!(self.out, "\nReconnecting with new symbol: {symbol}")?;
        match self.manager.connect(&symbol) {
            Ok(subscription) => {
                writeln!(self.out, "Connected to symbol: {}", subscription.symbol())?;
                self.stats.record_reconnect();
                info!(symbol = %symbol, topic = %subscription.topic(), "reconnected");
            }
            Err(err) => {
                writeln!(self.out, "Connection failed for symbol {symbol}: {err}")?;
                self.stats.record_reconnect_failure();
                warn!(
                    symbol = %symbol,
                    error = %err,
                    rejected = err.is_connect_failure(),
                    "reconnect failed"
                );
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn check_health(&mut self) {
        let Some(every) = self.health_check_interval else {
            return;
        };
        if self.last_health_check.elapsed() < every {
            return;
        }
        self.last_health_check = Instant::now();

        match self.manager.heartbeat() {
            Ok(true) => debug!("provider heartbeat ok"),
            Ok(false) => warn!("provider reports an unhealthy session"),
            Err(err) => warn!(error = %err, "provider heartbeat failed"),
        }
    }

    fn pull_and_emit(&mut self) -> Result<(), ClientError> {
        self.stats.record_pull();
        let batch = match self.manager.refresh() {
            Ok(batch) => batch,
            Err(err) if err.is_fatal() => {
                warn!(error = %err, "refresh failed; provider session is gone");
                self.stats.record_failed_pull();
                return Ok(());
            }
            Err(err) => {
                debug!(error = %err, "refresh failed; skipping iteration");
                self.stats.record_failed_pull();
                return Ok(());
            }
        };

        if batch.is_empty() {
            debug!("refresh returned no rows");
            self.stats.record_empty_pull();
            return Ok(());
        }
        self.stats.record_rows_seen(batch.rows().count());

        let Some(active) = self.manager.active() else {
            debug!(rows = batch.topic_count(), "no active subscription; rows dropped");
            return Ok(());
        };

        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        for row in batch.matching(active.topic_id()) {
            let text = self.formatter.format(&row.value);
            writeln!(self.out, "[{stamp}] {} = {text}", active.symbol())?;
            self.stats.record_emitted();
        }
        self.out.flush()?;
        Ok(())
    }
}
