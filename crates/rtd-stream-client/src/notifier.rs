/*
[INPUT]:  Update signals from provider threads
[OUTPUT]: Coalescing notification flag + callback object handed to the provider
[POS]:    Callback layer - provider-to-client signalling (no data transfer)
[UPDATE]: When changing how update signals are recorded or consumed
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rtd_stream_adapter::{Result as RtdResult, UpdateEvent, UpdateEventHandle};
use tracing::{debug, info};

/// One-bit "data is waiting" signal shared between a provider and the dispatch loop.
///
/// Any number of raises before a take collapse into a single pull.
#[derive(Debug, Clone, Default)]
pub struct NotificationFlag(Arc<AtomicBool>);

impl NotificationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Test-and-clear. Returns true at most once per burst of raises.
    pub fn take(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Callback object exposed to the provider.
#[derive(Debug)]
pub struct UpdateNotifier {
    flag: NotificationFlag,
    heartbeat_interval: Duration,
    signals: AtomicU64,
    provider_disconnects: AtomicU64,
}

impl UpdateNotifier {
    pub fn new(flag: NotificationFlag, heartbeat_interval: Duration) -> Self {
        Self {
            flag,
            heartbeat_interval,
            signals: AtomicU64::new(0),
            provider_disconnects: AtomicU64::new(0),
        }
    }

    /// Wrap into the shared handle the provider contract expects.
    pub fn into_handle(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn signals(&self) -> u64 {
        self.signals.load(Ordering::Relaxed)
    }

    pub fn provider_disconnects(&self) -> u64 {
        self.provider_disconnects.load(Ordering::Relaxed)
    }
}

impl UpdateEvent for UpdateNotifier {
    fn update_notify(&self) -> RtdResult<()> {
        self.flag.raise();
        self.signals.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    fn set_heartbeat_interval(&self, interval: Duration) -> RtdResult<()> {
        debug!(
            proposed_ms = interval.as_millis() as u64,
            kept_ms = self.heartbeat_interval.as_millis() as u64,
            "provider proposed heartbeat interval"
        );
        Ok(())
    }

    fn disconnect(&self) -> RtdResult<()> {
        self.provider_disconnects.fetch_add(1, Ordering::Relaxed);
        info!("provider signalled disconnect");
        Ok(())
    }
}

/// Upcast a notifier to the handle type providers receive.
pub fn as_event_handle(notifier: &Arc<UpdateNotifier>) -> UpdateEventHandle {
    notifier.clone()
}
