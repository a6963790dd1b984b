/*
[INPUT]:  Values produced by provider workers, pulls from the client
[OUTPUT]: Coalesced per-topic pending values + update signals to the callback
[POS]:    Provider internals - shared queue between worker and session
[UPDATE]: When changing how providers buffer values between pulls
*/

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::provider::UpdateEventHandle;
use crate::types::{RefreshBatch, RefreshRow, RtdValue, TopicId};

/// Identifies one connect of a topic-id. A reconnect under the same id gets a new one.
pub(crate) type Generation = u64;

#[derive(Default)]
struct QueueState {
    pending: BTreeMap<TopicId, RtdValue>,
    generations: HashMap<TopicId, Generation>,
    next_generation: Generation,
    callback: Option<UpdateEventHandle>,
}

/// Latest-value-per-topic buffer. A newer value for a topic replaces the older one,
/// so a pull always returns the current state rather than a history.
///
/// Values are tagged with the generation they were produced for; a value whose
/// topic-id has since been forgotten or reconnected is discarded on publish.
#[derive(Default)]
pub(crate) struct UpdateQueue {
    state: Mutex<QueueState>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attach(&self, callback: UpdateEventHandle) {
        self.lock().callback = Some(callback);
    }

    /// Drop the held callback reference and any undelivered values.
    pub(crate) fn detach(&self) -> Option<UpdateEventHandle> {
        let mut state = self.lock();
        state.pending.clear();
        state.generations.clear();
        state.callback.take()
    }

    /// Detach and tell the client the provider is going away.
    pub(crate) fn release(&self) {
        let Some(callback) = self.detach() else {
            return;
        };
        if let Err(err) = callback.disconnect() {
            warn!(error = %err, "disconnect notification rejected by client");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_attached(&self) -> bool {
        self.lock().callback.is_some()
    }

    /// Start a new generation for `topic_id`, discarding anything queued for the old one.
    pub(crate) fn open(&self, topic_id: TopicId) -> Generation {
        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        state.generations.insert(topic_id, generation);
        state.pending.remove(&topic_id);
        generation
    }

    /// Queue `value` for `topic_id` and signal the callback.
    ///
    /// Returns false when `generation` is no longer current for the topic-id.
    pub(crate) fn publish(&self, topic_id: TopicId, generation: Generation, value: RtdValue) -> bool {
        let callback = {
            let mut state = self.lock();
            if state.generations.get(&topic_id) != Some(&generation) {
                debug!(topic_id, generation, "stale value dropped");
                return false;
            }
            state.pending.insert(topic_id, value);
            state.callback.clone()
        };

        // Signal outside the lock; the callback may re-enter the session.
        if let Some(callback) = callback {
            if let Err(err) = callback.update_notify() {
                warn!(topic_id, error = %err, "update notify rejected by client");
            }
        } else {
            debug!(topic_id, "value queued with no callback attached");
        }
        true
    }

    pub(crate) fn drain(&self) -> RefreshBatch {
        let pending = std::mem::take(&mut self.lock().pending);
        let rows = pending
            .into_iter()
            .map(|(topic_id, value)| RefreshRow { topic_id, value })
            .collect();
        RefreshBatch::new(rows)
    }

    pub(crate) fn forget(&self, topic_id: TopicId) {
        let mut state = self.lock();
        state.pending.remove(&topic_id);
        state.generations.remove(&topic_id);
    }
}
