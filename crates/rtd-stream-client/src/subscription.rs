/*
[INPUT]:  A started provider session plus operator-chosen symbols
[OUTPUT]: At most one live subscription under a fixed topic-id
[POS]:    Session layer - owns the provider and the active subscription
[UPDATE]: When changing subscription lifetime or session teardown ordering
*/

use rtd_stream_adapter::{
    RefreshBatch, Result as RtdResult, RtdError, RtdServer, RtdValue, Symbol, Topic, TopicArgs,
    TopicId, UpdateEventHandle,
};
use tracing::{debug, info, warn};

/// The client only ever registers one subscription, always under this id.
pub const TOPIC_ID: TopicId = 1;

/// The live subscription and the argument list it was registered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    topic_id: TopicId,
    args: TopicArgs,
}

impl Subscription {
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn symbol(&self) -> &Symbol {
        self.args.symbol()
    }

    pub fn topic(&self) -> &Topic {
        self.args.topic()
    }
}

/// Provider session owner.
///
/// Guarantees at most one active subscription and a single session terminate,
/// including on drop.
pub struct SubscriptionManager<S: RtdServer> {
    server: S,
    topic: Topic,
    active: Option<Subscription>,
    terminated: bool,
}

impl<S: RtdServer> SubscriptionManager<S> {
    /// Start the provider session and hand it a reference to `callback`.
    pub fn start(mut server: S, callback: UpdateEventHandle, topic: Topic) -> RtdResult<Self> {
        if topic.is_empty() {
            return Err(RtdError::InvalidArguments("empty topic".to_string()));
        }
        server.server_start(callback)?;
        info!(topic = %topic, "provider session started");
        Ok(Self {
            server,
            topic,
            active: None,
            terminated: false,
        })
    }

    /// Replace the active subscription with one for `symbol`.
    ///
    /// The previous subscription is torn down before the new one is attempted, so
    /// a rejected symbol leaves no subscription active.
    pub fn connect(&mut self, symbol: &Symbol) -> RtdResult<&Subscription> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        if symbol.is_empty() {
            return Err(RtdError::InvalidArguments("empty symbol".to_string()));
        }

        self.disconnect();

        let args = TopicArgs::new(self.topic.clone(), symbol.clone());
        let initial: RtdValue = self.server.connect_data(TOPIC_ID, &args, true)?;
        debug!(
            topic_id = TOPIC_ID,
            symbol = %symbol,
            initial = ?initial,
            "subscription connected"
        );

        Ok(self.active.insert(Subscription {
            topic_id: TOPIC_ID,
            args,
        }))
    }

    /// Tear down the active subscription, if any.
    pub fn disconnect(&mut self) -> Option<Subscription> {
        let previous = self.active.take()?;
        if let Err(err) = self.server.disconnect_data(previous.topic_id) {
            warn!(
                topic_id = previous.topic_id,
                symbol = %previous.symbol(),
                error = %err,
                "disconnect failed"
            );
        }
        Some(previous)
    }

    pub fn active(&self) -> Option<&Subscription> {
        self.active.as_ref()
    }

    pub fn refresh(&mut self) -> RtdResult<RefreshBatch> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        self.server.refresh_data()
    }

    pub fn heartbeat(&mut self) -> RtdResult<bool> {
        if self.terminated {
            return Err(RtdError::Terminated);
        }
        self.server.heartbeat()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    /// Disconnect and terminate the provider session. Later calls are no-ops.
    pub fn shutdown(&mut self) -> RtdResult<()> {
        if self.terminated {
            return Ok(());
        }
        self.disconnect();
        self.terminated = true;
        self.server.server_terminate()?;
        info!("provider session terminated");
        Ok(())
    }
}

impl<S: RtdServer> Drop for SubscriptionManager<S> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "provider terminate failed during drop");
        }
    }
}
