/*
[INPUT]:  Provider session calls from a client, update signals from a provider
[OUTPUT]: RtdServer (consumed) and UpdateEvent (exposed) contracts
[POS]:    Contract layer - push/pull provider interface boundary
[UPDATE]: When the provider session contract changes
*/

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::types::{RefreshBatch, RtdValue, TopicArgs, TopicId};

/// Shared handle to a client callback object.
///
/// Cloning the handle takes a reference and dropping it releases one; the object
/// is destroyed exactly when the last holder lets go, whichever thread that is.
pub type UpdateEventHandle = Arc<dyn UpdateEvent>;

/// Callback contract a client exposes to a provider.
///
/// Providers may invoke these methods from their own threads, concurrently with
/// the client's dispatch loop.
pub trait UpdateEvent: Send + Sync {
    /// Signal that new data is available to pull.
    fn update_notify(&self) -> Result<()>;

    /// Interval at which the provider may probe the client.
    fn heartbeat_interval(&self) -> Duration;

    /// Negotiated interval proposed by the provider.
    fn set_heartbeat_interval(&self, interval: Duration) -> Result<()>;

    /// The provider is going away.
    fn disconnect(&self) -> Result<()>;
}

/// Provider session contract. Every call is synchronous from the caller's side.
pub trait RtdServer: Send {
    /// Start the session, handing the provider a reference to the callback object.
    fn server_start(&mut self, callback: UpdateEventHandle) -> Result<()>;

    /// Subscribe `args` under `topic_id`, returning the initial value.
    fn connect_data(
        &mut self,
        topic_id: TopicId,
        args: &TopicArgs,
        get_new_values: bool,
    ) -> Result<RtdValue>;

    /// Pull every value that changed since the previous pull.
    fn refresh_data(&mut self) -> Result<RefreshBatch>;

    /// Tear down the subscription registered under `topic_id`.
    fn disconnect_data(&mut self, topic_id: TopicId) -> Result<()>;

    /// Whether the provider session is still healthy.
    fn heartbeat(&mut self) -> Result<bool>;

    /// End the session and release the callback reference.
    fn server_terminate(&mut self) -> Result<()>;
}

impl<T: RtdServer + ?Sized> RtdServer for Box<T> {
    fn server_start(&mut self, callback: UpdateEventHandle) -> Result<()> {
        (**self).server_start(callback)
    }

    fn connect_data(
        &mut self,
        topic_id: TopicId,
        args: &TopicArgs,
        get_new_values: bool,
    ) -> Result<RtdValue> {
        (**self).connect_data(topic_id, args, get_new_values)
    }

    fn refresh_data(&mut self) -> Result<RefreshBatch> {
        (**self).refresh_data()
    }

    fn disconnect_data(&mut self, topic_id: TopicId) -> Result<()> {
        (**self).disconnect_data(topic_id)
    }

    fn heartbeat(&mut self) -> Result<bool> {
        (**self).heartbeat()
    }

    fn server_terminate(&mut self) -> Result<()> {
        (**self).server_terminate()
    }
}
