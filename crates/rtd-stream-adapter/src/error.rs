/*
[INPUT]:  Error sources (provider lookup, session lifecycle, WebSocket, serialization)
[OUTPUT]: Structured error types with fatal/recoverable classification
[POS]:    Error handling layer - unified error type for the provider contract
[UPDATE]: When adding new provider failure modes
*/

use thiserror::Error;

use crate::types::TopicId;

/// Main error type for provider sessions
#[derive(Error, Debug)]
pub enum RtdError {
    /// No provider is registered under the requested well-known name
    #[error("Provider not found: {name}")]
    ProviderNotFound { name: String },

    /// A call was made before `server_start` succeeded
    #[error("Provider session not started")]
    NotStarted,

    /// `server_start` was called twice on the same session
    #[error("Provider session already started")]
    AlreadyStarted,

    /// The provider could not bring its session up
    #[error("Provider failed to start: {0}")]
    StartFailed(String),

    /// The provider rejected a subscription request
    #[error("Connect failed for topic {topic_id}: {reason}")]
    ConnectFailed { topic_id: TopicId, reason: String },

    /// The requested topic is not served by this provider
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Malformed argument list
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Pull of refreshed data failed
    #[error("Refresh failed: {0}")]
    Refresh(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The session was already terminated
    #[error("Provider session terminated")]
    Terminated,
}

impl RtdError {
    /// Check if the session cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RtdError::ProviderNotFound { .. }
                | RtdError::StartFailed(_)
                | RtdError::NotStarted
                | RtdError::Terminated
        )
    }

    /// Check if the error is a rejected subscription request
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            RtdError::ConnectFailed { .. }
                | RtdError::UnknownTopic(_)
                | RtdError::InvalidArguments(_)
        )
    }

    /// Create a connect error for a topic-id
    pub fn connect_failed(topic_id: TopicId, reason: impl Into<String>) -> Self {
        RtdError::ConnectFailed {
            topic_id,
            reason: reason.into(),
        }
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, RtdError>;
