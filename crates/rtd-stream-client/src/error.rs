/*
[INPUT]:  Provider errors, console I/O failures, configuration and startup input problems
[OUTPUT]: ClientError with fatal-at-startup classification
[POS]:    Error handling layer - client crate error type
[UPDATE]: When adding new client failure modes
*/

use rtd_stream_adapter::RtdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Provider error: {0}")]
    Provider(#[from] RtdError),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard input ended before a startup answer was read
    #[error("Error reading input. Exiting.")]
    InputClosed { field: &'static str },

    #[error("The {field} must not be empty")]
    EmptyInput { field: &'static str },
}
