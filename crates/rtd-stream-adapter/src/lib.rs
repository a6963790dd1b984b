/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public provider contract, data types and provider implementations
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod error;
pub mod provider;
pub mod registry;
pub mod sim;
pub mod types;
pub mod ws;

mod pending;

pub use error::{Result, RtdError};

pub use provider::{RtdServer, UpdateEvent, UpdateEventHandle};

pub use registry::{
    ProviderSettings,
    SIM_PROVIDER,
    STANDX_PROVIDER,
    known_providers,
    open_provider,
};

pub use sim::{SimSettings, SimulatedRtdServer};

// Re-export all types
pub use types::*;

pub use ws::{PriceData, PriceField, StandxRtdServer, StandxSettings, StandxWebSocket, WebSocketMessage};
