/*
[INPUT]:  WebSocket URL and price subscriptions
[OUTPUT]: StandX price stream exposed through the provider session contract
[POS]:    WebSocket layer - real-time data stream provider
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod message;
pub mod server;

pub use client::{StandxWebSocket, WebSocketMessage};
pub use message::{PriceData, PriceField};
pub use server::{StandxRtdServer, StandxSettings};
