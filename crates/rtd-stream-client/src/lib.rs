/*
[INPUT]:  Public API exports for rtd-stream-client crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod input;
pub mod intent;
pub mod notifier;
pub mod session;
pub mod stats;
pub mod subscription;

// Re-export main types for convenience
pub use config::{ClientConfig, DispatchConfig};
pub use dispatch::{DispatchState, Dispatcher, PumpMessage};
pub use error::ClientError;
pub use format::ValueFormatter;
pub use input::{Command, CommandInput, InputExit, spawn_command_input};
pub use intent::{IntentState, SharedIntent};
pub use notifier::{NotificationFlag, UpdateNotifier};
pub use session::{StartupAnswers, print_banner, prompt_startup, run_session};
pub use stats::DispatchStats;
pub use subscription::{Subscription, SubscriptionManager, TOPIC_ID};
