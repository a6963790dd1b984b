/*
[INPUT]:  Console reader/writer, a provider session, loaded configuration
[OUTPUT]: Startup prompts, initial subscription, and a dispatch run to completion
[POS]:    Orchestration layer - wires notifier, intent, input thread and dispatcher
[UPDATE]: When changing startup flow or thread wiring
*/

use std::io::{BufRead, Write};
use std::sync::mpsc::Receiver;

use console::style;
use rtd_stream_adapter::{RtdServer, Symbol, Topic, truncate_chars};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::dispatch::{Dispatcher, PumpMessage};
use crate::error::ClientError;
use crate::input::{CommandInput, read_line_lossy, spawn_command_input};
use crate::intent::SharedIntent;
use crate::notifier::{NotificationFlag, UpdateNotifier, as_event_handle};
use crate::stats::DispatchStats;
use crate::subscription::SubscriptionManager;

pub const SYMBOL_PROMPT: &str = "Enter stock symbol: ";
pub const TOPIC_PROMPT: &str = "Enter data topic (LAST, BID, ASK, etc): ";

/// Symbol and topic chosen at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupAnswers {
    pub symbol: Symbol,
    pub topic: Topic,
}

pub fn print_banner<W: Write>(out: &mut W, provider: &str) -> std::io::Result<()> {
    writeln!(out, "{}", style("RTD Streaming Client").bold())?;
    writeln!(out, "Provider: {provider}")?;
    writeln!(out, "Press \"Enter\" at any time to change symbols or to exit")?;
    writeln!(out)?;
    out.flush()
}

/// Ask for the symbol, then the topic.
pub fn prompt_startup<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
) -> Result<StartupAnswers, ClientError> {
    let symbol = prompt_line(reader, out, SYMBOL_PROMPT, "symbol")?;
    let topic = prompt_line(reader, out, TOPIC_PROMPT, "topic")?;
    Ok(StartupAnswers {
        symbol: Symbol::new(&symbol),
        topic: Topic::new(&topic),
    })
}

fn prompt_line<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    prompt: &str,
    field: &'static str,
) -> Result<String, ClientError> {
    write!(out, "{prompt}")?;
    out.flush()?;

    let Some(line) = read_line_lossy(reader, &mut Vec::new())? else {
        return Err(ClientError::InputClosed { field });
    };
    let answer = line.trim_end_matches(['\r', '\n']);
    if answer.is_empty() {
        return Err(ClientError::EmptyInput { field });
    }
    Ok(truncate_chars(answer, Symbol::capacity()))
}

/// Start `server`, subscribe the startup symbol, then run the dispatch loop until exit.
///
/// `commands` feeds the input thread; `out` receives data lines and status messages.
pub fn run_session<S, R, P, W>(
    config: &ClientConfig,
    server: S,
    answers: StartupAnswers,
    commands: R,
    prompt_out: P,
    mut out: W,
    pump: Receiver<PumpMessage>,
) -> Result<DispatchStats, ClientError>
where
    S: RtdServer,
    R: BufRead + Send + 'static,
    P: Write + Send + 'static,
    W: Write,
{
    let flag = NotificationFlag::new();
    let notifier = UpdateNotifier::new(flag.clone(), config.dispatch.heartbeat_interval()).into_handle();

    let mut manager = SubscriptionManager::start(server, as_event_handle(&notifier), answers.topic.clone())?;
    writeln!(out, "RTD server connection established successfully")?;

    match manager.connect(&answers.symbol) {
        Ok(subscription) => {
            writeln!(out, "Connected to symbol: {}", subscription.symbol())?;
        }
        Err(err) => {
            writeln!(out, "Connection failed for symbol {}: {err}", answers.symbol)?;
            if let Err(shutdown_err) = manager.shutdown() {
                warn!(error = %shutdown_err, "provider terminate failed");
            }
            return Err(err.into());
        }
    }
    out.flush()?;

    let intent = SharedIntent::new();
    // Detached: the reader may stay blocked on stdin after the dispatcher exits.
    let _input = spawn_command_input(CommandInput::new(commands, prompt_out, intent.clone()))?;

    let stats = Dispatcher::new(manager, intent, flag, pump, out, &config.dispatch).run()?;
    info!(
        signals = notifier.signals(),
        provider_disconnects = notifier.provider_disconnects(),
        "session finished"
    );
    Ok(stats)
}
