/*
[INPUT]:  CLI arguments, optional YAML configuration file, console, OS shutdown signals
[OUTPUT]: Streaming console session with exit status 0 on clean shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use rtd_stream_adapter::{known_providers, open_provider};
use rtd_stream_client::{ClientConfig, PumpMessage, print_banner, prompt_startup, run_session};

#[derive(Parser, Debug)]
#[command(name = "rtd-stream-client", version, about = "Console client for real-time data providers")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    log_level: String,
    /// Provider name, overriding the configuration file
    #[arg(long = "provider", value_name = "NAME")]
    provider: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();

    let mut config = load_config(args.config_path.as_deref())?;
    if let Some(provider) = args.provider {
        config.provider.name = provider;
    }
    let _log_guard = init_tracing(&args.log_level, config.log_file.as_deref())?;
    info!(provider = %config.provider.name, "starting rtd-stream-client");

    let mut stdout = io::stdout();
    print_banner(&mut stdout, &config.provider.name)?;
    let answers = prompt_startup(&mut io::stdin().lock(), &mut stdout)?;

    let server = open_provider(&config.provider.name, &config.provider)
        .with_context(|| {
            format!(
                "open provider {} (known providers: {})",
                config.provider.name,
                known_providers().join(", ")
            )
        })?;

    let (pump_tx, pump_rx) = mpsc::channel();
    setup_signal_handlers(pump_tx)?;

    let stats = run_session(
        &config,
        server,
        answers,
        BufReader::new(io::stdin()),
        io::stdout(),
        stdout,
        pump_rx,
    )?;
    info!(
        pulls = stats.pulls,
        rows_emitted = stats.rows_emitted,
        "session complete"
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    ClientConfig::from_file(path).with_context(|| format!("load config {}", path.display()))
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let (writer, guard) = match log_file {
        Some(path) => {
            let file_name = path.file_name().context("log_file must name a file")?;
            let directory = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

/// Forward SIGINT/SIGTERM to the dispatch thread as an interrupt message.
///
/// Handlers are registered before this returns, so a signal delivered once
/// the session starts is never lost to the default disposition.
fn setup_signal_handlers(pump: Sender<PumpMessage>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build signal runtime")?;
    let signals = {
        let _entered = runtime.enter();
        ShutdownSignals::install()?
    };

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                signals.recv().await;
                if pump.send(PumpMessage::Interrupt).is_err() {
                    warn!("dispatch loop already stopped");
                }
            });
        })
        .context("spawn signal thread")?;
    Ok(())
}

#[cfg(unix)]
struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("install SIGINT handler")?,
            terminate: signal(SignalKind::terminate()).context("install SIGTERM handler")?,
        })
    }

    async fn recv(mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("received SIGINT"),
            _ = self.terminate.recv() => info!("received SIGTERM"),
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c().context("install Ctrl-C handler")?,
        })
    }

    async fn recv(mut self) {
        self.ctrl_c.recv().await;
        info!("received Ctrl-C");
    }
}
