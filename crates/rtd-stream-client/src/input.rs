/*
[INPUT]:  Operator lines on a blocking reader (stdin in the binary)
[OUTPUT]: Intent updates + resume prompts; never touches the provider
[POS]:    Input layer - dedicated command thread
[UPDATE]: When adding operator commands or changing prompt text
*/

use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};

use rtd_stream_adapter::Symbol;
use tracing::{debug, warn};

use crate::intent::SharedIntent;

pub const RESUME_PROMPT: &str = "Enter new symbol (or 'quit' to exit): ";
const QUIT_COMMAND: &str = "quit";

/// A single operator line, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Pause,
    ChangeSymbol(Symbol),
}

impl Command {
    /// Only the trailing line terminator is stripped; `quit` must match exactly.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == QUIT_COMMAND {
            Command::Quit
        } else if line.is_empty() {
            Command::Pause
        } else {
            Command::ChangeSymbol(Symbol::new(line))
        }
    }
}

/// Read one line, decoding invalid UTF-8 with replacement characters.
///
/// Returns `None` at end of input.
pub fn read_line_lossy<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Why the input loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputExit {
    Quit,
    EndOfInput,
    ExitRequested,
    ReadFailed,
}

pub struct CommandInput<R, W> {
    reader: R,
    prompt_out: W,
    intent: SharedIntent,
}

impl<R: BufRead, W: Write> CommandInput<R, W> {
    pub fn new(reader: R, prompt_out: W, intent: SharedIntent) -> Self {
        Self {
            reader,
            prompt_out,
            intent,
        }
    }

    pub fn run(mut self) -> InputExit {
        let mut buf = Vec::new();
        loop {
            if self.intent.exit_requested() {
                return InputExit::ExitRequested;
            }
            if self.intent.is_paused() {
                self.prompt(RESUME_PROMPT);
            }

            let line = match read_line_lossy(&mut self.reader, &mut buf) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("command input reached end of stream");
                    return InputExit::EndOfInput;
                }
                Err(err) => {
                    warn!(error = %err, "command input read failed");
                    return InputExit::ReadFailed;
                }
            };

            match Command::parse(&line) {
                Command::Quit => {
                    self.prompt("\nShutting down...\n");
                    self.intent.request_exit();
                    return InputExit::Quit;
                }
                Command::Pause => {
                    debug!("pause requested");
                    self.intent.request_pause();
                }
                Command::ChangeSymbol(symbol) => {
                    debug!(symbol = %symbol, "symbol change requested");
                    self.intent.request_symbol(symbol);
                }
            }
        }
    }

    fn prompt(&mut self, text: &str) {
        let written = self
            .prompt_out
            .write_all(text.as_bytes())
            .and_then(|()| self.prompt_out.flush());
        if let Err(err) = written {
            debug!(error = %err, "prompt write failed");
        }
    }
}

/// Run `input` on its own named thread.
pub fn spawn_command_input<R, W>(input: CommandInput<R, W>) -> io::Result<JoinHandle<InputExit>>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("command-input".to_string())
        .spawn(move || input.run())
}
