// crates/vtrans-cli/src/console.rs
//
// C9: the interactive console. Polls raw stdin for the single-key commands
// (`q`, `+`, `-`, `?`) and, on `c`/`C`, switches into line-buffering mode
// until Enter so the rest of spec.md §4.9's filter-command grammar can be
// parsed by `vtrans_core::parse_filter_command`. Runs on its own thread and
// hands parsed commands back over a bounded channel, keeping raw terminal
// I/O off the main loop entirely.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;
use vtrans_core::{parse_filter_command, ConsoleCommand};

use crate::terminal::RawTerminalGuard;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum ReadState {
    Idle,
    BufferingLine { broadcast: bool, line: String },
}

/// Feeds raw bytes through the single-key / line-buffered state machine and
/// yields a `ConsoleCommand` once a full command is recognized.
pub struct ConsoleReader {
    state: ReadState,
}

impl ConsoleReader {
    pub fn new() -> Self {
        Self { state: ReadState::Idle }
    }

    pub fn feed(&mut self, byte: u8) -> Option<ConsoleCommand> {
        match &mut self.state {
            ReadState::Idle => match byte {
                b'q' => Some(ConsoleCommand::Quit),
                b'?' => Some(ConsoleCommand::Help),
                b'+' => Some(ConsoleCommand::AdjustLogLevel(10)),
                b'-' => Some(ConsoleCommand::AdjustLogLevel(-10)),
                b'c' => {
                    self.state = ReadState::BufferingLine { broadcast: false, line: String::new() };
                    None
                }
                b'C' => {
                    self.state = ReadState::BufferingLine { broadcast: true, line: String::new() };
                    None
                }
                _ => None,
            },
            ReadState::BufferingLine { broadcast, line } => {
                if byte == b'\n' || byte == b'\r' {
                    let is_broadcast = *broadcast;
                    let full_line = std::mem::take(line);
                    self.state = ReadState::Idle;
                    match parse_filter_command(is_broadcast, &full_line) {
                        Ok(cmd) => Some(cmd),
                        Err(e) => {
                            debug!(error = %e, "discarding malformed console command");
                            None
                        }
                    }
                } else {
                    line.push(byte as char);
                    None
                }
            }
        }
    }
}

impl Default for ConsoleReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the console-polling thread. Returns the receiving half of the
/// channel it feeds; the sender is moved into the thread. The thread exits
/// once `should_stop` reports true or `terminal` is dropped.
pub fn spawn(terminal: RawTerminalGuard, should_stop: impl Fn() -> bool + Send + 'static) -> Receiver<ConsoleCommand> {
    let (tx, rx): (Sender<ConsoleCommand>, Receiver<ConsoleCommand>) = bounded(16);

    thread::spawn(move || {
        let mut reader = ConsoleReader::new();
        while !should_stop() {
            match terminal.poll_byte() {
                Ok(Some(byte)) => {
                    if let Some(cmd) = reader.feed(byte) {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(_) => break,
            }
        }
    });

    rx
}
