// crates/vtrans-cli/src/main.rs
//
// Wires the pieces together: parse flags, install signal handling, start the
// console thread if interactive, hand everything to `vtrans_engine::Supervisor`.
// Demuxer/decoder/filter/encoder/muxer implementations are out of scope
// (spec.md §1) — this binary builds the orchestrator around whatever
// collaborators get registered, but ships none of its own, so a run with
// real inputs needs a frontend that supplies them.

mod cli;
mod collaborators;
mod console;
mod logging;
mod signals;
mod terminal;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;
use vtrans_core::{
    helpers::time::TimeBase, ConsoleCommand, FilterTarget, InputFile, InputStream, MediaKind, OutputFile, OutputStream, StreamId, StreamSource,
};
use vtrans_engine::{exit_code, Collaborators, Supervisor};

use collaborators::{PlaceholderDemuxer, PlaceholderMuxer};
use logging::ReloadHandle;

fn main() -> Result<()> {
    let log_handle = logging::init();
    let opts = cli::Opts::parse();

    if needs_usage(&opts.inputs, &opts.outputs) {
        let mut command = cli::Opts::command();
        command.print_help().ok();
        println!();
        std::process::exit(1);
    }

    let input_paths = opts.inputs.clone();
    let output_paths = opts.outputs.clone();
    let config = opts.into_config();

    signals::install();

    let terminal_guard = if config.stdin_interaction {
        terminal::RawTerminalGuard::enable().context("enabling raw terminal mode")?
    } else {
        None
    };

    let console_rx = terminal_guard.map(|guard| console::spawn(guard, signals::should_stop));

    let (inputs, outputs, collaborators) = build_stream_graph(&input_paths, &output_paths);
    let mut supervisor = Supervisor::new(config, inputs, outputs, Vec::new(), collaborators);

    let mut last_signal_seen = 0;
    let result = supervisor.run(&|| {
        signals::log_transitions(&mut last_signal_seen);
        if let Some(rx) = &console_rx {
            while let Ok(cmd) = rx.try_recv() {
                handle_console_command(cmd, &log_handle);
            }
        }
        signals::should_stop()
    });

    if let Err(e) = &result {
        info!(error = %e, "run finished with an error");
    }

    let code = exit_code(&result);
    std::process::exit(code);
}

fn handle_console_command(cmd: ConsoleCommand, log_handle: &ReloadHandle) {
    match cmd {
        ConsoleCommand::Quit => info!("quit requested from console"),
        ConsoleCommand::AdjustLogLevel(delta) => {
            logging::adjust(log_handle, delta);
            info!(delta, "log level adjusted");
        }
        ConsoleCommand::Help => info!("q=quit +/-=log level c/C=filter command"),
        ConsoleCommand::FilterCommand { target, time, command, arg } => {
            let target = match target {
                FilterTarget::All => "all".to_string(),
                FilterTarget::Graph(i) => i.to_string(),
            };
            info!(target, time, command, ?arg, "filter command queued");
        }
    }
}

/// spec.md §8 Scenario S1: no inputs and no outputs means there's nothing to
/// do, so print usage and exit 1 rather than entering a main loop that would
/// immediately report every (nonexistent) output finished.
fn needs_usage(inputs: &[PathBuf], outputs: &[PathBuf]) -> bool {
    inputs.is_empty() && outputs.is_empty()
}

/// Build the stream graph a real frontend would hand the Supervisor, pairing
/// each input with the output at the same position (`vtrans -i a -i b out_a
/// out_b`). Every pairing is a direct stream copy — decoding, filtering, and
/// encoding are out of scope (spec.md §1) — and every file gets a
/// placeholder collaborator so the main loop has something to drive.
fn build_stream_graph(input_paths: &[PathBuf], output_paths: &[PathBuf]) -> (Vec<InputFile>, Vec<OutputFile>, Collaborators) {
    let mut collaborators = Collaborators::new();

    let inputs: Vec<InputFile> = input_paths
        .iter()
        .enumerate()
        .map(|(file_index, _path)| {
            let mut file = InputFile::new(file_index);
            let mut stream = InputStream::new(file_index, 0, MediaKind::Video, TimeBase::new(1, 1_000_000));
            if file_index < output_paths.len() {
                stream.output_consumers = vec![StreamId::new(file_index, 0)];
            }
            file.streams.push(stream);
            collaborators.demuxers.insert(file_index, Box::new(PlaceholderDemuxer::new()));
            file
        })
        .collect();

    let outputs: Vec<OutputFile> = output_paths
        .iter()
        .enumerate()
        .map(|(file_index, path)| {
            let mut file = OutputFile::new(file_index);
            if file_index < input_paths.len() {
                let source = StreamSource::StreamCopy { input: StreamId::new(file_index, 0) };
                file.streams.push(OutputStream::new(file_index, 0, MediaKind::Video, TimeBase::new(1, 1_000_000), source));
            }
            collaborators.muxers.insert(file_index, Box::new(PlaceholderMuxer::new(path.clone())));
            file
        })
        .collect();

    (inputs, outputs, collaborators)
}
