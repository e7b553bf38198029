// crates/vtrans-cli/src/cli.rs
//
// Command-line flags, kept deliberately separate from `vtrans_core::Config`.
// `Opts::into_config` is the only place that knows how CLI flag names map
// onto the library's field names.

use std::path::PathBuf;

use clap::Parser;
use vtrans_core::{Config, PrintStats};

#[derive(Debug, Parser)]
#[command(name = "vtrans", about = "Output-driven transcoding orchestrator")]
pub struct Opts {
    /// Input file paths, one `-i` per input (order determines file_index).
    #[arg(short = 'i', long = "input")]
    pub inputs: Vec<PathBuf>,

    /// Output file paths, in the order their output files should be created.
    #[arg(value_name = "OUTPUT")]
    pub outputs: Vec<PathBuf>,

    /// Disable the interactive console (`q`/`+`/`-`/`c`/`C` keys).
    #[arg(long)]
    pub no_stdin: bool,

    /// Print per-codec timing stats at exit (ffmpeg's `-benchmark`).
    #[arg(long)]
    pub benchmark: bool,

    /// Like `--benchmark`, but per input/output file rather than totals only.
    #[arg(long)]
    pub benchmark_all: bool,

    /// Suppress ("quiet"), always print to stderr ("stderr"), or route
    /// through the logging backend ("log").
    #[arg(long, value_parser = parse_print_stats, default_value = "quiet")]
    pub stats: PrintStats,

    /// Minimum interval between periodic progress reports, in seconds.
    #[arg(long, default_value_t = 0.5)]
    pub stats_period: f64,

    /// Preserve input timestamps instead of zero-basing them at the first
    /// packet.
    #[arg(long)]
    pub copy_ts: bool,

    #[arg(long)]
    pub start_at_zero: bool,

    /// Abort the affected input immediately on a demuxer error instead of
    /// logging and continuing.
    #[arg(long)]
    pub exit_on_error: bool,

    /// Fraction in `[0, 1]`; exceeding this after the run fails with exit
    /// code 69.
    #[arg(long, default_value_t = 2.0 / 3.0)]
    pub max_error_rate: f64,

    #[arg(long)]
    pub vstats_file: Option<PathBuf>,
}

fn parse_print_stats(s: &str) -> Result<PrintStats, String> {
    match s {
        "quiet" => Ok(PrintStats::Quiet),
        "stderr" => Ok(PrintStats::Stderr),
        "log" => Ok(PrintStats::Log),
        other => Err(format!("invalid --stats value '{other}' (expected quiet|stderr|log)")),
    }
}

impl Opts {
    pub fn into_config(self) -> Config {
        Config {
            stdin_interaction: !self.no_stdin,
            do_benchmark: self.benchmark,
            do_benchmark_all: self.benchmark_all,
            print_stats: self.stats,
            stats_period_us: (self.stats_period * 1_000_000.0) as i64,
            copy_ts: self.copy_ts,
            start_at_zero: self.start_at_zero,
            exit_on_error: self.exit_on_error,
            max_error_rate: self.max_error_rate,
            vstats_filename: self.vstats_file,
        }
    }
}
