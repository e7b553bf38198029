// crates/vtrans-core/src/config.rs
//
// Library-level configuration — the orchestrator's contract with whatever
// parses the CLI (spec.md §6 "External Interfaces"). Deliberately separate
// from any clap flag struct: vtrans-cli owns the clap struct and maps it
// into this one, so the engine stays usable from tests or other frontends
// without pulling in clap.

use std::path::PathBuf;

/// `print_stats` policy (spec.md §6): 0 = quiet, 1 = stderr unconditionally,
/// 2 = via the logging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintStats {
    Quiet,
    Stderr,
    Log,
}

impl Default for PrintStats {
    fn default() -> Self {
        PrintStats::Quiet
    }
}

/// Global options threaded through the orchestrator. Constructed once by the
/// CLI frontend, read (never mutated) by `vtrans-engine::Supervisor`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable interactive key handling (raw TTY mode, `q`/`+`/`-`/`c`/`C`).
    pub stdin_interaction: bool,
    pub do_benchmark: bool,
    pub do_benchmark_all: bool,
    pub print_stats: PrintStats,
    /// Minimum interval between periodic reports, canonical microseconds.
    pub stats_period_us: i64,
    /// Preserve input timestamps rather than zero-basing them.
    pub copy_ts: bool,
    pub start_at_zero: bool,
    /// Abort the affected InputFile immediately on a demuxer error instead
    /// of logging and continuing.
    pub exit_on_error: bool,
    /// Fraction in `[0, 1]`; exceeding this after the main loop is fatal
    /// (exit code 69).
    pub max_error_rate: f64,
    pub vstats_filename: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stdin_interaction: false,
            do_benchmark: false,
            do_benchmark_all: false,
            print_stats: PrintStats::default(),
            stats_period_us: 500_000,
            copy_ts: false,
            start_at_zero: false,
            exit_on_error: false,
            max_error_rate: 2.0 / 3.0,
            vstats_filename: None,
        }
    }
}
