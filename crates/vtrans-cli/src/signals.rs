// crates/vtrans-cli/src/signals.rs
//
// C1: signal handling with escalation. The handler itself only increments
// an atomic counter and, past the threshold, calls `_exit` directly — both
// async-signal-safe operations. Anything that isn't (logging, flushing
// files) happens back on the main thread, which polls the counter once per
// main-loop iteration and reacts to the transition it sees.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{error, warn};

static SIGNAL_COUNT: AtomicU32 = AtomicU32::new(0);

/// Past this many signals, further graceful attempts have clearly failed;
/// the handler exits the process immediately instead of incrementing again.
const HARD_EXIT_THRESHOLD: u32 = 4;
/// Matches ffmpeg's own convention for "killed after ignoring shutdown".
const HARD_EXIT_CODE: i32 = 123;

extern "C" fn handle_signal(_signum: libc::c_int) {
    let count = SIGNAL_COUNT.fetch_add(1, Ordering::SeqCst) + 1;
    if count >= HARD_EXIT_THRESHOLD {
        unsafe { libc::_exit(HARD_EXIT_CODE) };
    }
}

/// Install handlers for SIGINT and SIGTERM. Safe to call once at startup.
pub fn install() {
    unsafe {
        libc::signal(libc::SIGINT, handle_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_signal as libc::sighandler_t);
    }
}

/// How many signals have arrived so far this run.
pub fn count() -> u32 {
    SIGNAL_COUNT.load(Ordering::SeqCst)
}

/// Whether the main loop should start winding down.
pub fn should_stop() -> bool {
    count() >= 1
}

/// Call once per main-loop tick; logs the first occurrence of each signal
/// count transition so repeated Ctrl-C presses are visible without the
/// handler itself doing any logging.
pub fn log_transitions(last_seen: &mut u32) {
    let current = count();
    if current > *last_seen {
        for n in (*last_seen + 1)..=current.min(HARD_EXIT_THRESHOLD - 1) {
            warn!(signal_count = n, "shutdown requested, finishing in-flight work");
        }
        if current >= HARD_EXIT_THRESHOLD {
            error!("repeated shutdown signal, exiting immediately");
        }
        *last_seen = current;
    }
}
