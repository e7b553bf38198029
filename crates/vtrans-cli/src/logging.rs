// crates/vtrans-cli/src/logging.rs
//
// Runtime-adjustable log level, driven by the console's `+`/`-` keys (ten
// per step, mirroring FFmpeg's own `AV_LOG_*` scale). Built on an
// `EnvFilter`-based subscriber init, extended with a `reload::Handle` so the
// level can change after startup without a restart.

use std::sync::atomic::{AtomicI32, Ordering};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

static LEVEL_OFFSET: AtomicI32 = AtomicI32::new(0);

pub type ReloadHandle = reload::Handle<EnvFilter, Registry>;

/// Initialize the global subscriber, honoring `RUST_LOG` if set and
/// defaulting to `info` otherwise. Returns a handle the console uses to
/// change the level later.
pub fn init() -> ReloadHandle {
    let initial = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

/// Map the `+10`/`-10`-stepped console offset onto a `LevelFilter`: `0` is
/// the baseline (`info`), each `+10` one step quieter, each `-10` one step
/// louder — the same step-by-ten shape as FFmpeg's own log levels.
fn level_for(offset: i32) -> LevelFilter {
    match offset {
        o if o <= -20 => LevelFilter::TRACE,
        -19..=-10 => LevelFilter::DEBUG,
        -9..=9 => LevelFilter::INFO,
        10..=19 => LevelFilter::WARN,
        _ => LevelFilter::ERROR,
    }
}

/// Apply a console `+10`/`-10` adjustment, updating the live filter.
pub fn adjust(handle: &ReloadHandle, delta: i32) {
    let new_offset = LEVEL_OFFSET.load(Ordering::SeqCst) + delta;
    LEVEL_OFFSET.store(new_offset, Ordering::SeqCst);
    let level = level_for(new_offset);
    let _ = handle.reload(EnvFilter::new(level.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_offset_is_info() {
        assert_eq!(level_for(0), LevelFilter::INFO);
    }

    #[test]
    fn positive_offsets_get_quieter() {
        assert_eq!(level_for(10), LevelFilter::WARN);
        assert_eq!(level_for(20), LevelFilter::ERROR);
    }

    #[test]
    fn negative_offsets_get_louder() {
        assert_eq!(level_for(-10), LevelFilter::DEBUG);
        assert_eq!(level_for(-20), LevelFilter::TRACE);
    }
}
