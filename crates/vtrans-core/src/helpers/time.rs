// crates/vtrans-core/src/helpers/time.rs
//
// Shared timestamp rescaling and human-readable time formatting. Every
// component that touches a DTS/PTS goes through `rescale_ts` so there is
// exactly one place that knows how to convert between time bases.
//
// Canonical source for time formatting used by progress reports
// (`HH:MM:SS.cs` for humans, `HH:MM:SS.µµµµµµ` for the machine-readable
// block).

/// A rational time base, `numerator / denominator` seconds per tick.
///
/// A `(num, den)` pair, e.g. 1/90000 for a 90kHz clock — kept as a plain
/// data type here (no FFmpeg types) so this crate stays free of any FFI
/// dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBase {
    pub num: i32,
    pub den: i32,
}

impl TimeBase {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/// Canonical microsecond time base used for cross-stream comparisons,
/// recording-time limits, and progress reporting.
pub const AV_TIME_BASE: i64 = 1_000_000;
pub const CANONICAL_TB: TimeBase = TimeBase::new(1, AV_TIME_BASE as i32);

/// Rescale `ts` from `from` to `to`, rounding to the nearest tick.
///
/// Uses `i128` internally so `ts * from.num * to.den` cannot overflow for any
/// `i64` timestamp and any reasonable time base — the same reason FFmpeg's
/// own `av_rescale_q` widens its intermediate product.
pub fn rescale_ts(ts: i64, from: TimeBase, to: TimeBase) -> i64 {
    if from == to {
        return ts;
    }
    let num = ts as i128 * from.num as i128 * to.den as i128;
    let den = from.den as i128 * to.num as i128;
    if den == 0 {
        return ts;
    }
    let half = den / 2;
    let rounded = if num >= 0 { (num + half) / den } else { (num - half) / den };
    rounded as i64
}

/// Rescale `ts` from `from` into the canonical microsecond time base.
pub fn rescale_to_canonical(ts: i64, from: TimeBase) -> i64 {
    rescale_ts(ts, from, CANONICAL_TB)
}

/// Format a duration in canonical microseconds as `HH:MM:SS.cs` (centiseconds).
///
/// Used by the human-readable progress line (`time=...`).
///
/// ```
/// use vtrans_core::helpers::time::format_time_us;
/// assert_eq!(format_time_us(0),        "00:00:00.00");
/// assert_eq!(format_time_us(61_500_000), "00:01:01.50");
/// assert_eq!(format_time_us(3_600_000_000), "01:00:00.00");
/// ```
pub fn format_time_us(us: i64) -> String {
    if us < 0 {
        return "N/A".to_string();
    }
    let total_cs = us / 10_000;
    let cs = total_cs % 100;
    let total_s = total_cs / 100;
    let s = total_s % 60;
    let total_m = total_s / 60;
    let m = total_m % 60;
    let h = total_m / 60;
    format!("{h:02}:{m:02}:{s:02}.{cs:02}")
}

/// Format a duration in canonical microseconds as `HH:MM:SS.µµµµµµ` — the
/// machine-readable `out_time=` line's format.
///
/// ```
/// use vtrans_core::helpers::time::format_time_us_full;
/// assert_eq!(format_time_us_full(0), "00:00:00.000000");
/// assert_eq!(format_time_us_full(1_500_000), "00:00:01.500000");
/// ```
pub fn format_time_us_full(us: i64) -> String {
    if us < 0 {
        return "00:00:00.000000".to_string();
    }
    let total_us = us % 1_000_000;
    let total_s = us / 1_000_000;
    let s = total_s % 60;
    let total_m = total_s / 60;
    let m = total_m % 60;
    let h = total_m / 60;
    format!("{h:02}:{m:02}:{s:02}.{total_us:06}")
}

/// The open question in spec.md §9: `pts > 1` is a guard against the
/// `INT64_MIN + 1` sentinel FFmpeg uses for "no PTS observed yet", not a
/// meaningful numeric threshold. Name the check for what it means instead of
/// transcribing the literal constant.
pub fn is_sentinel_pts(pts: i64) -> bool {
    pts <= i64::MIN + 1
}
