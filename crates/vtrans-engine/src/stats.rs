// crates/vtrans-engine/src/stats.rs
//
// C3: progress reporting. `Bench` samples wall/user/sys time the way
// ffmpeg's own `-benchmark` flag does, via `getrusage(2)`; `ProgressReporter`
// turns the running counters into the two report shapes spec.md §6 asks
// for — a human line on stderr and a `key=value` block for `-progress`.
// libc is already a workspace dependency for vtrans-cli's raw TTY handling
// (see DESIGN.md); reusing it here avoids pulling in a second rusage crate.

use std::time::Instant;

use vtrans_core::helpers::time::format_time_us;

/// Wall/user/sys timing for one run, microsecond resolution.
#[derive(Debug, Clone, Copy)]
pub struct Bench {
    wall_start: Instant,
    user_start_us: i64,
    sys_start_us: i64,
}

impl Bench {
    pub fn start() -> Self {
        let (user_start_us, sys_start_us) = read_rusage();
        Self { wall_start: Instant::now(), user_start_us, sys_start_us }
    }

    /// `(real, user, sys)` microseconds elapsed since `start()`.
    pub fn elapsed_us(&self) -> (i64, i64, i64) {
        let real = self.wall_start.elapsed().as_micros() as i64;
        let (user_now, sys_now) = read_rusage();
        (real, user_now - self.user_start_us, sys_now - self.sys_start_us)
    }
}

fn read_rusage() -> (i64, i64) {
    unsafe {
        let mut usage: libc::rusage = std::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut usage) != 0 {
            return (0, 0);
        }
        let user_us = usage.ru_utime.tv_sec as i64 * 1_000_000 + usage.ru_utime.tv_usec as i64;
        let sys_us = usage.ru_stime.tv_sec as i64 * 1_000_000 + usage.ru_stime.tv_usec as i64;
        (user_us, sys_us)
    }
}

/// Running counters the Supervisor main loop updates every iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressCounters {
    pub frames_encoded: u64,
    pub bytes_written: u64,
    /// Output timestamp of the furthest-along stream, canonical microseconds.
    pub out_time_us: i64,
    pub frames_dropped: u64,
    pub frames_dup: u64,
    pub speed: f64,
    /// Most recently written output stream's quality metric (`q=`).
    pub quality: f64,
}

/// Formats `ProgressCounters` into the two shapes spec.md §6 asks for.
pub struct ProgressReporter {
    start: Instant,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// One human-readable line, e.g. what `-stats` prints to stderr.
    ///
    /// `time=N/A` before any output has landed, matching `format_time_us`'s
    /// own negative-input fallback — `out_time_us` never goes negative, so
    /// this is the only way that label actually shows up.
    pub fn human_line(&self, c: &ProgressCounters) -> String {
        let bitrate_kbps = if c.out_time_us > 0 {
            (c.bytes_written as f64 * 8.0) / (c.out_time_us as f64 / 1_000_000.0) / 1000.0
        } else {
            0.0
        };
        let time_str = if c.out_time_us == 0 { "N/A".to_string() } else { format_time_us(c.out_time_us) };

        let mut line = format!(
            "frame={:>6} fps={:>5.0} q={:>5.1} size={:>8}kB time={} bitrate={:>7.1}kbits/s",
            c.frames_encoded,
            self.fps(c),
            c.quality,
            c.bytes_written / 1024,
            time_str,
            bitrate_kbps,
        );
        if c.frames_dup > 0 || c.frames_dropped > 0 {
            line.push_str(&format!(" dup={} drop={}", c.frames_dup, c.frames_dropped));
        }
        line.push_str(&format!(" speed={:>5.2}x", c.speed));
        line
    }

    /// `key=value`, newline-per-field, terminated with `progress=continue`
    /// or `progress=end` — the machine-readable `-progress` shape.
    pub fn machine_block(&self, c: &ProgressCounters, done: bool) -> String {
        let bitrate_kbps = if c.out_time_us > 0 {
            (c.bytes_written as f64 * 8.0) / (c.out_time_us as f64 / 1_000_000.0) / 1000.0
        } else {
            0.0
        };
        format!(
            "frame={}\nfps={:.2}\nquality={:.1}\nbitrate={:.1}kbits/s\ntotal_size={}\nout_time_us={}\nout_time={}\ndup_frames={}\ndrop_frames={}\nspeed={:.3}x\nprogress={}\n",
            c.frames_encoded,
            self.fps(c),
            c.quality,
            bitrate_kbps,
            c.bytes_written,
            c.out_time_us,
            format_time_us(c.out_time_us),
            c.frames_dup,
            c.frames_dropped,
            c.speed,
            if done { "end" } else { "continue" },
        )
    }

    fn fps(&self, c: &ProgressCounters) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            c.frames_encoded as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// `out_time / wall_time`, the "speed=" multiplier spec.md §6 reports.
pub fn compute_speed(out_time_us: i64, wall_time_secs: f64) -> f64 {
    if wall_time_secs <= 0.0 {
        0.0
    } else {
        (out_time_us as f64 / 1_000_000.0) / wall_time_secs
    }
}
