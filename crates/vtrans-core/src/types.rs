// crates/vtrans-core/src/types.rs
//
// Pure project data — no FFI, no threads, no runtime collaborator handles.
// Describes the shape of the stream graph (spec.md §3), kept free of any
// decoder/encoder/filter context so it can be constructed, inspected, and
// unit-tested without a real codec stack.
//
// Runtime handles (decoder contexts, filter graph runtimes, encoder
// contexts) live one layer up, in vtrans-engine, keyed by the same
// `StreamId` this crate defines — see vtrans-engine::collaborators.

use crate::helpers::time::TimeBase;

pub type FileIndex = usize;
pub type StreamIndex = usize;

/// `(file_index, index)` — the stable key every iterator, chooser, and
/// packet-routing table uses to identify one elementary stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub file_index: FileIndex,
    pub index: StreamIndex,
}

impl StreamId {
    pub const fn new(file_index: FileIndex, index: StreamIndex) -> Self {
        Self { file_index, index }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
}

/// `ENCODER_FINISHED` and friends — monotonic once set (spec.md §3 invariant).
/// A plain bitset rather than the `bitflags` crate: two bits don't earn a
/// dependency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Finished(u8);

impl Finished {
    pub const NONE: Finished = Finished(0);
    pub const ENCODER_FINISHED: Finished = Finished(1 << 0);
    pub const MUXER_FINISHED: Finished = Finished(1 << 1);

    pub fn set(&mut self, flag: Finished) {
        self.0 |= flag.0;
    }

    pub fn contains(&self, flag: Finished) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn any(&self) -> bool {
        self.0 != 0
    }
}

/// One elementary track inside an `InputFile`.
#[derive(Debug, Clone)]
pub struct InputStream {
    pub file_index: FileIndex,
    pub index: StreamIndex,
    pub kind: MediaKind,
    pub time_base: TimeBase,
    pub decoding_needed: bool,
    pub discard: bool,
    /// Indices into the owning `Supervisor`'s `FilterGraph` registry that
    /// this stream feeds. Empty for streams that are pure stream-copy
    /// sources.
    pub filter_sinks: Vec<usize>,
    /// OutputStreams that stream-copy directly from this InputStream
    /// (no decode, no filter).
    pub output_consumers: Vec<StreamId>,
    pub frames_decoded: u64,
    pub decode_errors: u64,
    pub nb_samples: u64,
    /// Subtitle-only: retroactively extend the previous subtitle's duration
    /// when a new key packet arrives (spec.md §4.4).
    pub fix_sub_duration: bool,
    /// Cached previous subtitle event's PTS, canonical time base. Monotonic
    /// non-decreasing per the spec.md §3 invariant.
    pub prev_sub_pts: Option<i64>,
}

impl InputStream {
    pub fn new(file_index: FileIndex, index: StreamIndex, kind: MediaKind, time_base: TimeBase) -> Self {
        Self {
            file_index,
            index,
            kind,
            time_base,
            decoding_needed: false,
            discard: false,
            filter_sinks: Vec::new(),
            output_consumers: Vec::new(),
            frames_decoded: 0,
            decode_errors: 0,
            nb_samples: 0,
            fix_sub_duration: false,
            prev_sub_pts: None,
        }
    }

    pub fn id(&self) -> StreamId {
        StreamId::new(self.file_index, self.index)
    }

    /// Decode error rate per spec.md §4.8: 0 if no packets have been seen yet.
    pub fn error_rate(&self) -> f64 {
        let total = self.frames_decoded + self.decode_errors;
        if total == 0 {
            0.0
        } else {
            self.decode_errors as f64 / total as f64
        }
    }
}

/// A demuxed source. Owns an ordered, append-only array of `InputStream`.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub index: FileIndex,
    pub streams: Vec<InputStream>,
    /// Max presentation time to read, canonical time base. `None` = unbounded.
    pub recording_time: Option<i64>,
    pub start_time: i64,
    pub start_time_effective: i64,
    /// Set when the demuxer last returned EAGAIN for this file.
    pub eagain: bool,
    pub eof_reached: bool,
    /// Whether a decode_flush on this file should forward the final audio
    /// frame duration to the demuxer (spec.md §4.6). The channel itself is a
    /// runtime handle owned by vtrans-engine, not this crate.
    pub wants_audio_duration_message: bool,
}

impl InputFile {
    pub fn new(index: FileIndex) -> Self {
        Self {
            index,
            streams: Vec::new(),
            recording_time: None,
            start_time: 0,
            start_time_effective: 0,
            eagain: false,
            eof_reached: false,
            wants_audio_duration_message: false,
        }
    }
}

/// Either a filter graph or a direct InputStream — never both (spec.md §3
/// invariant: "Exactly one OutputStream pulls from at most one source").
#[derive(Debug, Clone, Copy)]
pub enum StreamSource {
    Filtered { graph_index: usize },
    StreamCopy { input: StreamId },
}

/// One elementary track inside an `OutputFile`.
#[derive(Debug, Clone)]
pub struct OutputStream {
    pub file_index: FileIndex,
    pub index: StreamIndex,
    pub kind: MediaKind,
    pub time_base: TimeBase,
    pub source: StreamSource,
    pub quality: f32,
    pub packets_written: u64,
    /// Monotonically non-decreasing once set (spec.md §3 invariant).
    /// `None` represents "-infinity" for the chooser (spec.md §4.7).
    pub last_mux_dts: Option<i64>,
    pub last_dropped: u64,
    /// Index inside the owning OutputFile's sync queue, or `None` (`-1` in
    /// the usual C convention).
    pub sq_idx_encode: Option<usize>,
    pub initialized: bool,
    pub inputs_done: bool,
    pub unavailable: bool,
    pub finished: Finished,
    /// Companion flag for subtitle duration-fixup (spec.md §4.4): this
    /// output's key packets trigger a heartbeat re-submit on sibling
    /// subtitle-sourced OutputStreams in the same file.
    pub fix_sub_duration: bool,
}

impl OutputStream {
    pub fn new(file_index: FileIndex, index: StreamIndex, kind: MediaKind, time_base: TimeBase, source: StreamSource) -> Self {
        Self {
            file_index,
            index,
            kind,
            time_base,
            source,
            quality: 0.0,
            packets_written: 0,
            last_mux_dts: None,
            last_dropped: 0,
            sq_idx_encode: None,
            initialized: false,
            inputs_done: false,
            unavailable: false,
            finished: Finished::NONE,
            fix_sub_duration: false,
        }
    }

    pub fn id(&self) -> StreamId {
        StreamId::new(self.file_index, self.index)
    }

    pub fn is_stream_copy(&self) -> bool {
        matches!(self.source, StreamSource::StreamCopy { .. })
    }
}

/// Groups OutputStreams; owns the opaque sync-queue pending counter.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub index: FileIndex,
    pub streams: Vec<OutputStream>,
    /// Opaque sync-queue state: how many linked streams the sync queue is
    /// still waiting on before it can release a coordinated close. The sync
    /// queue's internal buffering policy is out of scope (spec.md §1) — the
    /// orchestrator only needs to know whether it is still pending.
    pub sq_pending: usize,
}

impl OutputFile {
    pub fn new(index: FileIndex) -> Self {
        Self { index, streams: Vec::new(), sq_pending: 0 }
    }
}

/// A user-constructed DAG of transformations over decoded frames. The
/// orchestrator treats this as mostly opaque — it asks it which input it
/// wants next and reaps ready frames from it (spec.md §4.8).
#[derive(Debug, Clone)]
pub struct FilterGraph {
    pub index: usize,
    /// One input, one output, straight-line.
    pub simple: bool,
    /// Last PTS emitted to any output sink, canonical time base.
    pub last_pts: Option<i64>,
}

impl FilterGraph {
    pub fn new(index: usize, simple: bool) -> Self {
        Self { index, simple, last_pts: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_rate_is_zero_with_no_packets() {
        let is = InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25));
        assert_eq!(is.error_rate(), 0.0);
    }

    #[test]
    fn error_rate_divides_decoded_plus_errors() {
        let mut is = InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25));
        is.frames_decoded = 40;
        is.decode_errors = 10;
        assert!((is.error_rate() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn finished_is_monotonic_once_set() {
        let mut f = Finished::NONE;
        assert!(!f.contains(Finished::ENCODER_FINISHED));
        f.set(Finished::ENCODER_FINISHED);
        assert!(f.contains(Finished::ENCODER_FINISHED));
        // Setting again is a no-op, never clears.
        f.set(Finished::ENCODER_FINISHED);
        assert!(f.contains(Finished::ENCODER_FINISHED));
    }

    #[test]
    fn stream_source_is_exclusive() {
        let copy = StreamSource::StreamCopy { input: StreamId::new(0, 0) };
        assert!(matches!(copy, StreamSource::StreamCopy { .. }));
        let filt = StreamSource::Filtered { graph_index: 2 };
        assert!(matches!(filt, StreamSource::Filtered { .. }));
    }
}
