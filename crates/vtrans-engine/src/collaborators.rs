// crates/vtrans-engine/src/collaborators.rs
//
// The four subsystems spec.md explicitly puts out of scope — demuxer,
// decoder, filter graph, encoder/muxer — show up here only as traits. The
// orchestrator is built and tested against them without ever linking a real
// codec stack; a registry of trivial implementations stands in for the real
// thing during tests.

use vtrans_core::{MediaKind, StreamId};

/// One demuxed packet. Real implementations attach a payload buffer;
/// stream-copy and timestamp bookkeeping only look at the fields below.
#[derive(Debug, Clone)]
pub struct Packet {
    pub stream_index: usize,
    pub kind: MediaKind,
    pub dts: Option<i64>,
    pub pts: Option<i64>,
    pub duration: i64,
    pub is_key: bool,
}

/// Result of asking a `Demuxer` for its next unit of work (spec.md §4.5).
pub enum DemuxOutcome {
    Packet(Packet),
    /// No packet ready yet; try again without treating this as progress.
    Eagain,
    /// The demuxer looped back to the start of the file (`-stream_loop`).
    LoopRestart,
    Eof,
    Error(String),
}

/// Supplies packets for one `InputFile`. Implementations own whatever
/// container/network state that requires; the orchestrator only drives this
/// interface.
pub trait Demuxer: Send {
    fn get_packet(&mut self) -> DemuxOutcome;

    /// Forward the final audio frame's duration once decode_flush computes
    /// it, so a demuxer reading from a live/non-seekable source knows it can
    /// stop waiting (spec.md §4.6). Most demuxers don't care.
    fn notify_audio_duration(&mut self, _seconds: f64) {}
}

/// Decodes packets from one `InputStream` into frames it hands directly to
/// whatever filter graphs or outputs subscribe to it. Frame delivery itself
/// is a detail of the real decoder; the orchestrator only needs to know
/// whether decoding produced output this call and whether the stream is done.
pub trait Decoder: Send {
    /// `None` requests a flush. Returns `Ok(true)` while the decoder may still
    /// produce frames, `Ok(false)` at decoder EOF.
    fn send_packet(&mut self, pkt: Option<&Packet>) -> Result<bool, String>;
}

/// A filter graph instance. Named `FilterRuntime` to avoid colliding with
/// `vtrans_core::FilterGraph`, the pure-data record the Supervisor keeps
/// alongside this handle.
pub trait FilterRuntime: Send {
    /// Which input this graph most wants fed next, if it's starved.
    fn wanted_input(&self) -> Option<StreamId>;

    /// Pull any frames the graph has ready for its output sinks. Returns how
    /// many were reaped.
    fn reap(&mut self) -> usize;

    /// `c`/`C` with `time < 0`: apply immediately.
    fn send_command(&mut self, command: &str, arg: Option<&str>) -> Result<(), String>;

    /// `C` with `time >= 0`: apply once the graph's internal clock reaches it.
    fn queue_command(&mut self, time: f64, command: &str, arg: Option<&str>) -> Result<(), String>;

    /// sub2video heartbeat (spec.md §4.4): re-submit the last subtitle bitmap
    /// at `pts` so overlay filters keep rendering it between subtitle events.
    fn subtitle_heartbeat(&mut self, _pts: i64) {}
}

/// Encodes frames from one source (filter graph sink or raw stream-copy
/// feeder) into packets for a `Muxer`.
pub trait Encoder: Send {
    /// Signal end of stream; implementations flush any delayed frames.
    fn flush(&mut self) -> Result<(), String>;
}

/// Writes packets into one `OutputFile`'s container.
pub trait Muxer: Send {
    /// Write a stream-copied or just-encoded packet. `dts_est` is the
    /// orchestrator's best estimate of the packet's DTS in the output
    /// stream's time base, used to keep `last_mux_dts` monotonic even when
    /// the source packet has no DTS of its own (spec.md §4.5 step 3).
    fn write_packet(&mut self, stream: usize, pkt: &Packet, dts_est: i64) -> Result<(), String>;

    fn close_stream(&mut self, stream: usize);

    fn write_trailer(&mut self) -> Result<(), String>;
}
