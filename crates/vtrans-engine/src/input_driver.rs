// crates/vtrans-engine/src/input_driver.rs
//
// C6: draining one InputFile. `process_input` pulls exactly one packet from
// the demuxer and reports what happened so the Supervisor's main loop can
// decide whether to keep pulling from this file or move on to another;
// `decode_flush` drains a decoder at end of stream.

use vtrans_core::InputFile;

use crate::collaborators::{DemuxOutcome, Demuxer};
use crate::packet::{estimate_dts, process_input_packet, PacketAction};

/// Outcome of one `process_input` call — mirrors `DemuxOutcome` but folds in
/// the file-level bookkeeping (`eagain`/`eof_reached`) the Supervisor needs.
pub enum InputStepOutcome {
    /// A packet was read and routed; the actions the caller must still
    /// execute against decoders/muxers, alongside the packet's estimated
    /// timestamp (canonical to the stream, not yet rescaled) for callers
    /// that need to know when the packet landed, not just what to do with it
    /// (subtitle heartbeat tracking, for instance).
    Routed(Vec<PacketAction>, i64),
    Eagain,
    LoopRestart,
    Eof,
    Error(String),
}

/// Pull one packet from `file`'s demuxer and route it. Updates `file.eagain`
/// / `file.eof_reached` to match spec.md §4.5's per-file bookkeeping.
pub fn process_input(file: &mut InputFile, demuxer: &mut dyn Demuxer) -> InputStepOutcome {
    match demuxer.get_packet() {
        DemuxOutcome::Packet(pkt) => {
            file.eagain = false;
            let Some(stream) = file.streams.get_mut(pkt.stream_index) else {
                return InputStepOutcome::Error(format!("unknown stream index {}", pkt.stream_index));
            };
            stream.frames_decoded += 1;
            let pts = estimate_dts(&pkt, stream);
            let actions = process_input_packet(stream, &pkt);
            InputStepOutcome::Routed(actions, pts)
        }
        DemuxOutcome::Eagain => {
            file.eagain = true;
            InputStepOutcome::Eagain
        }
        DemuxOutcome::LoopRestart => {
            file.eagain = false;
            InputStepOutcome::LoopRestart
        }
        DemuxOutcome::Eof => {
            file.eagain = false;
            file.eof_reached = true;
            InputStepOutcome::Eof
        }
        DemuxOutcome::Error(e) => InputStepOutcome::Error(e),
    }
}

/// Drain a decoder at end of stream by feeding it flush signals until it
/// reports no more output is coming (spec.md §4.6).
pub fn decode_flush(decoder: &mut dyn crate::collaborators::Decoder) -> Result<(), String> {
    while decoder.send_packet(None)? {}
    Ok(())
}
