// crates/vtrans-cli/src/collaborators.rs
//
// Placeholder demuxer/muxer so this binary has something to hand the
// orchestrator without linking a real codec stack (spec.md §1 keeps that out
// of scope). `PlaceholderDemuxer` emits exactly one packet per input then
// reports end of stream; `PlaceholderMuxer` only touches its output path so
// `vtrans -i in out` produces a file that exists, nothing more.

use std::fs::File;
use std::path::PathBuf;

use vtrans_engine::{DemuxOutcome, Demuxer, Muxer, Packet};

pub struct PlaceholderDemuxer {
    emitted: bool,
}

impl PlaceholderDemuxer {
    pub fn new() -> Self {
        Self { emitted: false }
    }
}

impl Demuxer for PlaceholderDemuxer {
    fn get_packet(&mut self) -> DemuxOutcome {
        if self.emitted {
            return DemuxOutcome::Eof;
        }
        self.emitted = true;
        DemuxOutcome::Packet(Packet {
            stream_index: 0,
            kind: vtrans_core::MediaKind::Video,
            dts: Some(0),
            pts: Some(0),
            duration: 1,
            is_key: true,
        })
    }
}

pub struct PlaceholderMuxer {
    path: PathBuf,
    opened: bool,
}

impl PlaceholderMuxer {
    pub fn new(path: PathBuf) -> Self {
        Self { path, opened: false }
    }

    fn ensure_open(&mut self) {
        if !self.opened {
            let _ = File::create(&self.path);
            self.opened = true;
        }
    }
}

impl Muxer for PlaceholderMuxer {
    fn write_packet(&mut self, _stream: usize, _pkt: &Packet, _dts_est: i64) -> Result<(), String> {
        self.ensure_open();
        Ok(())
    }

    fn close_stream(&mut self, _stream: usize) {}

    fn write_trailer(&mut self) -> Result<(), String> {
        self.ensure_open();
        Ok(())
    }
}
