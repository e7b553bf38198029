// crates/vtrans-engine/src/mock.rs
//
// Deterministic collaborator stand-ins for Supervisor's own unit tests.
// Test-only and crate-private — trivial implementations that exercise the
// surrounding machinery without a real codec stack behind them.

#![cfg(test)]

use crate::collaborators::{DemuxOutcome, Demuxer, Muxer, Packet};

pub struct MockDemuxer {
    remaining: u32,
    next_dts: i64,
}

impl MockDemuxer {
    pub fn with_packet_count(count: u32) -> Self {
        Self { remaining: count, next_dts: 0 }
    }
}

impl Demuxer for MockDemuxer {
    fn get_packet(&mut self) -> DemuxOutcome {
        if self.remaining == 0 {
            return DemuxOutcome::Eof;
        }
        self.remaining -= 1;
        let dts = self.next_dts;
        self.next_dts += 40;
        DemuxOutcome::Packet(Packet {
            stream_index: 0,
            kind: vtrans_core::MediaKind::Video,
            dts: Some(dts),
            pts: Some(dts),
            duration: 40,
            is_key: true,
        })
    }
}

#[derive(Default)]
pub struct MockMuxer {
    pub packets_written: u32,
    pub trailer_written: bool,
    pub closed: Vec<usize>,
}

impl Muxer for MockMuxer {
    fn write_packet(&mut self, _stream: usize, _pkt: &Packet, _dts_est: i64) -> Result<(), String> {
        self.packets_written += 1;
        Ok(())
    }

    fn close_stream(&mut self, stream: usize) {
        self.closed.push(stream);
    }

    fn write_trailer(&mut self) -> Result<(), String> {
        self.trailer_written = true;
        Ok(())
    }
}
