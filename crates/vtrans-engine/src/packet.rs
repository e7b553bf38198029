// crates/vtrans-engine/src/packet.rs
//
// C5: process_input_packet. Routing a demuxed packet is pure decision logic
// — "decode it", "copy it straight to these outputs", or "drop it" — kept
// free of any collaborator trait object so it's testable as ordinary data
// in/data out, the same separation vtrans-core::commands draws between
// parsing a console command and acting on one.

use vtrans_core::{InputStream, StreamId};

use crate::collaborators::Packet;

/// What the caller (vtrans-engine::supervisor) should do with one packet,
/// in the order these actions are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum PacketAction {
    /// Hand the packet to this stream's decoder.
    Decode,
    /// Write the packet straight through to `output`, using `dts_est` as the
    /// monotonic DTS estimate if the packet itself carries none (spec.md
    /// §4.5 step 3).
    StreamCopy { output: StreamId, dts_est: i64 },
}

/// Decide what to do with a packet just read from `stream`'s file. A
/// discarded stream, or a packet with nothing downstream, yields no actions.
pub fn process_input_packet(stream: &InputStream, pkt: &Packet) -> Vec<PacketAction> {
    if stream.discard {
        return Vec::new();
    }

    let mut actions = Vec::new();

    if stream.decoding_needed {
        actions.push(PacketAction::Decode);
    }

    for &output in &stream.output_consumers {
        let dts_est = estimate_dts(pkt, stream);
        actions.push(PacketAction::StreamCopy { output, dts_est });
    }

    actions
}

/// Best DTS estimate for a packet that may not carry one of its own: fall
/// back to PTS, then to the stream's running duration-based clock.
pub(crate) fn estimate_dts(pkt: &Packet, stream: &InputStream) -> i64 {
    if let Some(dts) = pkt.dts {
        return dts;
    }
    if let Some(pts) = pkt.pts {
        return pts;
    }
    // No timestamp at all: advance from the last known position by one
    // nominal frame duration so last_mux_dts still only moves forward.
    stream.frames_decoded as i64 * pkt.duration.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtrans_core::{helpers::time::TimeBase, MediaKind};

    fn input_stream() -> InputStream {
        InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25))
    }

    fn packet(dts: Option<i64>, pts: Option<i64>) -> Packet {
        Packet { stream_index: 0, kind: MediaKind::Video, dts, pts, duration: 40, is_key: true }
    }

    #[test]
    fn discarded_stream_yields_no_actions() {
        let mut s = input_stream();
        s.discard = true;
        s.decoding_needed = true;
        assert!(process_input_packet(&s, &packet(Some(0), Some(0))).is_empty());
    }

    #[test]
    fn decoding_needed_emits_decode_action() {
        let mut s = input_stream();
        s.decoding_needed = true;
        let actions = process_input_packet(&s, &packet(Some(0), Some(0)));
        assert_eq!(actions, vec![PacketAction::Decode]);
    }

    #[test]
    fn stream_copy_consumers_each_get_their_own_action() {
        let mut s = input_stream();
        s.output_consumers = vec![StreamId::new(1, 0), StreamId::new(2, 0)];
        let actions = process_input_packet(&s, &packet(Some(120), None));
        assert_eq!(
            actions,
            vec![
                PacketAction::StreamCopy { output: StreamId::new(1, 0), dts_est: 120 },
                PacketAction::StreamCopy { output: StreamId::new(2, 0), dts_est: 120 },
            ]
        );
    }

    #[test]
    fn missing_dts_falls_back_to_pts() {
        let s = input_stream();
        let actions = process_input_packet(
            &InputStream { output_consumers: vec![StreamId::new(1, 0)], ..s },
            &packet(None, Some(77)),
        );
        assert_eq!(actions, vec![PacketAction::StreamCopy { output: StreamId::new(1, 0), dts_est: 77 }]);
    }
}
