// crates/vtrans-engine/tests/scenarios.rs
//
// Scenario-level tests against the public Supervisor surface, using
// from-scratch collaborator implementations (not the crate's own
// test-private mocks) the way a real frontend would plug in a codec stack.

use vtrans_core::{helpers::time::TimeBase, Config, Finished, InputFile, InputStream, MediaKind, OutputFile, OutputStream, StreamId, StreamSource};
use vtrans_engine::subtitle::{needs_heartbeat, retroactive_duration};
use vtrans_engine::{Collaborators, DemuxOutcome, Demuxer, Muxer, Packet, Supervisor};

struct ScriptedDemuxer {
    dts: Vec<i64>,
    pos: usize,
}

impl ScriptedDemuxer {
    fn from_dts(dts: Vec<i64>) -> Self {
        Self { dts, pos: 0 }
    }
}

impl Demuxer for ScriptedDemuxer {
    fn get_packet(&mut self) -> DemuxOutcome {
        if self.pos >= self.dts.len() {
            return DemuxOutcome::Eof;
        }
        let dts = self.dts[self.pos];
        self.pos += 1;
        DemuxOutcome::Packet(Packet { stream_index: 0, kind: MediaKind::Video, dts: Some(dts), pts: Some(dts), duration: 40, is_key: true })
    }
}

#[derive(Default)]
struct RecordingMuxer {
    written: Vec<i64>,
    trailer_written: bool,
}

impl Muxer for RecordingMuxer {
    fn write_packet(&mut self, _stream: usize, pkt: &Packet, _dts_est: i64) -> Result<(), String> {
        self.written.push(pkt.dts.unwrap_or(0));
        Ok(())
    }

    fn close_stream(&mut self, _stream: usize) {}

    fn write_trailer(&mut self) -> Result<(), String> {
        self.trailer_written = true;
        Ok(())
    }
}

fn stream_copy_setup() -> (InputFile, OutputFile) {
    let mut input = InputFile::new(0);
    let mut istream = InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 1_000_000));
    istream.output_consumers = vec![StreamId::new(0, 0)];
    input.streams.push(istream);

    let mut output = OutputFile::new(0);
    output.streams.push(OutputStream::new(
        0,
        0,
        MediaKind::Video,
        TimeBase::new(1, 1_000_000),
        StreamSource::StreamCopy { input: StreamId::new(0, 0) },
    ));

    (input, output)
}

// S1: an orchestrator with no outputs at all does nothing and succeeds.
#[test]
fn s1_empty_inputs_succeed_immediately() {
    let mut sup = Supervisor::new(Config::default(), vec![], vec![], vec![], Collaborators::new());
    assert!(sup.run(&|| false).is_ok());
}

// S2: a single stream-copy output drains every packet and finishes cleanly.
#[test]
fn s2_single_stream_copy_drains_to_completion() {
    let (input, output) = stream_copy_setup();
    let mut collaborators = Collaborators::new();
    collaborators.demuxers.insert(0, Box::new(ScriptedDemuxer::from_dts(vec![0, 40, 80, 120])));
    collaborators.muxers.insert(0, Box::new(RecordingMuxer::default()));

    let mut sup = Supervisor::new(Config::default(), vec![input], vec![output], vec![], collaborators);
    sup.run(&|| false).unwrap();

    assert!(sup.outputs[0].streams[0].finished.contains(Finished::ENCODER_FINISHED));
    assert_eq!(sup.outputs[0].streams[0].packets_written, 4);
}

// S3: a recording-time cap stops the output once the cap is reached, short
// of the input's natural end.
#[test]
fn s3_recording_time_cap_stops_early() {
    let (mut input, output) = stream_copy_setup();
    input.recording_time = Some(100);

    let mut collaborators = Collaborators::new();
    collaborators.demuxers.insert(0, Box::new(ScriptedDemuxer::from_dts(vec![0, 40, 80, 120, 160])));
    collaborators.muxers.insert(0, Box::new(RecordingMuxer::default()));

    let mut sup = Supervisor::new(Config::default(), vec![input], vec![output], vec![], collaborators);
    sup.run(&|| false).unwrap();

    assert!(sup.outputs[0].streams[0].finished.contains(Finished::ENCODER_FINISHED));
    // Packets at dts 0, 40, 80 are under the cap; 120 trips it.
    assert_eq!(sup.outputs[0].streams[0].packets_written, 3);
}

// S4: a decode error rate over the configured maximum fails the run with
// the dedicated error variant, mapped to exit code 69.
#[test]
fn s4_decode_error_rate_over_max_fails_the_run() {
    let mut input = InputFile::new(0);
    let mut istream = InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25));
    istream.frames_decoded = 1;
    istream.decode_errors = 9; // 90% error rate
    input.streams.push(istream);

    let mut config = Config::default();
    config.max_error_rate = 0.5;

    let sup_result = {
        let mut sup = Supervisor::new(config, vec![input], vec![], vec![], Collaborators::new());
        sup.run(&|| false)
    };

    assert!(sup_result.is_err());
    assert_eq!(vtrans_engine::exit_code(&sup_result), 69);
}

// S5: sub2video heartbeat bookkeeping — a subtitle stream that has shown a
// prior event needs a heartbeat at any later PTS, and the gap between two
// events becomes the first event's retroactive duration.
#[test]
fn s5_subtitle_heartbeat_and_retroactive_duration() {
    let mut istream = InputStream::new(0, 0, MediaKind::Subtitle, TimeBase::new(1, 1_000_000));
    assert!(!needs_heartbeat(&istream, 1_000));

    istream.prev_sub_pts = Some(500);
    assert!(needs_heartbeat(&istream, 1_000));

    let extension = retroactive_duration(500, 1_000);
    assert_eq!(extension, Some(500));
}
