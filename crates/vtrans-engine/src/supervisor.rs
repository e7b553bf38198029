// crates/vtrans-engine/src/supervisor.rs
//
// C8: the orchestrator itself. `Supervisor` owns the stream graph
// (vtrans-core's data types) alongside the collaborator handles that make
// it real, and drives the output-driven main loop spec.md §4 describes:
// choose the output furthest behind, pull exactly enough input to advance
// it, repeat until every output is finished or the caller asks to stop.

use std::collections::HashMap;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use vtrans_core::{Config, Finished, InputFile, OutputFile, PrintStats, StreamId, StreamSource};

use crate::chooser::choose_output;
use crate::collaborators::{Decoder, Demuxer, Encoder, FilterRuntime, Muxer, Packet};
use crate::error::{Error, Result};
use crate::input_driver::{process_input, InputStepOutcome};
use crate::iter::{find_ist_mut, find_ost, find_ost_mut};
use crate::packet::PacketAction;
use crate::stats::{Bench, ProgressCounters, ProgressReporter};
use crate::subtitle::{needs_heartbeat, retroactive_duration};

/// How long to sleep after a demuxer reports EAGAIN before retrying, so a
/// stalled input doesn't spin the main loop at 100% CPU (spec.md §4.5).
const EAGAIN_BACKOFF: Duration = Duration::from_millis(5);

/// Everything the orchestrator needs to make progress on one run. Built up
/// by a frontend (vtrans-cli or a test harness) and handed to [`Supervisor::run`].
pub struct Collaborators {
    pub demuxers: HashMap<usize, Box<dyn Demuxer>>,
    pub decoders: HashMap<StreamId, Box<dyn Decoder>>,
    pub filters: HashMap<usize, Box<dyn FilterRuntime>>,
    pub encoders: HashMap<StreamId, Box<dyn Encoder>>,
    pub muxers: HashMap<usize, Box<dyn Muxer>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self {
            demuxers: HashMap::new(),
            decoders: HashMap::new(),
            filters: HashMap::new(),
            encoders: HashMap::new(),
            muxers: HashMap::new(),
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Supervisor {
    pub config: Config,
    pub inputs: Vec<InputFile>,
    pub outputs: Vec<OutputFile>,
    pub graphs: Vec<vtrans_core::FilterGraph>,
    collaborators: Collaborators,
    bench: Option<Bench>,
    reporter: ProgressReporter,
    counters: ProgressCounters,
    last_report: Option<Instant>,
    vstats_file: Option<std::fs::File>,
    /// First raw timestamp observed, used to zero-base `out_time_us` when
    /// `copy_ts` isn't preserving original timestamps (spec.md §6).
    start_offset_us: Option<i64>,
}

impl Supervisor {
    pub fn new(config: Config, inputs: Vec<InputFile>, outputs: Vec<OutputFile>, graphs: Vec<vtrans_core::FilterGraph>, collaborators: Collaborators) -> Self {
        let bench = if config.do_benchmark || config.do_benchmark_all { Some(Bench::start()) } else { None };
        let vstats_file = config.vstats_filename.as_ref().and_then(|path| std::fs::File::create(path).ok());
        Self {
            config,
            inputs,
            outputs,
            graphs,
            collaborators,
            bench,
            reporter: ProgressReporter::new(),
            counters: ProgressCounters::default(),
            last_report: None,
            vstats_file,
            start_offset_us: None,
        }
    }

    /// Drive the main loop until every output is finished or `should_stop`
    /// returns true (spec.md §4.10's graceful-shutdown hook — vtrans-cli
    /// wires this to its signal handler's flag).
    pub fn run(&mut self, should_stop: &dyn Fn() -> bool) -> Result<()> {
        while let Some(output_id) = choose_output(&self.outputs, &self.graphs) {
            if should_stop() {
                debug!("shutdown requested, leaving main loop early");
                break;
            }
            self.transcode_step(output_id)?;
            self.maybe_report(false);
        }
        let result = self.finalize();
        self.maybe_report(true);
        result
    }

    /// Zero-base a raw timestamp per spec.md §6's `copy_ts`/`start_at_zero`
    /// policy: by default (or when `start_at_zero` overrides `copy_ts`) the
    /// first observed timestamp becomes the new origin; with `copy_ts` alone,
    /// the original timestamp passes through untouched.
    fn zero_based(&mut self, raw: i64) -> i64 {
        if self.config.copy_ts && !self.config.start_at_zero {
            return raw;
        }
        let offset = *self.start_offset_us.get_or_insert(raw);
        raw - offset
    }

    /// Emit the periodic progress report per `Config::print_stats`
    /// (spec.md §6): quiet suppresses it entirely, stderr prints every call
    /// unconditionally, log is rate-limited by `stats_period_us` like a real
    /// logging backend would want. The final report (`done`) always prints.
    fn maybe_report(&mut self, done: bool) {
        match self.config.print_stats {
            PrintStats::Quiet => {}
            PrintStats::Stderr => {
                eprintln!("{}", self.reporter.human_line(&self.counters));
            }
            PrintStats::Log => {
                if !done {
                    let period = Duration::from_micros(self.config.stats_period_us.max(0) as u64);
                    if let Some(last) = self.last_report {
                        if Instant::now().duration_since(last) < period {
                            return;
                        }
                    }
                    self.last_report = Some(Instant::now());
                }
                info!("{}", self.reporter.human_line(&self.counters));
            }
        }
    }

    /// Per-frame vstats line (spec.md §6's `-vstats_file`): best-effort,
    /// silently skipped if the file couldn't be opened or a write fails.
    fn write_vstats_line(&mut self) {
        let quality = self.counters.quality;
        let size_kb = self.counters.bytes_written / 1024;
        if let Some(file) = self.vstats_file.as_mut() {
            let _ = writeln!(file, "q= {quality:>5.1} size= {size_kb:>8}kB");
        }
    }

    /// sub2video heartbeat/fix_sub_duration (spec.md §4.4): whenever a
    /// subtitle-kind input stream yields a new packet, re-submit the last
    /// bitmap to keep the overlay alive and note the retroactive duration the
    /// previous event should have picked up.
    fn maybe_heartbeat_subtitle(&mut self, input: StreamId, graph_index: usize, pts: i64) {
        let Some(stream) = find_ist_mut(&mut self.inputs, input) else {
            return;
        };
        if stream.kind != vtrans_core::MediaKind::Subtitle {
            return;
        }

        if needs_heartbeat(stream, pts) {
            if let Some(filter) = self.collaborators.filters.get_mut(&graph_index) {
                filter.subtitle_heartbeat(pts);
            }
        }

        if let Some(prev) = stream.prev_sub_pts {
            if let Some(extension) = retroactive_duration(prev, pts) {
                debug!(?input, extension, "retroactively extending previous subtitle event");
            }
        }

        stream.prev_sub_pts = Some(pts);
    }

    /// Advance exactly one output stream by one unit of input (spec.md §4.7).
    fn transcode_step(&mut self, output_id: StreamId) -> Result<()> {
        let source = {
            let out = find_ost_mut(&mut self.outputs, output_id)
                .ok_or_else(|| Error::Setup(format!("unknown output {output_id:?}")))?;
            out.source
        };

        match source {
            StreamSource::StreamCopy { input } => self.step_stream_copy(output_id, input),
            StreamSource::Filtered { graph_index } => self.step_filtered(output_id, graph_index),
        }
    }

    fn step_stream_copy(&mut self, output_id: StreamId, input: StreamId) -> Result<()> {
        let Some(demuxer) = self.collaborators.demuxers.get_mut(&input.file_index) else {
            return Err(Error::Setup(format!("no demuxer registered for file {}", input.file_index)));
        };
        let Some(file) = self.inputs.get_mut(input.file_index) else {
            return Err(Error::Setup(format!("no input file {}", input.file_index)));
        };

        let recording_time = file.recording_time;

        match process_input(file, demuxer.as_mut()) {
            InputStepOutcome::Routed(actions, _pts) => self.execute_actions(actions, recording_time),
            InputStepOutcome::Eagain => {
                thread::sleep(EAGAIN_BACKOFF);
                Ok(())
            }
            InputStepOutcome::LoopRestart => Ok(()),
            InputStepOutcome::Eof => {
                self.finish_output(output_id);
                Ok(())
            }
            InputStepOutcome::Error(detail) => {
                if self.config.exit_on_error {
                    Err(Error::collaborator("demuxer", input, detail))
                } else {
                    warn!(stream = ?input, %detail, "demuxer error, continuing");
                    Ok(())
                }
            }
        }
    }

    fn step_filtered(&mut self, output_id: StreamId, graph_index: usize) -> Result<()> {
        let wanted = self
            .collaborators
            .filters
            .get(&graph_index)
            .and_then(|g| g.wanted_input());

        if let Some(input) = wanted {
            let Some(demuxer) = self.collaborators.demuxers.get_mut(&input.file_index) else {
                return Err(Error::Setup(format!("no demuxer registered for file {}", input.file_index)));
            };
            let Some(file) = self.inputs.get_mut(input.file_index) else {
                return Err(Error::Setup(format!("no input file {}", input.file_index)));
            };
            match process_input(file, demuxer.as_mut()) {
                InputStepOutcome::Routed(actions, pts) => {
                    for action in &actions {
                        if let PacketAction::Decode = action {
                            if let Some(decoder) = self.collaborators.decoders.get_mut(&input) {
                                let pkt = Packet { stream_index: input.index, kind: vtrans_core::MediaKind::Video, dts: Some(pts), pts: Some(pts), duration: 0, is_key: false };
                                decoder.send_packet(Some(&pkt)).map_err(|e| Error::collaborator("decoder", input, e))?;
                            }
                        }
                    }
                    self.maybe_heartbeat_subtitle(input, graph_index, pts);
                }
                InputStepOutcome::Eof => {
                    if let Some(decoder) = self.collaborators.decoders.get_mut(&input) {
                        decoder.send_packet(None).map_err(|e| Error::collaborator("decoder", input, e))?;
                    }
                }
                InputStepOutcome::Eagain => {
                    thread::sleep(EAGAIN_BACKOFF);
                }
                InputStepOutcome::Error(detail) if self.config.exit_on_error => {
                    return Err(Error::collaborator("demuxer", input, detail));
                }
                _ => {}
            }
        }

        let reaped = self
            .collaborators
            .filters
            .get_mut(&graph_index)
            .map(|g| g.reap())
            .unwrap_or(0);

        if reaped > 0 {
            self.write_filtered_packet(output_id, graph_index, reaped)?;
        } else if wanted.is_none() {
            self.finish_output(output_id);
        }

        Ok(())
    }

    fn write_filtered_packet(&mut self, output_id: StreamId, graph_index: usize, reaped: usize) -> Result<()> {
        let dts = {
            let graph = self
                .graphs
                .get_mut(graph_index)
                .ok_or_else(|| Error::Setup(format!("unknown filter graph {graph_index}")))?;
            let next = graph.last_pts.map(|p| p + 1).unwrap_or(0);
            graph.last_pts = Some(next);
            next
        };
        let reported_time = self.zero_based(dts);

        let out = find_ost_mut(&mut self.outputs, output_id)
            .ok_or_else(|| Error::Setup(format!("unknown output {output_id:?}")))?;

        let pkt = Packet { stream_index: output_id.index, kind: out.kind, dts: Some(dts), pts: Some(dts), duration: 1, is_key: true };

        if let Some(muxer) = self.collaborators.muxers.get_mut(&output_id.file_index) {
            muxer.write_packet(output_id.index, &pkt, dts).map_err(|e| Error::collaborator("muxer", output_id, e))?;
        }

        out.last_mux_dts = Some(dts);
        out.packets_written += reaped as u64;
        self.counters.quality = out.quality as f64;
        self.counters.frames_encoded += reaped as u64;
        self.counters.out_time_us = reported_time;
        self.write_vstats_line();
        Ok(())
    }

    /// Execute every action a single routed input packet produced — this may
    /// span several sibling outputs when one input stream-copy feeds more
    /// than one output file, so every action runs here rather than only the
    /// one matching whatever output happened to pull the packet.
    fn execute_actions(&mut self, actions: Vec<PacketAction>, recording_time: Option<i64>) -> Result<()> {
        for action in actions {
            match action {
                PacketAction::Decode => {
                    // A stream-copy source has no decoder registered; nothing to do.
                }
                PacketAction::StreamCopy { output, dts_est } => {
                    if let Some(out) = find_ost(&self.outputs, output) {
                        if out.finished.contains(Finished::ENCODER_FINISHED) {
                            continue;
                        }
                    }
                    if let Some(limit) = recording_time {
                        if dts_est >= limit {
                            debug!(?output, limit, "recording-time cap reached, finishing output");
                            self.finish_output(output);
                            continue;
                        }
                    }

                    let pkt = Packet { stream_index: output.index, kind: vtrans_core::MediaKind::Video, dts: Some(dts_est), pts: Some(dts_est), duration: 1, is_key: true };
                    if let Some(muxer) = self.collaborators.muxers.get_mut(&output.file_index) {
                        muxer.write_packet(output.index, &pkt, dts_est).map_err(|e| Error::collaborator("muxer", output, e))?;
                    }

                    let reported_time = self.zero_based(dts_est);
                    let mut quality = None;
                    if let Some(out) = find_ost_mut(&mut self.outputs, output) {
                        out.last_mux_dts = Some(dts_est);
                        out.packets_written += 1;
                        quality = Some(out.quality as f64);
                    }
                    if let Some(q) = quality {
                        self.counters.quality = q;
                    }
                    self.counters.out_time_us = self.counters.out_time_us.max(reported_time);
                    self.write_vstats_line();
                }
            }
        }
        Ok(())
    }

    fn finish_output(&mut self, output_id: StreamId) {
        if let Some(out) = find_ost_mut(&mut self.outputs, output_id) {
            out.finished.set(Finished::ENCODER_FINISHED);
            out.finished.set(Finished::MUXER_FINISHED);
        }
        if let Some(muxer) = self.collaborators.muxers.get_mut(&output_id.file_index) {
            muxer.close_stream(output_id.index);
        }
    }

    /// Flush every decoder/encoder, close every muxer, and check the
    /// cumulative decode error rate (spec.md §7).
    fn finalize(&mut self) -> Result<()> {
        for decoder in self.collaborators.decoders.values_mut() {
            let _ = decoder.send_packet(None);
        }
        for encoder in self.collaborators.encoders.values_mut() {
            let _ = encoder.flush();
        }
        for muxer in self.collaborators.muxers.values_mut() {
            muxer.write_trailer().map_err(|e| Error::Other(e))?;
        }

        for file in &self.inputs {
            for stream in &file.streams {
                let rate = stream.error_rate();
                if rate > self.config.max_error_rate {
                    return Err(Error::ErrorRateExceeded { rate, max: self.config.max_error_rate });
                }
            }
        }

        Ok(())
    }

    pub fn progress_report(&self, done: bool) -> String {
        self.reporter.machine_block(&self.counters, done)
    }

    pub fn bench_elapsed_us(&self) -> Option<(i64, i64, i64)> {
        self.bench.map(|b| b.elapsed_us())
    }
}

/// Process exit code for a finished run (spec.md §7): 0 on success, 69 when
/// the decode error rate gate trips, 1 for any other collaborator failure.
pub fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(Error::ErrorRateExceeded { .. }) => 69,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDemuxer, MockMuxer};
    use vtrans_core::{helpers::time::TimeBase, InputStream, MediaKind, OutputStream};

    fn single_copy_setup() -> (Supervisor,) {
        let mut input = InputFile::new(0);
        let mut istream = InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25));
        istream.output_consumers = vec![StreamId::new(0, 0)];
        input.streams.push(istream);

        let mut output = OutputFile::new(0);
        output.streams.push(OutputStream::new(
            0,
            0,
            MediaKind::Video,
            TimeBase::new(1, 25),
            StreamSource::StreamCopy { input: StreamId::new(0, 0) },
        ));

        let mut collaborators = Collaborators::new();
        collaborators.demuxers.insert(0, Box::new(MockDemuxer::with_packet_count(3)));
        collaborators.muxers.insert(0, Box::new(MockMuxer::default()));

        let sup = Supervisor::new(Config::default(), vec![input], vec![output], vec![], collaborators);
        (sup,)
    }

    #[test]
    fn run_drains_a_stream_copy_to_completion() {
        let (mut sup,) = single_copy_setup();
        sup.run(&|| false).unwrap();
        assert!(sup.outputs[0].streams[0].finished.contains(Finished::ENCODER_FINISHED));
        assert!(sup.outputs[0].streams[0].packets_written >= 3);
    }

    #[test]
    fn should_stop_halts_before_natural_completion() {
        let (mut sup,) = single_copy_setup();
        sup.run(&|| true).unwrap();
        // Nothing was processed, but finalize still runs (no error-rate failure).
        assert!(!sup.outputs[0].streams[0].finished.any() || sup.outputs[0].streams[0].packets_written == 0);
    }

    #[test]
    fn exit_code_maps_error_rate_to_69() {
        let err: Result<()> = Err(Error::ErrorRateExceeded { rate: 0.9, max: 0.5 });
        assert_eq!(exit_code(&err), 69);
        assert_eq!(exit_code(&Ok(())), 0);
    }

    #[test]
    fn one_input_feeding_two_outputs_delivers_packets_to_both() {
        let mut input = InputFile::new(0);
        let mut istream = InputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25));
        istream.output_consumers = vec![StreamId::new(0, 0), StreamId::new(1, 0)];
        input.streams.push(istream);

        let mut first = OutputFile::new(0);
        first.streams.push(OutputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 25), StreamSource::StreamCopy { input: StreamId::new(0, 0) }));
        let mut second = OutputFile::new(1);
        second.streams.push(OutputStream::new(1, 0, MediaKind::Video, TimeBase::new(1, 25), StreamSource::StreamCopy { input: StreamId::new(0, 0) }));

        let mut collaborators = Collaborators::new();
        collaborators.demuxers.insert(0, Box::new(MockDemuxer::with_packet_count(3)));
        collaborators.muxers.insert(0, Box::new(MockMuxer::default()));
        collaborators.muxers.insert(1, Box::new(MockMuxer::default()));

        let mut sup = Supervisor::new(Config::default(), vec![input], vec![first, second], vec![], collaborators);
        sup.run(&|| false).unwrap();

        assert!(sup.outputs[0].streams[0].packets_written >= 3);
        assert!(sup.outputs[1].streams[0].packets_written >= 3);
    }

    #[test]
    fn eagain_backs_off_before_retrying() {
        struct EagainDemuxer;
        impl Demuxer for EagainDemuxer {
            fn get_packet(&mut self) -> crate::collaborators::DemuxOutcome {
                crate::collaborators::DemuxOutcome::Eagain
            }
        }

        let (mut sup,) = single_copy_setup();
        sup.collaborators.demuxers.insert(0, Box::new(EagainDemuxer));

        let start = Instant::now();
        sup.transcode_step(StreamId::new(0, 0)).unwrap();
        assert!(start.elapsed() >= EAGAIN_BACKOFF);
    }

    #[test]
    fn zero_based_shifts_to_first_observed_timestamp() {
        let mut sup = Supervisor::new(Config::default(), vec![], vec![], vec![], Collaborators::new());
        assert_eq!(sup.zero_based(1000), 0);
        assert_eq!(sup.zero_based(1500), 500);
    }

    #[test]
    fn zero_based_preserves_original_when_copy_ts_set() {
        let mut config = Config::default();
        config.copy_ts = true;
        let mut sup = Supervisor::new(config, vec![], vec![], vec![], Collaborators::new());
        assert_eq!(sup.zero_based(1000), 1000);
        assert_eq!(sup.zero_based(1500), 1500);
    }

    #[test]
    fn zero_based_forces_zero_base_even_with_copy_ts_when_start_at_zero() {
        let mut config = Config::default();
        config.copy_ts = true;
        config.start_at_zero = true;
        let mut sup = Supervisor::new(config, vec![], vec![], vec![], Collaborators::new());
        assert_eq!(sup.zero_based(2000), 0);
        assert_eq!(sup.zero_based(2500), 500);
    }

    #[test]
    fn vstats_file_receives_a_line_when_a_filtered_packet_is_written() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.vstats_filename = Some(tmp.path().to_path_buf());

        let mut output = OutputFile::new(0);
        output.streams.push(OutputStream::new(0, 0, MediaKind::Video, TimeBase::new(1, 1_000_000), StreamSource::Filtered { graph_index: 0 }));
        let graph = vtrans_core::FilterGraph::new(0, true);

        let mut collaborators = Collaborators::new();
        collaborators.muxers.insert(0, Box::new(MockMuxer::default()));

        let mut sup = Supervisor::new(config, vec![], vec![output], vec![graph], collaborators);
        sup.write_filtered_packet(StreamId::new(0, 0), 0, 1).unwrap();

        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        assert!(contents.contains("size="));
    }

    #[test]
    fn subtitle_heartbeat_fires_through_filter_runtime_during_a_real_run() {
        use std::sync::{Arc, Mutex};

        struct RecordingFilter {
            wants: Option<StreamId>,
            heartbeats: Arc<Mutex<Vec<i64>>>,
        }

        impl FilterRuntime for RecordingFilter {
            fn wanted_input(&self) -> Option<StreamId> {
                self.wants
            }
            fn reap(&mut self) -> usize {
                0
            }
            fn send_command(&mut self, _command: &str, _arg: Option<&str>) -> std::result::Result<(), String> {
                Ok(())
            }
            fn queue_command(&mut self, _time: f64, _command: &str, _arg: Option<&str>) -> std::result::Result<(), String> {
                Ok(())
            }
            fn subtitle_heartbeat(&mut self, pts: i64) {
                self.heartbeats.lock().unwrap().push(pts);
            }
        }

        let mut input = InputFile::new(0);
        let mut istream = InputStream::new(0, 0, MediaKind::Subtitle, TimeBase::new(1, 1_000_000));
        istream.filter_sinks = vec![0];
        input.streams.push(istream);

        let mut output = OutputFile::new(0);
        output.streams.push(OutputStream::new(0, 0, MediaKind::Subtitle, TimeBase::new(1, 1_000_000), StreamSource::Filtered { graph_index: 0 }));

        let heartbeats = Arc::new(Mutex::new(Vec::new()));
        let mut collaborators = Collaborators::new();
        collaborators.demuxers.insert(0, Box::new(MockDemuxer::with_packet_count(2)));
        collaborators.filters.insert(0, Box::new(RecordingFilter { wants: Some(StreamId::new(0, 0)), heartbeats: heartbeats.clone() }));
        collaborators.muxers.insert(0, Box::new(MockMuxer::default()));

        let mut sup = Supervisor::new(Config::default(), vec![input], vec![output], vec![vtrans_core::FilterGraph::new(0, true)], collaborators);

        sup.transcode_step(StreamId::new(0, 0)).unwrap();
        sup.transcode_step(StreamId::new(0, 0)).unwrap();

        // No heartbeat on the first packet (nothing shown yet to keep alive);
        // the second packet's later PTS triggers exactly one.
        assert_eq!(heartbeats.lock().unwrap().len(), 1);
    }
}
