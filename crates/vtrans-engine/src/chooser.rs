// crates/vtrans-engine/src/chooser.rs
//
// C7: output-driven scheduling. The main loop never asks "what's next in
// the input"; it asks "which output is furthest behind", then pulls exactly
// enough input to feed that one. Two tiers, per spec.md §4.7:
//
// 1. Any non-finished output that hasn't been initialized yet, and whose
//    inputs aren't done, is chosen immediately regardless of its timing
//    metric — it needs to be set up before its timing means anything.
// 2. Otherwise, lowest timing key wins (`None` sorts before every `Some`,
//    spec.md §3's "-infinity" convention); a filter-fed output's key is its
//    graph's `last_pts` (skipped entirely if the graph hasn't produced
//    anything yet), a stream-copy output's key is its own `last_mux_dts`.
//    Ties are broken by `StreamId` order so the choice is deterministic
//    across runs.

use vtrans_core::{Finished, FilterGraph, OutputFile, StreamId, StreamSource};

/// The output stream `choose_output` selects, or `None` if every stream is
/// finished (time to wind the pipeline down).
pub fn choose_output(files: &[OutputFile], graphs: &[FilterGraph]) -> Option<StreamId> {
    let mut pending_init: Option<StreamId> = None;
    for file in files {
        for stream in &file.streams {
            if stream.finished.contains(Finished::ENCODER_FINISHED) {
                continue;
            }
            if !stream.initialized && !stream.inputs_done {
                let id = stream.id();
                pending_init = Some(match pending_init {
                    Some(best) if best < id => best,
                    _ => id,
                });
            }
        }
    }
    if let Some(id) = pending_init {
        return Some(id);
    }

    let mut best: Option<(StreamId, Option<i64>)> = None;

    for file in files {
        for stream in &file.streams {
            if stream.finished.contains(Finished::ENCODER_FINISHED) {
                continue;
            }
            let key = match stream.source {
                StreamSource::StreamCopy { .. } => stream.last_mux_dts,
                StreamSource::Filtered { graph_index } => match graphs.get(graph_index).and_then(|g| g.last_pts) {
                    Some(pts) => Some(pts),
                    None => continue,
                },
            };
            let id = stream.id();
            best = Some(match best {
                None => (id, key),
                Some((best_id, best_key)) => {
                    if is_further_behind(key, best_key, id, best_id) {
                        (id, key)
                    } else {
                        (best_id, best_key)
                    }
                }
            });
        }
    }

    best.map(|(id, _)| id)
}

fn is_further_behind(key: Option<i64>, best_key: Option<i64>, id: StreamId, best_id: StreamId) -> bool {
    match (key, best_key) {
        (None, None) => id < best_id,
        (None, Some(_)) => true,
        (Some(_), None) => false,
        (Some(a), Some(b)) if a == b => id < best_id,
        (Some(a), Some(b)) => a < b,
    }
}
