// crates/vtrans-engine/src/subtitle.rs
//
// C4: subtitle bookkeeping. sub2video heartbeats keep an overlay filter
// fed a still bitmap between subtitle events instead of going blank; the
// fix_sub_duration path retroactively extends the previous event once the
// next one's PTS is known, since many subtitle formats never carry an
// explicit end time of their own.

use vtrans_core::InputStream;

/// One bitmap or text plane of a subtitle rectangle. Bitmap rects carry a
/// palette in `planes[1]`, laid out as `u32` RGBA entries rather than pixel
/// data — the one plane that needs a different copy length than `linesize *
/// height` implies.
#[derive(Debug, Clone)]
pub struct SubtitleRect {
    pub is_bitmap: bool,
    pub width: usize,
    pub height: usize,
    pub linesize: [usize; 4],
    pub planes: [Vec<u8>; 4],
    /// Palette entry count (`planes[1]` holds `palette_len * 4` bytes).
    pub palette_len: usize,
}

#[derive(Debug, Clone)]
pub struct SubtitleEvent {
    /// Canonical-time-base PTS this event starts being shown at.
    pub pts: i64,
    /// `0` means "until superseded" — the case fix_sub_duration resolves.
    pub duration_us: i64,
    pub rects: Vec<SubtitleRect>,
}

/// Deep-copies a subtitle event's rectangle data. Every plane copies
/// `linesize[i] * height` bytes except `planes[1]` on a bitmap rect, which
/// holds the palette and is sized by `palette_len * 4` instead — getting
/// this wrong either truncates the palette or reads past the pixel buffer.
pub fn deep_copy_event(src: &SubtitleEvent) -> SubtitleEvent {
    let rects = src
        .rects
        .iter()
        .map(|rect| {
            let mut planes: [Vec<u8>; 4] = Default::default();
            for i in 0..4 {
                let len = if rect.is_bitmap && i == 1 {
                    rect.palette_len * 4
                } else {
                    rect.linesize[i] * rect.height
                };
                planes[i] = rect.planes[i].iter().copied().take(len).collect();
            }
            SubtitleRect { planes, ..rect.clone() }
        })
        .collect();

    SubtitleEvent { pts: src.pts, duration_us: src.duration_us, rects }
}

/// Whether `stream` needs a heartbeat frame re-submitted at `now_pts` to keep
/// its sub2video overlay alive. True once a prior event has been shown and
/// its nominal duration (if any) hasn't yet elapsed.
pub fn needs_heartbeat(stream: &InputStream, now_pts: i64) -> bool {
    match stream.prev_sub_pts {
        Some(prev) => now_pts > prev,
        None => false,
    }
}

/// fix_sub_duration: given the previous event's PTS and the new event's PTS
/// (both canonical time base), the retroactive duration to apply to the
/// previous event. Never negative — an out-of-order or duplicate PTS leaves
/// the previous duration untouched.
pub fn retroactive_duration(prev_pts: i64, next_pts: i64) -> Option<i64> {
    let delta = next_pts.checked_sub(prev_pts)?;
    if delta > 0 {
        Some(delta)
    } else {
        None
    }
}
