use crate::{
    clips::CycleMetadata,
    core::{FrameIndex, FrameRange, Vec3},
    error::StagecraftResult,
    scene::MotionCue,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One physical playback of a clip. A cue resolves into several of these
/// when it outlasts the clip's native cycle.
pub struct ResolvedSegment {
    /// Motion clip being played.
    pub clip: String,
    /// Playback placement `[start, end)`.
    pub range: FrameRange,
    /// World position at the segment start.
    pub start_position: Vec3,
    /// World position the segment must reach.
    pub end_position: Vec3,
}

/// Split a cue into per-cycle segments.
///
/// The cue's total displacement is divided evenly across the repeats so the
/// per-cycle speed stays constant; uneven splitting reads as visible
/// acceleration between cycles. The final segment is clamped to the cue's
/// end frame even when that truncates the clip mid-cycle.
pub fn resolve_cue(
    cue: &MotionCue,
    metadata: &CycleMetadata,
) -> StagecraftResult<Vec<ResolvedSegment>> {
    metadata.validate(&cue.clip)?;

    let total = cue.range.len_frames();
    if total == 0 {
        return Ok(Vec::new());
    }
    let repeats = total.div_ceil(metadata.cycle_frames).max(1);
    let step = cue.displacement() / repeats as f64;

    tracing::debug!(
        clip = %cue.clip,
        total,
        cycle = metadata.cycle_frames,
        repeats,
        "resolving cue"
    );

    let mut segments = Vec::with_capacity(repeats as usize);
    for i in 0..repeats {
        let start = cue.range.start.0 + i * metadata.cycle_frames;
        let end = (start + metadata.cycle_frames).min(cue.range.end.0);
        let start_position = cue.start_position + step * i as f64;
        let end_position = if i + 1 == repeats {
            // Land exactly on the cue target; no accumulated float drift.
            cue.end_position
        } else {
            cue.start_position + step * (i + 1) as f64
        };
        segments.push(ResolvedSegment {
            clip: cue.clip.clone(),
            range: FrameRange {
                start: FrameIndex(start),
                end: FrameIndex(end),
            },
            start_position,
            end_position,
        });
    }
    Ok(segments)
}

/// Backfill idle cues wherever a character has nothing scheduled: before
/// the first cue, between cues, and from the last cue to the scene end.
/// The character stands where it last ended up.
///
/// The upstream pipeline usually emits a gap-free schedule; this makes the
/// compositor robust against sentences that mention only part of the cast.
pub fn fill_idle_gaps(
    cues: Vec<MotionCue>,
    idle_clip: &str,
    start_position: Vec3,
    scene_end: FrameIndex,
) -> Vec<MotionCue> {
    let mut out = Vec::with_capacity(cues.len() + 2);
    let mut cursor_frame = 0u64;
    let mut cursor_position = start_position;

    let idle_between = |from: u64, to: u64, at: Vec3| MotionCue {
        clip: idle_clip.to_owned(),
        range: FrameRange {
            start: FrameIndex(from),
            end: FrameIndex(to),
        },
        start_position: at,
        end_position: at,
    };

    for cue in cues {
        if cue.range.start.0 > cursor_frame {
            out.push(idle_between(cursor_frame, cue.range.start.0, cue.start_position));
        }
        cursor_frame = cue.range.end.0;
        cursor_position = cue.end_position;
        out.push(cue);
    }
    if cursor_frame < scene_end.0 {
        out.push(idle_between(cursor_frame, scene_end.0, cursor_position));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_cue() -> MotionCue {
        MotionCue {
            clip: "walking".into(),
            range: FrameRange {
                start: FrameIndex(1),
                end: FrameIndex(61),
            },
            start_position: Vec3::ZERO,
            end_position: Vec3::new(0.0, 10.0, 0.0),
        }
    }

    fn walk_metadata() -> CycleMetadata {
        CycleMetadata {
            cycle_frames: 20,
            cycle_displacement: Vec3::new(0.0, 3.0, 0.0),
        }
    }

    #[test]
    fn repeats_cover_cue_exactly() {
        let segments = resolve_cue(&walk_cue(), &walk_metadata()).unwrap();
        assert_eq!(segments.len(), 3);
        let total: u64 = segments.iter().map(|s| s.range.len_frames()).sum();
        assert_eq!(total, 60);
        // Contiguous, no gaps or overlap.
        for pair in segments.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
    }

    #[test]
    fn displacement_splits_evenly() {
        let segments = resolve_cue(&walk_cue(), &walk_metadata()).unwrap();
        assert!((segments[0].end_position.y - 10.0 / 3.0).abs() < 1e-9);
        assert!((segments[1].end_position.y - 20.0 / 3.0).abs() < 1e-9);
        // Final segment lands exactly on the target.
        assert_eq!(segments[2].end_position, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn short_cue_truncates_single_cycle() {
        let mut cue = walk_cue();
        cue.range.end = FrameIndex(13); // 12 frames, under one 20-frame cycle
        let segments = resolve_cue(&cue, &walk_metadata()).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].range.end, FrameIndex(13));
        assert_eq!(segments[0].end_position, cue.end_position);
    }

    #[test]
    fn partial_final_cycle_is_clamped() {
        let mut cue = walk_cue();
        cue.range.end = FrameIndex(51); // 50 frames over a 20-frame cycle
        let segments = resolve_cue(&cue, &walk_metadata()).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].range.start, FrameIndex(41));
        assert_eq!(segments[2].range.end, FrameIndex(51));
    }

    #[test]
    fn zero_cycle_length_fails() {
        let metadata = CycleMetadata {
            cycle_frames: 0,
            cycle_displacement: Vec3::ZERO,
        };
        assert!(resolve_cue(&walk_cue(), &metadata).is_err());
    }

    #[test]
    fn gaps_fill_with_idle() {
        let cues = vec![walk_cue()]; // covers [1, 61)
        let filled = fill_idle_gaps(cues, "idle", Vec3::ZERO, FrameIndex(120));
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[0].clip, "idle");
        assert_eq!(filled[0].range.start, FrameIndex(0));
        assert_eq!(filled[0].range.end, FrameIndex(1));
        assert_eq!(filled[2].clip, "idle");
        assert_eq!(filled[2].range.start, FrameIndex(61));
        assert_eq!(filled[2].range.end, FrameIndex(120));
        // Trailing idle holds the walk target.
        assert_eq!(filled[2].start_position, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(filled[2].end_position, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn gap_free_schedule_is_untouched_in_the_middle() {
        let a = walk_cue();
        let mut b = walk_cue();
        b.clip = "idle".into();
        b.range = FrameRange {
            start: FrameIndex(61),
            end: FrameIndex(120),
        };
        b.start_position = a.end_position;
        b.end_position = a.end_position;
        let filled = fill_idle_gaps(vec![a, b], "idle", Vec3::ZERO, FrameIndex(120));
        // Only the leading [0, 1) gap is filled.
        assert_eq!(filled.len(), 3);
    }
}
