use crate::{
    clips::MotionClipProvider,
    core::{FrameIndex, Vec3, rotate_to_facing},
    cycles::ResolvedSegment,
    error::{StagecraftError, StagecraftResult},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One keyframe of a character's placement.
pub struct PoseSample {
    /// Absolute frame.
    pub frame: FrameIndex,
    /// Root position in world space.
    pub position: Vec3,
    /// Unit facing direction in the ground plane.
    pub facing: Vec3,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// The complete set of placement samples driving one character, in strictly
/// increasing frame order. Samples are linearly interpolated; the piecewise
/// linear shape matches the even displacement split and cannot overshoot.
pub struct PoseTrack {
    /// Character this track drives.
    pub character: String,
    /// Keyframes ordered by frame.
    pub samples: Vec<PoseSample>,
}

impl PoseTrack {
    /// Root position at `frame`, linearly interpolated and clamped to the
    /// track's extent.
    pub fn position_at(&self, frame: FrameIndex) -> Vec3 {
        match self.samples.as_slice() {
            [] => Vec3::ZERO,
            [only] => only.position,
            samples => {
                let idx = samples.partition_point(|s| s.frame.0 <= frame.0);
                if idx == 0 {
                    return samples[0].position;
                }
                if idx >= samples.len() {
                    return samples[samples.len() - 1].position;
                }
                let a = &samples[idx - 1];
                let b = &samples[idx];
                let denom = b.frame.0 - a.frame.0;
                if denom == 0 {
                    return a.position;
                }
                let t = (frame.0 - a.frame.0) as f64 / denom as f64;
                Vec3::lerp(a.position, b.position, t)
            }
        }
    }
}

/// Build the pose track for one character from its resolved segments.
///
/// Per segment three samples are emitted:
///
/// - at the segment start, the nominal start position;
/// - at the last played frame, `end - rotated_offset`, so the clip's own
///   root motion walks the character the remaining distance;
/// - one frame past the segment, the exact end position, pinning the
///   character in place once the next clip takes over.
///
/// The rotated offset is the clip's per-cycle root displacement turned to
/// the segment's facing direction. Stationary segments reuse the previous
/// facing; the first segment of a stationary character faces canonical
/// forward.
pub fn build_pose_track(
    character: &str,
    segments: &[ResolvedSegment],
    clips: &impl MotionClipProvider,
) -> StagecraftResult<PoseTrack> {
    let mut samples: Vec<PoseSample> = Vec::with_capacity(segments.len() * 3);
    let mut facing = Vec3::FORWARD;

    let push = |sample: PoseSample, samples: &mut Vec<PoseSample>| -> StagecraftResult<()> {
        if let Some(last) = samples.last() {
            if sample.frame.0 < last.frame.0 {
                return Err(StagecraftError::overlapping_cue(format!(
                    "character '{character}' has segments writing frame {} after frame {}",
                    sample.frame.0, last.frame.0
                )));
            }
            if sample.frame.0 == last.frame.0 {
                // A segment's start sample coincides with the previous
                // segment's pin sample; the later segment is authoritative.
                samples.pop();
            }
        }
        samples.push(sample);
        Ok(())
    };

    for segment in segments {
        if segment.range.is_empty() {
            continue;
        }
        let metadata = clips.cycle_metadata(&segment.clip)?;
        facing = (segment.end_position - segment.start_position)
            .flat()
            .normalized()
            .unwrap_or(facing);
        let rotated_offset = rotate_to_facing(metadata.cycle_displacement.flat(), facing);

        push(
            PoseSample {
                frame: segment.range.start,
                position: segment.start_position,
                facing,
            },
            &mut samples,
        )?;
        let last_played = FrameIndex(segment.range.end.0 - 1);
        if last_played.0 > segment.range.start.0 {
            push(
                PoseSample {
                    frame: last_played,
                    position: segment.end_position - rotated_offset,
                    facing,
                },
                &mut samples,
            )?;
        }
        push(
            PoseSample {
                frame: segment.range.end,
                position: segment.end_position,
                facing,
            },
            &mut samples,
        )?;
    }

    Ok(PoseTrack {
        character: character.to_owned(),
        samples,
    })
}
