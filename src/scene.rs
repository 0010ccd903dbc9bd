pub mod doc;

use crate::{
    core::{FrameIndex, FrameRange, Vec3},
    error::{StagecraftError, StagecraftResult},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// An instruction that a character play a motion clip while moving between
/// two world positions over a frame range.
pub struct MotionCue {
    /// Motion clip identifier.
    pub clip: String,
    /// Timeline placement `[start, end)`.
    pub range: FrameRange,
    /// World position at `range.start`.
    pub start_position: Vec3,
    /// World position the character must reach by the end of the cue.
    pub end_position: Vec3,
}

impl MotionCue {
    /// Net displacement the cue asks for, projected to the ground plane.
    pub fn displacement(&self) -> Vec3 {
        (self.end_position - self.start_position).flat()
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A member of the cast with its ordered cue list.
pub struct Character {
    /// Stable character identifier.
    pub id: String,
    /// Rig asset reference, resolved by the animation host.
    pub rig: String,
    /// Character height in world units; drives camera placement.
    pub height: f64,
    /// World position before the first cue starts.
    pub start_position: Vec3,
    /// Cues ordered by `range.start`.
    pub cues: Vec<MotionCue>,
}

impl Character {
    /// The cue active at `frame`, if any.
    pub fn cue_at(&self, frame: FrameIndex) -> Option<&MotionCue> {
        self.cues.iter().find(|c| c.range.contains(frame))
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One audio clip placed at an absolute frame.
pub struct AudioEvent {
    /// Frame the clip starts playing.
    pub frame: FrameIndex,
    /// Audio clip reference, resolved by the animation host.
    pub clip: String,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Backdrop asset references produced by the upstream generation pipeline.
/// Passed through to the host untouched.
pub struct Backdrop {
    /// Surrounding wall image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    /// Ground image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// Sky/ceiling image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<String>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// The read-only scene produced by the upstream story pipeline.
///
/// Built once (usually via [`doc::SceneTimelineDoc`]) and never mutated by
/// the compositor. The document form is the contract the NLP/generation
/// pipeline satisfies; this is the resolved in-memory model.
pub struct SceneTimeline {
    /// All characters appearing in the scene.
    pub cast: Vec<Character>,
    /// Audio schedule in document order.
    pub audio: Vec<AudioEvent>,
    /// Clip played when a character has nothing to do.
    pub idle_clip: String,
    /// Backdrop references forwarded to the host.
    #[serde(default)]
    pub backdrop: Backdrop,
    /// Total scene length in frames.
    pub end_frame: FrameIndex,
}

impl SceneTimeline {
    /// Look up a cast member by id.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.cast.iter().find(|c| c.id == id)
    }

    /// Validate every scene invariant.
    ///
    /// Runs before any host mutation; a scene that fails here has made no
    /// observable change anywhere.
    pub fn validate(&self) -> StagecraftResult<()> {
        if self.end_frame.0 == 0 {
            return Err(StagecraftError::validation("scene end_frame must be > 0"));
        }
        if self.idle_clip.trim().is_empty() {
            return Err(StagecraftError::validation("idle clip id must be non-empty"));
        }

        for (i, character) in self.cast.iter().enumerate() {
            if character.id.trim().is_empty() {
                return Err(StagecraftError::validation("character id must be non-empty"));
            }
            if self.cast[..i].iter().any(|c| c.id == character.id) {
                return Err(StagecraftError::validation(format!(
                    "duplicate character id '{}'",
                    character.id
                )));
            }
            if character.rig.trim().is_empty() {
                return Err(StagecraftError::validation(format!(
                    "character '{}' has an empty rig reference",
                    character.id
                )));
            }
            if !character.height.is_finite() || character.height <= 0.0 {
                return Err(StagecraftError::validation(format!(
                    "character '{}' height must be finite and > 0",
                    character.id
                )));
            }
            if !character.start_position.is_finite() {
                return Err(StagecraftError::validation(format!(
                    "character '{}' start position must be finite",
                    character.id
                )));
            }
            validate_cues(character, self.end_frame)?;
        }

        let mut last_audio = 0u64;
        for event in &self.audio {
            if event.clip.trim().is_empty() {
                return Err(StagecraftError::validation("audio clip reference must be non-empty"));
            }
            if event.frame.0 < last_audio {
                return Err(StagecraftError::validation(
                    "audio events must be ordered by frame",
                ));
            }
            last_audio = event.frame.0;
        }

        Ok(())
    }
}

fn validate_cues(character: &Character, end_frame: FrameIndex) -> StagecraftResult<()> {
    let mut previous_end: Option<u64> = None;
    for cue in &character.cues {
        if cue.clip.trim().is_empty() {
            return Err(StagecraftError::validation(format!(
                "character '{}' has a cue with an empty clip id",
                character.id
            )));
        }
        if cue.range.is_empty() {
            return Err(StagecraftError::validation(format!(
                "character '{}' cue '{}' covers no frames",
                character.id, cue.clip
            )));
        }
        if cue.range.end.0 > end_frame.0 {
            return Err(StagecraftError::validation(format!(
                "character '{}' cue '{}' runs past the scene end",
                character.id, cue.clip
            )));
        }
        if !cue.start_position.is_finite() || !cue.end_position.is_finite() {
            return Err(StagecraftError::validation(format!(
                "character '{}' cue '{}' has a non-finite position",
                character.id, cue.clip
            )));
        }
        if let Some(prev) = previous_end
            && cue.range.start.0 < prev
        {
            return Err(StagecraftError::overlapping_cue(format!(
                "character '{}' cue '{}' starts at frame {} before the previous cue ends at {}",
                character.id, cue.clip, cue.range.start.0, prev
            )));
        }
        previous_end = Some(cue.range.end.0);
    }
    Ok(())
}
