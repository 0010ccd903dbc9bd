use std::{collections::BTreeMap, path::Path};

use crate::{
    clips::CycleMetadata,
    core::{FrameIndex, FrameRange, Vec3},
    error::{StagecraftError, StagecraftResult},
    scene::{AudioEvent, Backdrop, Character, MotionCue, SceneTimeline},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// JSON document form of a scene timeline.
///
/// This is what the upstream story pipeline writes: one entry per sentence
/// with the audio it generated and, per mentioned character, the clip to
/// play and the position the character should reach. Positions are chained
/// at load time: a cue starts wherever the previous cue for that character
/// ended.
pub struct SceneTimelineDoc {
    /// Cast table. Characters referenced by entries must appear here.
    pub cast: Vec<CastEntry>,
    /// Idle clip id used for gap filling and stationary beats.
    #[serde(default = "default_idle_clip")]
    pub idle_clip: String,
    /// Backdrop asset references, forwarded untouched.
    #[serde(default)]
    pub backdrop: Backdrop,
    /// Sentence entries ordered by frame.
    pub entries: Vec<SceneEntry>,
    /// Total scene length in frames.
    pub end_frame: u64,
    /// Optional clip metadata table for providers that have no other
    /// source of cycle data (the CLI uses this).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clips: BTreeMap<String, CycleMetadata>,
}

fn default_idle_clip() -> String {
    "idle".into()
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Cast table entry.
pub struct CastEntry {
    /// Stable character identifier.
    pub id: String,
    /// Rig asset reference.
    pub rig: String,
    /// Character height in world units.
    #[serde(default = "default_height")]
    pub height: f64,
    /// Position before the first cue.
    #[serde(default)]
    pub start_position: Vec3,
}

fn default_height() -> f64 {
    1.8
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One sentence worth of timeline: audio plus per-character cues.
pub struct SceneEntry {
    /// Absolute frame this entry starts at.
    pub frame: u64,
    /// Audio clips starting at this frame.
    #[serde(default)]
    pub audio: Vec<String>,
    /// Cue per mentioned character.
    #[serde(default)]
    pub characters: BTreeMap<String, CueEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Per-character cue inside an entry.
pub struct CueEntry {
    /// Motion clip to play.
    pub clip: String,
    /// Where the character must end up. Omitted for stationary beats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<Vec3>,
}

impl SceneTimelineDoc {
    /// Parse a document from a JSON string.
    pub fn from_json(json: &str) -> StagecraftResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StagecraftError::serde(format!("scene timeline document: {e}")))
    }

    /// Read and parse a document from disk.
    pub fn from_path(path: &Path) -> StagecraftResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StagecraftError::serde(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Resolve the document into a [`SceneTimeline`], chaining cue
    /// positions per character and validating the result.
    pub fn to_scene(&self) -> StagecraftResult<SceneTimeline> {
        let mut last_frame: Option<u64> = None;
        for entry in &self.entries {
            if let Some(prev) = last_frame
                && entry.frame <= prev
            {
                return Err(StagecraftError::validation(format!(
                    "entry frames must strictly increase ({} follows {prev})",
                    entry.frame
                )));
            }
            last_frame = Some(entry.frame);
        }
        if let Some(prev) = last_frame
            && self.end_frame <= prev
        {
            return Err(StagecraftError::validation(format!(
                "end_frame {} must lie past the final entry at {prev}",
                self.end_frame
            )));
        }

        let mut cast: Vec<Character> = self
            .cast
            .iter()
            .map(|c| Character {
                id: c.id.clone(),
                rig: c.rig.clone(),
                height: c.height,
                start_position: c.start_position,
                cues: Vec::new(),
            })
            .collect();
        let mut positions: BTreeMap<String, Vec3> = self
            .cast
            .iter()
            .map(|c| (c.id.clone(), c.start_position))
            .collect();

        let mut audio = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let window_end = self
                .entries
                .get(i + 1)
                .map(|next| next.frame)
                .unwrap_or(self.end_frame);
            let range = FrameRange::new(FrameIndex(entry.frame), FrameIndex(window_end))?;

            for clip in &entry.audio {
                audio.push(AudioEvent {
                    frame: FrameIndex(entry.frame),
                    clip: clip.clone(),
                });
            }

            for (character_id, cue) in &entry.characters {
                let Some(character) = cast.iter_mut().find(|c| c.id == *character_id) else {
                    return Err(StagecraftError::missing_character(format!(
                        "entry at frame {} references unknown character '{character_id}'",
                        entry.frame
                    )));
                };
                let start = positions
                    .get(character_id)
                    .copied()
                    .unwrap_or(character.start_position);
                let end = cue.end_position.unwrap_or(start);
                character.cues.push(MotionCue {
                    clip: cue.clip.clone(),
                    range,
                    start_position: start,
                    end_position: end,
                });
                positions.insert(character_id.clone(), end);
            }
        }

        let scene = SceneTimeline {
            cast,
            audio,
            idle_clip: self.idle_clip.clone(),
            backdrop: self.backdrop.clone(),
            end_frame: FrameIndex(self.end_frame),
        };
        scene.validate()?;
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_json() -> &'static str {
        r#"{
            "cast": [
                {"id": "remy", "rig": "characters/remy", "height": 1.8},
                {"id": "mia", "rig": "characters/mia", "start_position": {"x": 4.0, "y": 0.0, "z": 0.0}}
            ],
            "entries": [
                {"frame": 1, "audio": ["audio/s0.wav"], "characters": {
                    "remy": {"clip": "walking", "end_position": {"x": 0.0, "y": 10.0, "z": 0.0}}
                }},
                {"frame": 61, "audio": ["audio/s1.wav"], "characters": {
                    "remy": {"clip": "waving"},
                    "mia": {"clip": "walking", "end_position": {"x": 4.0, "y": 8.0, "z": 0.0}}
                }}
            ],
            "end_frame": 120
        }"#
    }

    #[test]
    fn positions_chain_between_entries() {
        let scene = SceneTimelineDoc::from_json(doc_json()).unwrap().to_scene().unwrap();
        let remy = scene.character("remy").unwrap();
        assert_eq!(remy.cues.len(), 2);
        assert_eq!(remy.cues[0].start_position, Vec3::ZERO);
        assert_eq!(remy.cues[0].end_position, Vec3::new(0.0, 10.0, 0.0));
        // The waving cue has no target: the character stays put.
        assert_eq!(remy.cues[1].start_position, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(remy.cues[1].end_position, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn entry_windows_span_to_next_entry() {
        let scene = SceneTimelineDoc::from_json(doc_json()).unwrap().to_scene().unwrap();
        let remy = scene.character("remy").unwrap();
        assert_eq!(remy.cues[0].range.start, FrameIndex(1));
        assert_eq!(remy.cues[0].range.end, FrameIndex(61));
        assert_eq!(remy.cues[1].range.end, FrameIndex(120));
    }

    #[test]
    fn unknown_character_is_rejected() {
        let json = r#"{
            "cast": [],
            "entries": [{"frame": 1, "characters": {"ghost": {"clip": "walking"}}}],
            "end_frame": 60
        }"#;
        let err = SceneTimelineDoc::from_json(json).unwrap().to_scene().unwrap_err();
        assert!(matches!(err, StagecraftError::MissingCharacter(_)));
    }

    #[test]
    fn non_increasing_entries_are_rejected() {
        let json = r#"{
            "cast": [{"id": "remy", "rig": "characters/remy"}],
            "entries": [{"frame": 50}, {"frame": 50}],
            "end_frame": 100
        }"#;
        let err = SceneTimelineDoc::from_json(json).unwrap().to_scene().unwrap_err();
        assert!(matches!(err, StagecraftError::Validation(_)));
    }
}
