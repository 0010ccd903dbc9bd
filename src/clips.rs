use std::{collections::BTreeMap, sync::Mutex};

use crate::{
    core::Vec3,
    error::{StagecraftError, StagecraftResult},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Per-cycle metadata for a motion clip: how long one loop runs and how far
/// the root bone travels over it (in the clip's own reference frame, rig
/// forward +Y).
pub struct CycleMetadata {
    /// Native cycle length in frames.
    pub cycle_frames: u64,
    /// Net root-bone displacement over one cycle.
    pub cycle_displacement: Vec3,
}

impl CycleMetadata {
    /// Reject metadata the scheduler cannot work with.
    pub fn validate(&self, clip: &str) -> StagecraftResult<()> {
        if self.cycle_frames == 0 {
            return Err(StagecraftError::invalid_clip(format!(
                "clip '{clip}' reports a zero-length cycle"
            )));
        }
        if !self.cycle_displacement.is_finite() {
            return Err(StagecraftError::invalid_clip(format!(
                "clip '{clip}' reports a non-finite cycle displacement"
            )));
        }
        Ok(())
    }
}

/// Source of motion clip cycle metadata.
///
/// Implementations may fetch from anywhere (an asset pipeline, a generation
/// service); the compositor only ever asks once per clip when wrapped in
/// [`CachedClips`].
pub trait MotionClipProvider {
    /// Cycle metadata for `clip`, or [`StagecraftError::InvalidClipData`]
    /// when the clip is unknown or malformed.
    fn cycle_metadata(&self, clip: &str) -> StagecraftResult<CycleMetadata>;
}

#[derive(Clone, Debug, Default)]
/// In-memory clip table. Serves tests and the CLI, where the scene document
/// carries the metadata.
pub struct StaticClips {
    table: BTreeMap<String, CycleMetadata>,
}

impl StaticClips {
    /// Build from a clip-id → metadata table.
    pub fn from_table(table: BTreeMap<String, CycleMetadata>) -> Self {
        Self { table }
    }

    /// Insert one clip entry.
    pub fn insert(&mut self, clip: impl Into<String>, metadata: CycleMetadata) {
        self.table.insert(clip.into(), metadata);
    }
}

impl MotionClipProvider for StaticClips {
    fn cycle_metadata(&self, clip: &str) -> StagecraftResult<CycleMetadata> {
        let metadata = self.table.get(clip).copied().ok_or_else(|| {
            StagecraftError::invalid_clip(format!("no cycle metadata for clip '{clip}'"))
        })?;
        metadata.validate(clip)?;
        Ok(metadata)
    }
}

#[derive(Debug)]
/// Memoizing wrapper: any external fetch happens once per clip, never per
/// frame or per segment.
pub struct CachedClips<P> {
    inner: P,
    cache: Mutex<BTreeMap<String, CycleMetadata>>,
}

impl<P: MotionClipProvider> CachedClips<P> {
    /// Wrap a provider.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<P: MotionClipProvider> MotionClipProvider for CachedClips<P> {
    fn cycle_metadata(&self, clip: &str) -> StagecraftResult<CycleMetadata> {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(hit) = cache.get(clip) {
            return Ok(*hit);
        }
        let metadata = self.inner.cycle_metadata(clip)?;
        cache.insert(clip.to_owned(), metadata);
        Ok(metadata)
    }
}

/// Upstream generation boundary. The compositor never calls these itself;
/// the surrounding pipeline uses them to materialize assets before the
/// scene document is written. Declared here so the whole pipeline composes
/// against one contract.
pub trait GenerativeAssetProvider {
    /// Synthesize a motion clip for a prompt; returns the clip reference.
    fn synthesize_clip(&self, prompt: &str, frames: u64) -> StagecraftResult<String>;
    /// Synthesize a still image (backdrop art); returns the asset reference.
    fn synthesize_image(&self, prompt: &str) -> StagecraftResult<String>;
    /// Synthesize an audio clip; returns the clip reference.
    fn synthesize_audio(&self, prompt: &str, frames: u64) -> StagecraftResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn static_clips_validate_on_lookup() {
        let mut clips = StaticClips::default();
        clips.insert(
            "broken",
            CycleMetadata {
                cycle_frames: 0,
                cycle_displacement: Vec3::ZERO,
            },
        );
        assert!(matches!(
            clips.cycle_metadata("broken"),
            Err(StagecraftError::InvalidClipData(_))
        ));
        assert!(matches!(
            clips.cycle_metadata("unknown"),
            Err(StagecraftError::InvalidClipData(_))
        ));
    }

    #[test]
    fn generative_provider_is_pluggable() {
        struct Stub;

        impl GenerativeAssetProvider for Stub {
            fn synthesize_clip(&self, prompt: &str, frames: u64) -> StagecraftResult<String> {
                Ok(format!("clips/{prompt}_{frames}.fbx"))
            }

            fn synthesize_image(&self, prompt: &str) -> StagecraftResult<String> {
                Ok(format!("images/{prompt}.png"))
            }

            fn synthesize_audio(&self, prompt: &str, frames: u64) -> StagecraftResult<String> {
                Ok(format!("audio/{prompt}_{frames}.wav"))
            }
        }

        let stub = Stub;
        assert_eq!(stub.synthesize_clip("walk", 60).unwrap(), "clips/walk_60.fbx");
        assert_eq!(stub.synthesize_image("forest").unwrap(), "images/forest.png");
        assert_eq!(stub.synthesize_audio("rain", 60).unwrap(), "audio/rain_60.wav");
    }

    #[test]
    fn cached_clips_fetch_once() {
        struct Counting(AtomicUsize);

        impl MotionClipProvider for Counting {
            fn cycle_metadata(&self, _clip: &str) -> StagecraftResult<CycleMetadata> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(CycleMetadata {
                    cycle_frames: 20,
                    cycle_displacement: Vec3::new(0.0, 3.0, 0.0),
                })
            }
        }

        let cached = CachedClips::new(Counting(AtomicUsize::new(0)));
        for _ in 0..5 {
            cached.cycle_metadata("walking").unwrap();
        }
        assert_eq!(cached.inner.0.load(Ordering::SeqCst), 1);
    }
}
