//! Stagecraft turns a story scene timeline into animation host commands.
//!
//! The input is a [`SceneTimeline`]: per-character motion cues (a clip, a
//! frame range, start/end world positions) plus an audio schedule, as
//! produced by an upstream story pipeline. The output is a pose track per
//! character and a camera track, committed to an [`AnimationHost`].
//!
//! # Pipeline overview
//!
//! 1. **Schedule**: each cue is split into per-cycle segments, dividing the
//!    cue's displacement evenly across clip loops ([`resolve_cue`]).
//! 2. **Build**: segments become placement keyframes with root-motion
//!    compensation, so looped clips stay glued to their target path
//!    ([`build_pose_track`]). Characters build independently and in
//!    parallel when asked.
//! 3. **Direct**: a sequential per-frame state machine picks the live
//!    camera (chase for a lone mover, nearest establishing otherwise) with
//!    hysteresis against rapid cutting ([`director::step`]).
//! 4. **Commit**: rigs, keyframes, cameras, cut markers and audio are
//!    written to the host only after every fallible step has passed.
#![forbid(unsafe_code)]

pub mod camera;
pub mod clips;
pub mod compose;
pub mod core;
pub mod cycles;
pub mod director;
pub mod error;
pub mod host;
pub mod pose;
pub mod rig;
pub mod scene;

pub use camera::{CameraConfig, CameraRig, CameraSpec, ChaseCamera, EstablishingCamera};
pub use clips::{
    CachedClips, CycleMetadata, GenerativeAssetProvider, MotionClipProvider, StaticClips,
};
pub use compose::{ComposeOptions, ComposeReport, ComposeThreading, SCENE_TAIL_FRAMES, compose};
pub use core::{FrameIndex, FrameRange, Vec3};
pub use cycles::{ResolvedSegment, fill_idle_gaps, resolve_cue};
pub use director::{CameraCut, DirectorConfig, DirectorState};
pub use error::{StagecraftError, StagecraftResult};
pub use host::{AnimationHost, CameraId, MemoryHost, RigHandle, RigId};
pub use pose::{PoseSample, PoseTrack, build_pose_track};
pub use rig::{JointAliases, JointMap, JointRole};
pub use scene::{AudioEvent, Backdrop, Character, MotionCue, SceneTimeline, doc::SceneTimelineDoc};
