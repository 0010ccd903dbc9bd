use crate::{
    camera::{CameraRig, average_root},
    core::{FrameIndex, Vec3},
    host::CameraId,
    pose::PoseTrack,
    scene::SceneTimeline,
};

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
/// Director tuning.
pub struct DirectorConfig {
    /// Minimum frames between establishing-camera switches. Without this,
    /// proximity selection flickers every frame as the cast's average
    /// position drifts across camera boundaries.
    pub switch_hysteresis_frames: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            switch_hysteresis_frames: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// The director's complete mutable state, reset at the start of a render
/// and threaded explicitly through [`step`].
pub struct DirectorState {
    /// Camera currently live, if any frame has been evaluated yet.
    pub live: Option<CameraId>,
    /// Frame of the most recent cut.
    pub last_switch: Option<FrameIndex>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A discrete camera-switch marker on the master timeline, carrying the
/// chosen camera's placement at cut time.
pub struct CameraCut {
    /// Frame the cut lands on.
    pub frame: FrameIndex,
    /// Camera that goes live.
    pub camera: CameraId,
    /// Camera position at cut time.
    pub position: Vec3,
    /// Unit aim direction at cut time.
    pub aim: Vec3,
}

/// Evaluate the director for one frame.
///
/// Must be called with strictly increasing frames: the hysteresis decision
/// depends on `state.last_switch`. Exactly one character with a non-idle
/// cue gets its chase camera unconditionally; otherwise the establishing
/// camera nearest the cast's average position is chosen, throttled by the
/// hysteresis window. The current camera is re-aimed every frame either
/// way; only the choice of camera is throttled.
pub fn step(
    state: DirectorState,
    scene: &SceneTimeline,
    tracks: &[PoseTrack],
    rig: &mut CameraRig,
    frame: FrameIndex,
    config: &DirectorConfig,
) -> (DirectorState, Option<CameraCut>) {
    let mut movers = scene.cast.iter().filter(|character| {
        character
            .cue_at(frame)
            .is_some_and(|cue| cue.clip != scene.idle_clip)
    });
    let single = match (movers.next(), movers.next()) {
        (Some(character), None) => Some(character),
        _ => None,
    };
    let focus = average_root(tracks, frame);

    if let Some(character) = single {
        match rig.chase_for(&character.id) {
            Some(idx) => return step_chase(state, tracks, rig, idx, frame),
            None => {
                tracing::warn!(
                    character = %character.id,
                    "single mover has no chase camera; falling back to establishing shot"
                );
            }
        }
    }

    step_establishing(state, rig, focus, frame, config)
}

fn step_chase(
    state: DirectorState,
    tracks: &[PoseTrack],
    rig: &mut CameraRig,
    idx: usize,
    frame: FrameIndex,
) -> (DirectorState, Option<CameraCut>) {
    let cam = &rig.chase[idx];
    let root = tracks
        .iter()
        .find(|t| t.character == cam.character)
        .map(|t| t.position_at(frame))
        .unwrap_or(Vec3::ZERO);

    if state.live == Some(cam.camera) {
        return (state, None);
    }
    // Single-mover precedence: chase cuts are not throttled.
    let cut = CameraCut {
        frame,
        camera: cam.camera,
        position: cam.position(),
        aim: cam.aim_at(root),
    };
    (
        DirectorState {
            live: Some(cam.camera),
            last_switch: Some(frame),
        },
        Some(cut),
    )
}

fn step_establishing(
    state: DirectorState,
    rig: &mut CameraRig,
    focus: Vec3,
    frame: FrameIndex,
    config: &DirectorConfig,
) -> (DirectorState, Option<CameraCut>) {
    let Some(nearest) = rig.nearest_establishing(focus) else {
        // Nothing to cut to; keep whatever is live.
        return (state, None);
    };

    let switch_allowed = state.last_switch.is_none_or(|last| {
        frame.0.saturating_sub(last.0) >= config.switch_hysteresis_frames
    });
    let target = rig.establishing[nearest].camera;

    // Re-aim the camera that will be live this frame.
    if state.live == Some(target) || switch_allowed {
        let cam = &mut rig.establishing[nearest];
        cam.aim = (focus - cam.position).normalized().unwrap_or(cam.aim);
    } else if let Some(live) = state.live
        && let Some(cam) = rig.establishing.iter_mut().find(|c| c.camera == live)
    {
        cam.aim = (focus - cam.position).normalized().unwrap_or(cam.aim);
    }

    if state.live == Some(target) || !switch_allowed {
        return (state, None);
    }

    let cam = &rig.establishing[nearest];
    let cut = CameraCut {
        frame,
        camera: cam.camera,
        position: cam.position,
        aim: cam.aim,
    };
    (
        DirectorState {
            live: Some(cam.camera),
            last_switch: Some(frame),
        },
        Some(cut),
    )
}
