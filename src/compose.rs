use rayon::prelude::*;

use crate::{
    camera::{
        CameraConfig, CameraRig, CameraSpec, ChaseCamera, EstablishingCamera, average_root,
        ring_positions, scene_bounds,
    },
    clips::MotionClipProvider,
    core::{FrameIndex, Vec3},
    cycles::{fill_idle_gaps, resolve_cue},
    director::{DirectorConfig, DirectorState},
    error::{StagecraftError, StagecraftResult},
    host::{AnimationHost, CameraId},
    pose::{PoseTrack, build_pose_track},
    rig::JointRole,
    scene::{Character, MotionCue, SceneTimeline},
};

/// Extra frames appended past the last scheduled cue so the final beat is
/// not clipped by the encoder.
pub const SCENE_TAIL_FRAMES: u64 = 10;

#[derive(Clone, Copy, Debug, Default)]
/// How the per-character build stage runs.
pub enum ComposeThreading {
    /// One character at a time.
    #[default]
    Sequential,
    /// Characters in parallel on a rayon pool. Scheduling and pose building
    /// for distinct characters touch disjoint data; the director stays
    /// sequential either way.
    Parallel {
        /// Worker thread override; `None` uses the rayon default.
        threads: Option<usize>,
    },
}

#[derive(Clone, Debug, Default)]
/// Tuning for one compositor run.
pub struct ComposeOptions {
    /// Per-character build threading.
    pub threading: ComposeThreading,
    /// Camera placement tuning.
    pub camera: CameraConfig,
    /// Director tuning.
    pub director: DirectorConfig,
}

#[derive(Clone, Debug, serde::Serialize)]
/// Per-character compositing outcome.
pub struct CharacterReport {
    /// Character id.
    pub character: String,
    /// Resolved segment count (after idle gap filling).
    pub segments: usize,
    /// Pose samples written.
    pub samples: usize,
}

#[derive(Clone, Debug, serde::Serialize)]
/// Summary of a compositor run.
pub struct ComposeReport {
    /// Final frame committed to the host, tail padding included.
    pub scene_end: FrameIndex,
    /// Per-character outcomes.
    pub characters: Vec<CharacterReport>,
    /// Camera-switch markers emitted.
    pub camera_cuts: usize,
    /// Audio clips placed.
    pub audio_events: usize,
}

struct CharacterBuild {
    segments: usize,
    track: PoseTrack,
}

/// Run the full compositor against a scene.
///
/// Everything fallible by construction (validation, cycle scheduling, pose
/// building) happens before the first host call, so a rejected scene
/// leaves the host untouched. Host failures during the commit abort
/// immediately.
#[tracing::instrument(skip_all, fields(cast = scene.cast.len(), end = scene.end_frame.0))]
pub fn compose<P, H>(
    scene: &SceneTimeline,
    clips: &P,
    host: &mut H,
    options: &ComposeOptions,
) -> StagecraftResult<ComposeReport>
where
    P: MotionClipProvider + Sync,
    H: AnimationHost,
{
    scene.validate()?;

    let builds = match options.threading {
        ComposeThreading::Sequential => scene
            .cast
            .iter()
            .map(|c| build_character(c, scene, clips))
            .collect::<StagecraftResult<Vec<_>>>()?,
        ComposeThreading::Parallel { threads } => {
            let pool = build_thread_pool(threads)?;
            let results = pool.install(|| {
                scene
                    .cast
                    .par_iter()
                    .map(|c| build_character(c, scene, clips))
                    .collect::<Vec<_>>()
            });
            results.into_iter().collect::<StagecraftResult<Vec<_>>>()?
        }
    };
    let tracks: Vec<PoseTrack> = builds.iter().map(|b| b.track.clone()).collect();

    // Commit phase: rigs and pose keyframes first.
    let mut rig_handles = Vec::with_capacity(scene.cast.len());
    for (character, build) in scene.cast.iter().zip(&builds) {
        let handle = host.load_rig(&character.rig)?;
        for sample in &build.track.samples {
            host.set_pose_keyframe(handle.id, sample.frame, sample.position, sample.facing)?;
        }
        rig_handles.push(handle);
    }

    // Camera complement: one chase camera per character whose rig has a
    // resolvable root joint, plus the establishing ring.
    let mut rig = CameraRig::default();
    for ((character, handle), track) in scene.cast.iter().zip(&rig_handles).zip(&tracks) {
        if handle.joints.named_joint(JointRole::Root).is_none() {
            tracing::warn!(
                character = %character.id,
                "rig has no resolvable root joint; skipping chase camera"
            );
            continue;
        }
        let root = track.position_at(FrameIndex(0));
        let mut chase = ChaseCamera::new(CameraId(0), &character.id, character.height, root, &options.camera);
        let spec = CameraSpec {
            name: format!("{}_chase", character.id),
            position: chase.position(),
            aim: chase.aim_at(root),
            lens_angle_deg: options.camera.lens_angle_deg,
        };
        chase.camera = host.create_camera(&spec)?;
        rig.chase.push(chase);
    }

    let (center, travel_radius) = scene_bounds(&tracks);
    let ring_radius = travel_radius + options.camera.ring_radius_margin;
    let tallest = scene
        .cast
        .iter()
        .map(|c| c.height)
        .fold(0.0f64, f64::max);
    let ring_height = tallest + options.camera.ring_height_margin;
    let look_at = average_root(&tracks, FrameIndex(0));
    for (i, position) in ring_positions(center, ring_radius, ring_height, options.camera.ring_count)
        .into_iter()
        .enumerate()
    {
        let aim = (look_at - position).normalized().unwrap_or(Vec3::FORWARD);
        let id = host.create_camera(&CameraSpec {
            name: format!("establishing_{i}"),
            position,
            aim,
            lens_angle_deg: options.camera.lens_angle_deg,
        })?;
        rig.establishing.push(EstablishingCamera {
            camera: id,
            position,
            aim,
        });
    }

    // The director is sequential by nature: hysteresis depends on history.
    let mut state = DirectorState::default();
    let mut cuts = Vec::new();
    for f in 0..scene.end_frame.0 {
        let frame = FrameIndex(f);
        rig.update_chase(&tracks, frame, &options.camera);
        let (next, cut) =
            crate::director::step(state, scene, &tracks, &mut rig, frame, &options.director);
        state = next;
        if let Some(cut) = cut {
            cuts.push(cut);
        }
    }
    for cut in &cuts {
        host.mark_active_camera(cut)?;
    }

    for event in &scene.audio {
        host.place_audio_clip(event.frame, &event.clip)?;
    }

    let scene_end = FrameIndex(scene.end_frame.0 + SCENE_TAIL_FRAMES);
    host.set_scene_end(scene_end)?;

    Ok(ComposeReport {
        scene_end,
        characters: scene
            .cast
            .iter()
            .zip(&builds)
            .map(|(c, b)| CharacterReport {
                character: c.id.clone(),
                segments: b.segments,
                samples: b.track.samples.len(),
            })
            .collect(),
        camera_cuts: cuts.len(),
        audio_events: scene.audio.len(),
    })
}

fn build_character<P: MotionClipProvider>(
    character: &Character,
    scene: &SceneTimeline,
    clips: &P,
) -> StagecraftResult<CharacterBuild> {
    let cues = fill_idle_gaps(
        character.cues.clone(),
        &scene.idle_clip,
        character.start_position,
        scene.end_frame,
    );

    let mut segments = Vec::new();
    for cue in &cues {
        let resolved = clips
            .cycle_metadata(&cue.clip)
            .and_then(|metadata| resolve_cue(cue, &metadata));
        match resolved {
            Ok(mut s) => segments.append(&mut s),
            Err(StagecraftError::InvalidClipData(msg)) => {
                // Scene-level recovery: hold the character in place on the
                // idle clip for the cue's window.
                tracing::warn!(
                    character = %character.id,
                    clip = %cue.clip,
                    error = %msg,
                    "substituting idle clip for unusable motion clip"
                );
                let substitute = MotionCue {
                    clip: scene.idle_clip.clone(),
                    range: cue.range,
                    start_position: cue.start_position,
                    end_position: cue.start_position,
                };
                let metadata = clips.cycle_metadata(&scene.idle_clip)?;
                segments.append(&mut resolve_cue(&substitute, &metadata)?);
            }
            Err(other) => return Err(other),
        }
    }

    let track = build_pose_track(&character.id, &segments, clips)?;
    Ok(CharacterBuild {
        segments: segments.len(),
        track,
    })
}

fn build_thread_pool(threads: Option<usize>) -> StagecraftResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(StagecraftError::validation(
            "compose threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| StagecraftError::validation(format!("failed to build rayon thread pool: {e}")))
}
