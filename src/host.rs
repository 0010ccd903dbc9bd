use crate::{
    camera::CameraSpec,
    core::{FrameIndex, Vec3},
    director::CameraCut,
    error::StagecraftResult,
    rig::{JointAliases, JointMap},
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// Host handle for a loaded character rig.
pub struct RigId(pub u64);

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// Host handle for a created camera.
pub struct CameraId(pub u64);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A loaded rig: its host handle plus joint roles resolved once at load.
pub struct RigHandle {
    /// Host handle.
    pub id: RigId,
    /// Joint roles resolved against the rig's bone names.
    pub joints: JointMap,
}

/// Operations the compositor invokes on the rendering/playback
/// environment. The compositor never inspects host state beyond what these
/// calls return, and never calls them before the whole scene has been
/// validated and every track built; a failure part-way is a hard abort,
/// so everything fallible is front-loaded.
pub trait AnimationHost {
    /// Load a character rig asset; joint roles are resolved at this point.
    fn load_rig(&mut self, asset: &str) -> StagecraftResult<RigHandle>;

    /// Write one placement keyframe for a rig.
    fn set_pose_keyframe(
        &mut self,
        rig: RigId,
        frame: FrameIndex,
        position: Vec3,
        facing: Vec3,
    ) -> StagecraftResult<()>;

    /// Create a camera.
    fn create_camera(&mut self, spec: &CameraSpec) -> StagecraftResult<CameraId>;

    /// Record a camera-switch marker on the master timeline.
    fn mark_active_camera(&mut self, cut: &CameraCut) -> StagecraftResult<()>;

    /// Place an audio clip at an absolute frame.
    fn place_audio_clip(&mut self, frame: FrameIndex, clip: &str) -> StagecraftResult<()>;

    /// Set the scene's final frame.
    fn set_scene_end(&mut self, frame: FrameIndex) -> StagecraftResult<()>;
}

#[derive(Clone, Debug, serde::Serialize)]
/// A rig load recorded by [`MemoryHost`].
pub struct RecordedRig {
    /// Assigned handle.
    pub id: RigId,
    /// Asset reference that was loaded.
    pub asset: String,
}

#[derive(Clone, Debug, serde::Serialize)]
/// A pose keyframe recorded by [`MemoryHost`].
pub struct RecordedKeyframe {
    /// Rig the keyframe belongs to.
    pub rig: RigId,
    /// Absolute frame.
    pub frame: FrameIndex,
    /// Root position.
    pub position: Vec3,
    /// Unit facing direction.
    pub facing: Vec3,
}

#[derive(Clone, Debug, serde::Serialize)]
/// A camera recorded by [`MemoryHost`].
pub struct RecordedCamera {
    /// Assigned handle.
    pub id: CameraId,
    /// Creation spec.
    pub spec: CameraSpec,
}

#[derive(Clone, Debug, serde::Serialize)]
/// An audio placement recorded by [`MemoryHost`].
pub struct RecordedAudio {
    /// Absolute frame.
    pub frame: FrameIndex,
    /// Clip reference.
    pub clip: String,
}

#[derive(Debug, serde::Serialize)]
/// An [`AnimationHost`] that records every call instead of driving a real
/// playback environment. Backs the CLI's JSON output and the tests.
pub struct MemoryHost {
    /// Rigs loaded, in call order.
    pub rigs: Vec<RecordedRig>,
    /// Pose keyframes, in call order.
    pub keyframes: Vec<RecordedKeyframe>,
    /// Cameras created, in call order.
    pub cameras: Vec<RecordedCamera>,
    /// Camera-switch markers, in call order.
    pub cuts: Vec<CameraCut>,
    /// Audio placements, in call order.
    pub audio: Vec<RecordedAudio>,
    /// Final frame, once set.
    pub scene_end: Option<FrameIndex>,
    #[serde(skip)]
    bone_names: Vec<String>,
    #[serde(skip)]
    aliases: JointAliases,
    #[serde(skip)]
    next_id: u64,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Host whose rigs expose the common mixamo bone names.
    pub fn new() -> Self {
        Self::with_bone_names(vec![
            "mixamorig:Hips".into(),
            "mixamorig:Spine".into(),
            "mixamorig:Head".into(),
            "mixamorig:HeadTop_End".into(),
            "mixamorig:LeftFoot".into(),
            "mixamorig:RightFoot".into(),
        ])
    }

    /// Host whose rigs expose exactly `bone_names`. Useful for exercising
    /// rigs with unresolvable joints.
    pub fn with_bone_names(bone_names: Vec<String>) -> Self {
        Self {
            rigs: Vec::new(),
            keyframes: Vec::new(),
            cameras: Vec::new(),
            cuts: Vec::new(),
            audio: Vec::new(),
            scene_end: None,
            bone_names,
            aliases: JointAliases::default(),
            next_id: 1,
        }
    }

    /// Total number of recorded host calls.
    pub fn call_count(&self) -> usize {
        self.rigs.len()
            + self.keyframes.len()
            + self.cameras.len()
            + self.cuts.len()
            + self.audio.len()
            + usize::from(self.scene_end.is_some())
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl AnimationHost for MemoryHost {
    fn load_rig(&mut self, asset: &str) -> StagecraftResult<RigHandle> {
        let id = RigId(self.next());
        self.rigs.push(RecordedRig {
            id,
            asset: asset.to_owned(),
        });
        Ok(RigHandle {
            id,
            joints: self.aliases.resolve(&self.bone_names),
        })
    }

    fn set_pose_keyframe(
        &mut self,
        rig: RigId,
        frame: FrameIndex,
        position: Vec3,
        facing: Vec3,
    ) -> StagecraftResult<()> {
        self.keyframes.push(RecordedKeyframe {
            rig,
            frame,
            position,
            facing,
        });
        Ok(())
    }

    fn create_camera(&mut self, spec: &CameraSpec) -> StagecraftResult<CameraId> {
        let id = CameraId(self.next());
        self.cameras.push(RecordedCamera {
            id,
            spec: spec.clone(),
        });
        Ok(id)
    }

    fn mark_active_camera(&mut self, cut: &CameraCut) -> StagecraftResult<()> {
        self.cuts.push(*cut);
        Ok(())
    }

    fn place_audio_clip(&mut self, frame: FrameIndex, clip: &str) -> StagecraftResult<()> {
        self.audio.push(RecordedAudio {
            frame,
            clip: clip.to_owned(),
        });
        Ok(())
    }

    fn set_scene_end(&mut self, frame: FrameIndex) -> StagecraftResult<()> {
        self.scene_end = Some(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::JointRole;

    #[test]
    fn rig_handles_resolve_joints_at_load() {
        let mut host = MemoryHost::new();
        let rig = host.load_rig("characters/remy").unwrap();
        assert_eq!(rig.joints.named_joint(JointRole::Root), Some("mixamorig:Hips"));
        assert_eq!(host.rigs.len(), 1);
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut host = MemoryHost::new();
        let rig = host.load_rig("a").unwrap();
        let cam = host
            .create_camera(&CameraSpec {
                name: "cam".into(),
                position: Vec3::ZERO,
                aim: Vec3::FORWARD,
                lens_angle_deg: 70.0,
            })
            .unwrap();
        assert_ne!(rig.id.0, cam.0);
    }
}
