use crate::{
    core::{FrameIndex, Vec3},
    host::CameraId,
    pose::PoseTrack,
};

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
/// Camera placement tuning.
pub struct CameraConfig {
    /// Chase follow distance as a multiple of character height.
    pub follow_distance_factor: f64,
    /// Chase camera height above the character's head.
    pub chase_height_margin: f64,
    /// Establishing ring height above the tallest character.
    pub ring_height_margin: f64,
    /// Extra ring radius beyond the cast's travel bounds.
    pub ring_radius_margin: f64,
    /// Number of establishing cameras on the ring.
    pub ring_count: usize,
    /// Exponential smoothing factor applied to chase placement every frame.
    pub smoothing: f64,
    /// Lens field of view in degrees, applied to every created camera.
    pub lens_angle_deg: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_distance_factor: 2.5,
            chase_height_margin: 0.5,
            ring_height_margin: 1.0,
            ring_radius_margin: 4.0,
            ring_count: 4,
            smoothing: 0.2,
            lens_angle_deg: 70.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Everything the host needs to create a camera.
pub struct CameraSpec {
    /// Host-facing camera name.
    pub name: String,
    /// Initial world position.
    pub position: Vec3,
    /// Initial unit aim direction.
    pub aim: Vec3,
    /// Lens field of view in degrees.
    pub lens_angle_deg: f64,
}

#[derive(Clone, Debug)]
/// A camera that continuously follows one character.
///
/// Smoothing state advances every frame whether or not the camera is live,
/// so cutting back to it never pops.
pub struct ChaseCamera {
    /// Host camera handle.
    pub camera: CameraId,
    /// Character this camera follows.
    pub character: String,
    height: f64,
    smoothed: Vec3,
    last_direction: Vec3,
    last_root: Option<Vec3>,
}

impl ChaseCamera {
    /// Create a chase camera for a character standing at `root`.
    pub fn new(camera: CameraId, character: &str, height: f64, root: Vec3, config: &CameraConfig) -> Self {
        let mut cam = Self {
            camera,
            character: character.to_owned(),
            height,
            smoothed: Vec3::ZERO,
            last_direction: Vec3::FORWARD,
            last_root: None,
        };
        // Start exactly on target so the first live frame has no settle-in.
        cam.smoothed = cam.target(root, Vec3::FORWARD, config);
        cam
    }

    fn target(&self, root: Vec3, direction: Vec3, config: &CameraConfig) -> Vec3 {
        let mut target = root + direction * (self.height * config.follow_distance_factor);
        target.z = self.height + config.chase_height_margin;
        target
    }

    /// Advance smoothing toward the current root. Called once per frame.
    pub fn update(&mut self, root: Vec3, config: &CameraConfig) {
        let direction = self
            .last_root
            .and_then(|prev| (root - prev).flat().normalized())
            .unwrap_or(self.last_direction);
        self.last_direction = direction;
        self.last_root = Some(root);
        let target = self.target(root, direction, config);
        self.smoothed = Vec3::lerp(self.smoothed, target, config.smoothing);
    }

    /// Current smoothed placement.
    pub fn position(&self) -> Vec3 {
        self.smoothed
    }

    /// Unit aim from the smoothed placement toward the character's root.
    pub fn aim_at(&self, root: Vec3) -> Vec3 {
        (root - self.smoothed)
            .normalized()
            .unwrap_or(self.last_direction)
    }
}

#[derive(Clone, Debug)]
/// A fixed camera covering the whole scene.
pub struct EstablishingCamera {
    /// Host camera handle.
    pub camera: CameraId,
    /// Fixed world position.
    pub position: Vec3,
    /// Current unit aim direction; re-aimed while live.
    pub aim: Vec3,
}

/// The full camera complement for a scene: one chase camera per character
/// plus the establishing ring.
#[derive(Clone, Debug, Default)]
pub struct CameraRig {
    /// Chase cameras, one per character with a resolvable root joint.
    pub chase: Vec<ChaseCamera>,
    /// Fixed establishing ring.
    pub establishing: Vec<EstablishingCamera>,
}

impl CameraRig {
    /// Index of the chase camera following `character`.
    pub fn chase_for(&self, character: &str) -> Option<usize> {
        self.chase.iter().position(|c| c.character == character)
    }

    /// Advance every chase camera's smoothing for `frame`.
    pub fn update_chase(&mut self, tracks: &[PoseTrack], frame: FrameIndex, config: &CameraConfig) {
        for cam in &mut self.chase {
            if let Some(track) = tracks.iter().find(|t| t.character == cam.character) {
                cam.update(track.position_at(frame), config);
            }
        }
    }

    /// Index of the establishing camera nearest to `point`.
    pub fn nearest_establishing(&self, point: Vec3) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, cam) in self.establishing.iter().enumerate() {
            let d = cam.position.distance(point);
            if best.is_none_or(|(_, b)| d < b) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Evenly spaced positions on a horizontal ring.
pub fn ring_positions(center: Vec3, radius: f64, height: f64, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count.max(1) as f64;
            Vec3::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                height,
            )
        })
        .collect()
}

/// Center and radius of the cast's travel over the whole scene, from every
/// pose sample.
pub fn scene_bounds(tracks: &[PoseTrack]) -> (Vec3, f64) {
    let positions: Vec<Vec3> = tracks
        .iter()
        .flat_map(|t| t.samples.iter().map(|s| s.position.flat()))
        .collect();
    if positions.is_empty() {
        return (Vec3::ZERO, 0.0);
    }
    let sum = positions.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
    let center = sum / positions.len() as f64;
    let radius = positions
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0f64, f64::max);
    (center, radius)
}

/// Average root position of the whole cast at `frame`.
pub fn average_root(tracks: &[PoseTrack], frame: FrameIndex) -> Vec3 {
    if tracks.is_empty() {
        return Vec3::ZERO;
    }
    let sum = tracks
        .iter()
        .fold(Vec3::ZERO, |acc, t| acc + t.position_at(frame));
    sum / tracks.len() as f64
}
