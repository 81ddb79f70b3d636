//! Camera state machine. A single owned controller decides where the camera
//! is heading; the host either lets it interpolate (`update`) or, while idle,
//! drives the pose itself through orbit/pan input.
//!
//! Priority: tour follow overrides presets and resets for as long as the tour
//! is active. Commands that arrive during a tour are dropped, not deferred.

use std::{fmt, str::FromStr};

use glam::{Mat4, Vec3, Vec4};
use rack_model::RackGeometry;
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;

const REFERENCE_FPS: f32 = 60.0;
const NEAR_PLANE: f32 = 0.05;
const FAR_PLANE: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPreset {
    Front,
    Rear,
    Left,
    Right,
    Top,
    Iso,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 6] = [
        ViewPreset::Front,
        ViewPreset::Rear,
        ViewPreset::Left,
        ViewPreset::Right,
        ViewPreset::Top,
        ViewPreset::Iso,
    ];

    /// Unit vector from the rack center toward the camera.
    pub fn direction(self) -> Vec3 {
        match self {
            ViewPreset::Front => Vec3::Z,
            ViewPreset::Rear => Vec3::NEG_Z,
            ViewPreset::Left => Vec3::NEG_X,
            ViewPreset::Right => Vec3::X,
            // A straight-down view would make the look-at basis degenerate.
            ViewPreset::Top => Vec3::new(0.0, 1.0, 0.001).normalize(),
            ViewPreset::Iso => Vec3::new(1.0, 0.8, 1.0).normalize(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewPreset::Front => "front",
            ViewPreset::Rear => "rear",
            ViewPreset::Left => "left",
            ViewPreset::Right => "right",
            ViewPreset::Top => "top",
            ViewPreset::Iso => "iso",
        }
    }
}

impl fmt::Display for ViewPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewPreset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let name = if normalized == "isometric" {
            "iso"
        } else {
            normalized.as_str()
        };
        ViewPreset::ALL
            .into_iter()
            .find(|preset| preset.label() == name)
            .ok_or_else(|| {
                format!(
                    "unknown camera preset '{value}' (expected front, rear, left, right, top or iso)"
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub fn view_direction(&self) -> Vec3 {
        (self.look_at - self.position).normalize_or_zero()
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.look_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum CameraMode {
    /// Host input owns the camera; the controller writes nothing.
    Idle,
    PresetTransition(ViewPreset),
    Reset,
    ZoomTransition,
    /// Following the tour's focused equipment index.
    TourFollow(usize),
}

impl CameraMode {
    fn is_one_shot(self) -> bool {
        matches!(
            self,
            CameraMode::PresetTransition(_) | CameraMode::Reset | CameraMode::ZoomTransition
        )
    }
}

#[derive(Debug, Clone)]
pub struct CameraController {
    mode: CameraMode,
    pose: CameraPose,
    target: CameraPose,
    mount_pose: CameraPose,
    rack_center: Vec3,
    front_z: f32,
    zoom: f32,
    base_distance: f32,
    lerp_rate: f32,
    arrive_epsilon: f32,
    max_frame_dt: f32,
    tour_y_offset: f32,
    tour_distance: f32,
}

impl CameraController {
    pub fn new(config: &CameraConfig, geometry: &RackGeometry, size_u: u32) -> Self {
        let rack_center = geometry.rack_center(size_u);
        let mount_pose = CameraPose {
            position: rack_center + Vec3::from_array(config.mount_offset),
            look_at: rack_center,
        };
        Self {
            mode: CameraMode::Idle,
            pose: mount_pose,
            target: mount_pose,
            mount_pose,
            rack_center,
            front_z: geometry.front_z(),
            zoom: 1.0,
            base_distance: config.base_distance,
            lerp_rate: config.lerp_rate,
            arrive_epsilon: config.arrive_epsilon,
            max_frame_dt: config.max_frame_dt,
            tour_y_offset: config.tour_y_offset,
            tour_distance: config.tour_distance,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn target(&self) -> CameraPose {
        self.target
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn is_touring(&self) -> bool {
        matches!(self.mode, CameraMode::TourFollow(_))
    }

    pub fn preset_pose(&self, preset: ViewPreset) -> CameraPose {
        let distance = self.base_distance / self.zoom;
        CameraPose {
            position: self.rack_center + preset.direction() * distance,
            look_at: self.rack_center,
        }
    }

    /// Returns false when a tour holds the camera.
    pub fn apply_preset(&mut self, preset: ViewPreset) -> bool {
        if self.is_touring() {
            log::debug!("camera preset {preset} ignored while touring");
            return false;
        }
        self.target = self.preset_pose(preset);
        self.mode = CameraMode::PresetTransition(preset);
        true
    }

    pub fn apply_reset(&mut self) -> bool {
        if self.is_touring() {
            log::debug!("camera reset ignored while touring");
            return false;
        }
        self.target = self.mount_pose;
        self.mode = CameraMode::Reset;
        true
    }

    /// Stores the new zoom and, outside a tour, pulls the camera along its
    /// current view direction to the matching distance.
    /// Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if !zoom.is_finite() {
            log::debug!("ignoring non-finite zoom {zoom}");
            return;
        }
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - self.zoom).abs() <= f32::EPSILON {
            return;
        }
        self.zoom = zoom;
        match self.mode {
            CameraMode::TourFollow(_) => {}
            CameraMode::PresetTransition(preset) => {
                self.target = self.preset_pose(preset);
            }
            _ => {
                let reference = if self.mode.is_one_shot() {
                    self.target
                } else {
                    self.pose
                };
                let mut direction = -reference.view_direction();
                if direction == Vec3::ZERO {
                    direction = ViewPreset::Front.direction();
                }
                self.target = CameraPose {
                    position: reference.look_at + direction * (self.base_distance / zoom),
                    look_at: reference.look_at,
                };
                self.mode = CameraMode::ZoomTransition;
            }
        }
    }

    /// Points the camera at the equipment whose vertical center is
    /// `focus_y`. Called whenever the tour index changes.
    pub fn follow(&mut self, index: usize, focus_y: f32) {
        self.target = CameraPose {
            position: Vec3::new(
                self.rack_center.x,
                focus_y + self.tour_y_offset,
                self.front_z + self.tour_distance,
            ),
            look_at: Vec3::new(self.rack_center.x, focus_y, self.rack_center.z),
        };
        self.mode = CameraMode::TourFollow(index);
    }

    /// Leaves tour mode; the camera stays wherever the tour left it.
    pub fn end_tour(&mut self) {
        if self.is_touring() {
            self.target = self.pose;
            self.mode = CameraMode::Idle;
        }
    }

    /// Accepts an orbit/pan pose from the host. Refused during a tour; any
    /// other in-flight transition is cancelled.
    pub fn apply_user_pose(&mut self, pose: CameraPose) -> bool {
        if self.is_touring() {
            return false;
        }
        self.pose = pose;
        self.target = pose;
        self.mode = CameraMode::Idle;
        true
    }

    /// Moves the camera toward its target. Returns the remaining distance.
    pub fn update(&mut self, dt: f32) -> f32 {
        if self.mode == CameraMode::Idle {
            return 0.0;
        }

        let dt = dt.clamp(0.0, self.max_frame_dt);
        let factor = 1.0 - (1.0 - self.lerp_rate).powf(dt * REFERENCE_FPS);
        self.pose.position = self.pose.position.lerp(self.target.position, factor);
        self.pose.look_at = self.pose.look_at.lerp(self.target.look_at, factor);

        let remaining = self
            .pose
            .position
            .distance(self.target.position)
            .max(self.pose.look_at.distance(self.target.look_at));
        if self.mode.is_one_shot() && remaining < self.arrive_epsilon {
            self.pose = self.target;
            self.mode = CameraMode::Idle;
            return 0.0;
        }
        remaining
    }

    pub fn projector(&self, fov_y_degrees: f32, aspect_ratio: f32) -> Option<CameraProjector> {
        CameraProjector::new(self.pose, fov_y_degrees, aspect_ratio)
    }
}

/// World → normalized device coordinates for label placement.
#[derive(Debug, Clone, Copy)]
pub struct CameraProjector {
    view_projection: Mat4,
}

impl CameraProjector {
    pub fn new(pose: CameraPose, fov_y_degrees: f32, aspect_ratio: f32) -> Option<Self> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return None;
        }
        if pose.position.distance_squared(pose.look_at) <= f32::EPSILON {
            return None;
        }
        let view = Mat4::look_at_rh(pose.position, pose.look_at, Vec3::Y);
        let projection =
            Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect_ratio, NEAR_PLANE, FAR_PLANE);
        Some(Self {
            view_projection: projection * view,
        })
    }

    pub fn project(&self, position: Vec3) -> Option<[f32; 2]> {
        let clip = self.view_projection * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.x.is_finite() || !ndc.y.is_finite() {
            return None;
        }
        Some([ndc.x, ndc.y])
    }

    /// NDC → pixel coordinates with the origin in the top-left corner.
    pub fn to_screen(ndc: [f32; 2], width: f32, height: f32) -> [f32; 2] {
        [(ndc[0] + 1.0) * 0.5 * width, (1.0 - ndc[1]) * 0.5 * height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> CameraController {
        CameraController::new(&CameraConfig::default(), &RackGeometry::default(), 42)
    }

    #[test]
    fn presets_converge_monotonically() {
        for preset in ViewPreset::ALL {
            let mut camera = controller();
            assert!(camera.apply_preset(preset));
            let target = camera.target().position;
            let mut previous = camera.pose().position.distance(target);
            let mut ticks = 0;
            while camera.mode() != CameraMode::Idle {
                camera.update(1.0 / 60.0);
                let distance = camera.pose().position.distance(target);
                assert!(
                    distance <= previous + 1e-6,
                    "{preset}: distance grew from {previous} to {distance}"
                );
                previous = distance;
                ticks += 1;
                assert!(ticks < 600, "{preset} did not converge");
            }
            assert_eq!(camera.pose().position, target);
        }
    }

    #[test]
    fn preset_distance_scales_with_inverse_zoom() {
        let mut camera = controller();
        let near = camera.preset_pose(ViewPreset::Front);
        camera.set_zoom(2.0);
        let far = camera.preset_pose(ViewPreset::Front);
        assert!((near.distance() - 7.0).abs() < 1e-4);
        assert!((far.distance() - 3.5).abs() < 1e-4);
    }

    #[test]
    fn zoom_keeps_view_direction() {
        let mut camera = controller();
        let before = camera.pose().view_direction();
        camera.set_zoom(3.0);
        assert_eq!(camera.mode(), CameraMode::ZoomTransition);
        let after = camera.target().view_direction();
        assert!(before.distance(after) < 1e-5);
        assert!((camera.target().distance() - 7.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = controller();
        camera.set_zoom(10.0);
        assert_eq!(camera.zoom(), MAX_ZOOM);
        camera.set_zoom(0.01);
        assert_eq!(camera.zoom(), MIN_ZOOM);
    }

    #[test]
    fn non_finite_zoom_keeps_previous_target() {
        let mut camera = controller();
        camera.set_zoom(2.0);
        let target = camera.target();
        camera.set_zoom(f32::NAN);
        camera.set_zoom(f32::INFINITY);
        assert_eq!(camera.zoom(), 2.0);
        assert_eq!(camera.target(), target);
        camera.update(1.0 / 60.0);
        assert!(camera.pose().position.is_finite());
    }

    #[test]
    fn reset_returns_to_mount_pose() {
        let mut camera = controller();
        let mount = camera.pose();
        camera.apply_preset(ViewPreset::Top);
        for _ in 0..30 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.apply_reset());
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(camera.pose(), mount);
    }

    #[test]
    fn tour_blocks_presets_and_user_input() {
        let mut camera = controller();
        camera.follow(0, 1.0);
        assert!(!camera.apply_preset(ViewPreset::Left));
        assert!(!camera.apply_reset());
        let pose = camera.pose();
        assert!(!camera.apply_user_pose(CameraPose {
            position: Vec3::splat(9.0),
            look_at: Vec3::ZERO,
        }));
        assert_eq!(camera.mode(), CameraMode::TourFollow(0));

        // Tour follow keeps interpolating and never drops back to idle by itself.
        for _ in 0..2_000 {
            camera.update(1.0 / 60.0);
        }
        assert_eq!(camera.mode(), CameraMode::TourFollow(0));
        assert_ne!(camera.pose(), pose);
        assert!((camera.pose().look_at.y - 1.0).abs() < 1e-3);

        camera.end_tour();
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert!(camera.apply_preset(ViewPreset::Left));
    }

    #[test]
    fn idle_camera_is_left_alone() {
        let mut camera = controller();
        let pose = CameraPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
        };
        assert!(camera.apply_user_pose(pose));
        assert_eq!(camera.update(1.0), 0.0);
        assert_eq!(camera.pose(), pose);
    }

    #[test]
    fn user_input_cancels_transition() {
        let mut camera = controller();
        camera.apply_preset(ViewPreset::Rear);
        camera.update(1.0 / 60.0);
        let pose = camera.pose();
        assert!(camera.apply_user_pose(pose));
        assert_eq!(camera.mode(), CameraMode::Idle);
    }

    #[test]
    fn projector_maps_look_at_to_center() {
        let camera = controller();
        let projector = camera.projector(50.0, 16.0 / 9.0).expect("projector");
        let ndc = projector.project(camera.pose().look_at).expect("visible");
        assert!(ndc[0].abs() < 1e-4 && ndc[1].abs() < 1e-4);
        let behind = camera.pose().position * 2.0 - camera.pose().look_at;
        assert!(projector.project(behind).is_none());
        assert_eq!(CameraProjector::to_screen([0.0, 0.0], 800.0, 600.0), [400.0, 300.0]);
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("ISO".parse::<ViewPreset>(), Ok(ViewPreset::Iso));
        assert_eq!("isometric".parse::<ViewPreset>(), Ok(ViewPreset::Iso));
        assert_eq!(" rear ".parse::<ViewPreset>(), Ok(ViewPreset::Rear));
        assert!("diagonal".parse::<ViewPreset>().is_err());
    }
}
