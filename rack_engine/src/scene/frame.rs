//! Static parts of the scene: the rack's skeleton with its U labels, the
//! floor it stands on and the lights.

use glam::Vec3;
use rack_model::{Aabb, RackGeometry, Rgb};

use super::blocks::{SOLID_OPACITY, XRAY_OPACITY};

const POST_SIZE: f32 = 0.04;
const PANEL_THICKNESS: f32 = 0.02;
const LABEL_INSET: f32 = 0.06;
const FLOOR_MARGIN: f32 = 3.0;

pub const FRAME_COLOR: Rgb = Rgb::new(0.16, 0.17, 0.2);
pub const FLOOR_COLOR: Rgb = Rgb::new(0.3, 0.32, 0.35);

#[derive(Debug, Clone, PartialEq)]
pub struct ULabel {
    pub u: u32,
    pub text: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RackFrame {
    pub posts: [Aabb; 4],
    pub top: Aabb,
    pub bottom: Aabb,
    pub color: Rgb,
    pub opacity: f32,
    pub u_labels: Vec<ULabel>,
}

impl RackFrame {
    pub fn build(geometry: &RackGeometry, size_u: u32) -> Self {
        let height = geometry.rack_height(size_u);
        let half_x = geometry.width * 0.5;
        let front = geometry.front_z();
        let rear = geometry.rear_z();

        let post = |x: f32, z: f32| Aabb {
            min: Vec3::new(x - POST_SIZE * 0.5, 0.0, z - POST_SIZE * 0.5),
            max: Vec3::new(x + POST_SIZE * 0.5, height, z + POST_SIZE * 0.5),
        };
        let panel = |y: f32| Aabb {
            min: Vec3::new(-half_x, y - PANEL_THICKNESS * 0.5, rear),
            max: Vec3::new(half_x, y + PANEL_THICKNESS * 0.5, front),
        };

        // Labels sit just inside the front-left post.
        let u_labels = (1..=size_u)
            .map(|u| ULabel {
                u,
                text: format!("U{u}"),
                position: Vec3::new(-half_x + LABEL_INSET, geometry.slot_center_y(u), front),
            })
            .collect();

        Self {
            posts: [
                post(-half_x, front),
                post(half_x, front),
                post(-half_x, rear),
                post(half_x, rear),
            ],
            top: panel(height),
            bottom: panel(0.0),
            color: FRAME_COLOR,
            opacity: SOLID_OPACITY,
            u_labels,
        }
    }

    pub fn set_xray(&mut self, xray: bool) {
        self.opacity = if xray { XRAY_OPACITY } else { SOLID_OPACITY };
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floor {
    pub center: Vec3,
    pub size: [f32; 2],
    pub color: Rgb,
}

impl Floor {
    pub fn under(geometry: &RackGeometry) -> Self {
        Self {
            center: Vec3::ZERO,
            size: [
                geometry.width + FLOOR_MARGIN * 2.0,
                geometry.depth + FLOOR_MARGIN * 2.0,
            ],
            color: FLOOR_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels.
    pub direction: Vec3,
    pub intensity: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingRig {
    pub ambient: f32,
    pub key: DirectionalLight,
    pub fill: DirectionalLight,
}

impl LightingRig {
    pub fn studio(rack_center: Vec3) -> Self {
        let key_from = rack_center + Vec3::new(4.0, 6.0, 5.0);
        let fill_from = rack_center + Vec3::new(-5.0, 3.0, -4.0);
        Self {
            ambient: 0.35,
            key: DirectionalLight {
                direction: (rack_center - key_from).normalize_or_zero(),
                intensity: 1.0,
                color: Rgb::new(1.0, 0.98, 0.95),
            },
            fill: DirectionalLight {
                direction: (rack_center - fill_from).normalize_or_zero(),
                intensity: 0.4,
                color: Rgb::new(0.85, 0.9, 1.0),
            },
        }
    }
}
