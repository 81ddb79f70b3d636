//! Rack-unit to world-space conversion shared by the 3D scene, the particle
//! simulator and the annotation overlay.
//!
//! World basis: +Y up, the rack floor sits at `y = 0`, the rack is centered on
//! the origin in X/Z and its front face looks down +Z.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::{AnnotationSide, EquipmentItem, MountSide};

pub const DEFAULT_UNIT_HEIGHT: f32 = 0.1;
pub const DEFAULT_RACK_WIDTH: f32 = 1.2;
pub const DEFAULT_RACK_DEPTH: f32 = 2.0;
pub const DEFAULT_SIDE_GAP: f32 = 0.05;

/// Fixed rack dimensions in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RackGeometry {
    pub unit_height: f32,
    pub width: f32,
    pub depth: f32,
    /// Distance between a rack face and anything anchored to that face.
    pub side_gap: f32,
}

impl Default for RackGeometry {
    fn default() -> Self {
        Self {
            unit_height: DEFAULT_UNIT_HEIGHT,
            width: DEFAULT_RACK_WIDTH,
            depth: DEFAULT_RACK_DEPTH,
            side_gap: DEFAULT_SIDE_GAP,
        }
    }
}

impl RackGeometry {
    pub fn rack_height(&self, size_u: u32) -> f32 {
        size_u as f32 * self.unit_height
    }

    /// Vertical center of the rack volume; camera look-at for preset views.
    pub fn rack_center(&self, size_u: u32) -> Vec3 {
        Vec3::new(0.0, self.rack_height(size_u) * 0.5, 0.0)
    }

    pub fn front_z(&self) -> f32 {
        self.depth * 0.5
    }

    pub fn rear_z(&self) -> f32 {
        -self.depth * 0.5
    }

    /// Middle of a single U slot.
    pub fn slot_center_y(&self, u: u32) -> f32 {
        u_to_y(u as i32, self.unit_height) + self.unit_height * 0.5
    }

    pub fn side_offset(&self, side: AnnotationSide) -> Vec3 {
        side_offset(side, self)
    }

    /// Bounding box of an equipment block. Front-mounted gear fills the front
    /// half of the depth, rear-mounted gear the back half.
    pub fn equipment_bounds(&self, equipment: &EquipmentItem) -> Aabb {
        let height = equipment_height(equipment, self.unit_height);
        let center_y = equipment_center_y(equipment, self.unit_height);
        let half_width = self.width * 0.5 * BLOCK_WIDTH_FILL;
        let half_depth = self.depth * 0.25 * BLOCK_DEPTH_FILL;
        let center_z = match equipment.mount_side {
            MountSide::Front => self.depth * 0.25,
            MountSide::Rear => -self.depth * 0.25,
        };
        let center = Vec3::new(0.0, center_y, center_z);
        let half = Vec3::new(half_width, height * 0.5, half_depth);
        Aabb {
            min: center - half,
            max: center + half,
        }
    }
}

const BLOCK_WIDTH_FILL: f32 = 0.92;
const BLOCK_DEPTH_FILL: f32 = 0.96;

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Bottom edge of a U slot: `(u - 1) * unit_height`.
pub fn u_to_y(u: i32, unit_height: f32) -> f32 {
    (i64::from(u) - 1) as f32 * unit_height
}

/// Orders a possibly inverted `(start, end)` pair.
pub fn normalized_range(start: i32, end: i32) -> (i32, i32) {
    (start.min(end), start.max(end))
}

pub fn equipment_height(equipment: &EquipmentItem, unit_height: f32) -> f32 {
    let (low, high) = normalized_range(equipment.position_u_start, equipment.position_u_end);
    (i64::from(high) - i64::from(low) + 1) as f32 * unit_height
}

pub fn equipment_center_y(equipment: &EquipmentItem, unit_height: f32) -> f32 {
    let (low, _) = normalized_range(equipment.position_u_start, equipment.position_u_end);
    u_to_y(low, unit_height) + equipment_height(equipment, unit_height) * 0.5
}

/// Lateral/depth offset for anything attached to a rack face.
pub fn side_offset(side: AnnotationSide, geometry: &RackGeometry) -> Vec3 {
    let lateral = geometry.width * 0.5 + geometry.side_gap;
    let depth = geometry.depth * 0.5 + geometry.side_gap;
    match side {
        AnnotationSide::Front => Vec3::new(0.0, 0.0, depth),
        AnnotationSide::Rear => Vec3::new(0.0, 0.0, -depth),
        AnnotationSide::Left => Vec3::new(-lateral, 0.0, 0.0),
        AnnotationSide::Right => Vec3::new(lateral, 0.0, 0.0),
    }
}

/// World anchor for something pinned to `u` on the given face.
pub fn face_anchor(u: u32, side: AnnotationSide, geometry: &RackGeometry) -> Vec3 {
    let offset = side_offset(side, geometry);
    Vec3::new(offset.x, geometry.slot_center_y(u), offset.z)
}
