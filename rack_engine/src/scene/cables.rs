use glam::Vec3;
use rack_model::materials::cable_color;
use rack_model::{Aabb, CableType, ConnectionEdge, RackGeometry, Rgb};

pub const CABLE_SAMPLES: usize = 16;
/// How far behind the rear face the curve's control point sits.
const CABLE_SLACK: f32 = 0.35;
/// Cables leave the equipment on the right-hand side of its rear face.
const EXIT_LATERAL: f32 = 0.3;

/// Quadratic Bézier cable between two equipment blocks, pre-sampled into a
/// polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct CableCurve {
    pub id: String,
    pub cable_type: CableType,
    pub equipment_a_id: String,
    pub equipment_b_id: String,
    pub color: Rgb,
    pub control_points: [Vec3; 3],
    pub points: Vec<Vec3>,
}

pub fn quadratic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

fn rear_exit(bounds: &Aabb, geometry: &RackGeometry) -> Vec3 {
    Vec3::new(
        geometry.width * EXIT_LATERAL,
        bounds.center().y,
        geometry.rear_z(),
    )
}

pub fn route_cable(
    edge: &ConnectionEdge,
    a: &Aabb,
    b: &Aabb,
    geometry: &RackGeometry,
) -> CableCurve {
    let start = rear_exit(a, geometry);
    let end = rear_exit(b, geometry);
    // Longer vertical runs hang further back.
    let sag = CABLE_SLACK + (start.y - end.y).abs() * 0.25;
    let control = Vec3::new(
        (start.x + end.x) * 0.5 + geometry.width * 0.1,
        (start.y + end.y) * 0.5,
        geometry.rear_z() - sag,
    );
    let points = (0..CABLE_SAMPLES)
        .map(|i| {
            let t = i as f32 / (CABLE_SAMPLES - 1) as f32;
            quadratic_bezier(start, control, end, t)
        })
        .collect();

    CableCurve {
        id: edge.id.clone(),
        cable_type: edge.cable_type,
        equipment_a_id: edge.equipment_a_id.clone(),
        equipment_b_id: edge.equipment_b_id.clone(),
        color: cable_color(edge.cable_type),
        control_points: [start, control, end],
        points,
    }
}

/// Routes every edge whose endpoints both have a block; `bounds_of` looks a
/// block up by equipment id.
pub fn route_cables<'a, F>(
    edges: &[ConnectionEdge],
    geometry: &RackGeometry,
    bounds_of: F,
) -> Vec<CableCurve>
where
    F: Fn(&str) -> Option<&'a Aabb>,
{
    edges
        .iter()
        .filter_map(|edge| {
            let a = bounds_of(&edge.equipment_a_id)?;
            let b = bounds_of(&edge.equipment_b_id)?;
            Some(route_cable(edge, a, b, geometry))
        })
        .collect()
}
