//! Ray picking against equipment boxes and annotation markers. The host
//! builds the ray from its pointer position; the scene decides what was hit.

use glam::Vec3;
use rack_model::Aabb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Ray from `origin` through `point`.
    pub fn through(origin: Vec3, point: Vec3) -> Option<Self> {
        Self::new(origin, point - origin)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Slab test. Returns the entry distance, or 0 when the origin is inside.
pub fn ray_aabb(ray: &Ray, bounds: &Aabb) -> Option<f32> {
    let inverse = ray.direction.recip();
    let t0 = (bounds.min - ray.origin) * inverse;
    let t1 = (bounds.max - ray.origin) * inverse;
    let near = t0.min(t1).max_element();
    let far = t0.max(t1).min_element();
    if near.is_nan() || far.is_nan() || far < near.max(0.0) {
        return None;
    }
    Some(near.max(0.0))
}

pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let offset = ray.origin - center;
    let b = offset.dot(ray.direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    if far < 0.0 {
        return None;
    }
    Some(near.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        }
    }

    #[test]
    fn ray_hits_box_front_face() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).expect("ray");
        let t = ray_aabb(&ray, &unit_box()).expect("hit");
        assert!((t - 4.0).abs() < 1e-5);
        assert!((ray.at(t).z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn axis_aligned_miss_is_rejected() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z).expect("ray");
        assert!(ray_aabb(&ray, &unit_box()).is_none());
        let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).expect("ray");
        assert!(ray_aabb(&away, &unit_box()).is_none());
    }

    #[test]
    fn origin_inside_box_hits_at_zero() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X).expect("ray");
        assert_eq!(ray_aabb(&ray, &unit_box()), Some(0.0));
    }

    #[test]
    fn sphere_hit_and_miss() {
        let ray = Ray::through(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO).expect("ray");
        let t = ray_sphere(&ray, Vec3::ZERO, 1.0).expect("hit");
        assert!((t - 9.0).abs() < 1e-5);
        assert!(ray_sphere(&ray, Vec3::new(5.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn zero_direction_is_not_a_ray() {
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_none());
    }
}
