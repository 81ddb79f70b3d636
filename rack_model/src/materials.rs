//! Static equipment look-up tables. Every function here is total: unknown
//! types fall back to generic values instead of failing.

use serde::Serialize;

use crate::types::{AnnotationType, CableType, EquipmentStatus, EquipmentType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    /// Parses `#rrggbb` or `rrggbb`. Anything else yields `None`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .ok()
                .map(|byte| byte as f32 / 255.0)
        };
        Some(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let [r0, g0, b0] = self.0;
        let [r1, g1, b1] = other.0;
        Rgb([r0 + (r1 - r0) * t, g0 + (g1 - g0) * t, b0 + (b1 - b0) * t])
    }

    pub fn scale(self, factor: f32) -> Rgb {
        let [r, g, b] = self.0;
        Rgb([r * factor, g * factor, b * factor])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialParams {
    pub metalness: f32,
    pub roughness: f32,
}

pub const DEFAULT_MATERIAL: MaterialParams = MaterialParams {
    metalness: 0.4,
    roughness: 0.6,
};

pub const GENERIC_EQUIPMENT_COLOR: Rgb = Rgb::new(0.42, 0.45, 0.5);

pub fn material_for(equipment_type: EquipmentType) -> MaterialParams {
    match equipment_type {
        EquipmentType::Server => MaterialParams {
            metalness: 0.6,
            roughness: 0.4,
        },
        EquipmentType::Switch | EquipmentType::Router => MaterialParams {
            metalness: 0.5,
            roughness: 0.45,
        },
        EquipmentType::Firewall | EquipmentType::LoadBalancer => MaterialParams {
            metalness: 0.55,
            roughness: 0.35,
        },
        EquipmentType::Storage => MaterialParams {
            metalness: 0.7,
            roughness: 0.3,
        },
        EquipmentType::Pdu | EquipmentType::Ups => MaterialParams {
            metalness: 0.3,
            roughness: 0.7,
        },
        EquipmentType::PatchPanel => MaterialParams {
            metalness: 0.8,
            roughness: 0.25,
        },
        EquipmentType::Kvm | EquipmentType::Unknown => DEFAULT_MATERIAL,
    }
}

pub fn color_for(equipment_type: EquipmentType) -> Rgb {
    match equipment_type {
        EquipmentType::Server => Rgb::new(0.23, 0.51, 0.96),
        EquipmentType::Switch => Rgb::new(0.06, 0.73, 0.51),
        EquipmentType::Router => Rgb::new(0.55, 0.36, 0.96),
        EquipmentType::Firewall => Rgb::new(0.94, 0.27, 0.27),
        EquipmentType::Storage => Rgb::new(0.96, 0.62, 0.04),
        EquipmentType::Pdu => Rgb::new(0.39, 0.45, 0.55),
        EquipmentType::Ups => Rgb::new(0.92, 0.7, 0.03),
        EquipmentType::PatchPanel => Rgb::new(0.58, 0.64, 0.72),
        EquipmentType::Kvm => Rgb::new(0.02, 0.71, 0.83),
        EquipmentType::LoadBalancer => Rgb::new(0.93, 0.28, 0.6),
        EquipmentType::Unknown => GENERIC_EQUIPMENT_COLOR,
    }
}

/// Decorations drawn on the face of an equipment block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualProfile {
    pub fan_count: u32,
    pub port_count: u32,
    pub has_leds: bool,
    /// Relative exhaust heat in `[0, 1]`, used by the thermal tint.
    pub heat_output: f32,
}

pub fn visual_profile(equipment_type: EquipmentType) -> VisualProfile {
    let (fan_count, port_count, has_leds, heat_output) = match equipment_type {
        EquipmentType::Server => (4, 4, true, 0.8),
        EquipmentType::Switch => (2, 24, true, 0.5),
        EquipmentType::Router => (2, 8, true, 0.5),
        EquipmentType::Firewall => (2, 8, true, 0.45),
        EquipmentType::Storage => (3, 2, true, 0.7),
        EquipmentType::LoadBalancer => (2, 8, true, 0.5),
        EquipmentType::Ups => (1, 0, true, 0.6),
        EquipmentType::Pdu => (0, 8, false, 0.1),
        EquipmentType::PatchPanel => (0, 24, false, 0.0),
        EquipmentType::Kvm => (0, 8, true, 0.2),
        EquipmentType::Unknown => (0, 0, false, 0.3),
    };
    VisualProfile {
        fan_count,
        port_count,
        has_leds,
        heat_output,
    }
}

pub fn status_color(status: Option<EquipmentStatus>) -> Rgb {
    match status {
        Some(EquipmentStatus::Active) => Rgb::new(0.13, 0.77, 0.37),
        Some(EquipmentStatus::Maintenance) => Rgb::new(0.96, 0.62, 0.04),
        Some(EquipmentStatus::Offline) => Rgb::new(0.94, 0.27, 0.27),
        Some(EquipmentStatus::Decommissioned) => Rgb::new(0.42, 0.45, 0.5),
        Some(EquipmentStatus::Unknown) | None => Rgb::new(0.58, 0.64, 0.72),
    }
}

pub fn cable_color(cable_type: CableType) -> Rgb {
    match cable_type {
        CableType::Cat5e => Rgb::new(0.23, 0.51, 0.96),
        CableType::Cat6 => Rgb::new(0.06, 0.73, 0.51),
        CableType::Cat6a => Rgb::new(0.02, 0.71, 0.83),
        CableType::Fiber => Rgb::new(0.98, 0.45, 0.09),
        CableType::Dac => Rgb::new(0.39, 0.45, 0.55),
        CableType::Power => Rgb::new(0.1, 0.1, 0.1),
        CableType::Console => Rgb::new(0.55, 0.36, 0.96),
        CableType::Unknown => Rgb::new(0.6, 0.6, 0.6),
    }
}

pub fn annotation_color(annotation_type: AnnotationType) -> Rgb {
    match annotation_type {
        AnnotationType::Info => Rgb::new(0.23, 0.51, 0.96),
        AnnotationType::Note => Rgb::new(0.58, 0.64, 0.72),
        AnnotationType::Attention => Rgb::new(0.92, 0.7, 0.03),
        AnnotationType::Warning => Rgb::new(0.98, 0.45, 0.09),
        AnnotationType::Maintenance => Rgb::new(0.55, 0.36, 0.96),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_uses_default_material_and_generic_color() {
        assert_eq!(material_for(EquipmentType::Unknown), DEFAULT_MATERIAL);
        assert_eq!(DEFAULT_MATERIAL.metalness, 0.4);
        assert_eq!(DEFAULT_MATERIAL.roughness, 0.6);
        assert_eq!(color_for(EquipmentType::Unknown), GENERIC_EQUIPMENT_COLOR);
    }

    #[test]
    fn hex_parsing_accepts_hash_prefix() {
        let color = Rgb::from_hex("#ff8000").expect("valid hex");
        assert_eq!(color.0[0], 1.0);
        assert!((color.0[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.0[2], 0.0);
        assert_eq!(Rgb::from_hex("00ff00"), Some(Rgb::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn hex_parsing_rejects_garbage() {
        assert_eq!(Rgb::from_hex("red"), None);
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#gg0000"), None);
        assert_eq!(Rgb::from_hex("#ééé"), None);
    }

    #[test]
    fn lerp_clamps_parameter() {
        let cold = Rgb::new(0.0, 0.0, 1.0);
        let hot = Rgb::new(1.0, 0.0, 0.0);
        assert_eq!(cold.lerp(hot, -1.0), cold);
        assert_eq!(cold.lerp(hot, 2.0), hot);
        assert_eq!(cold.lerp(hot, 0.5), Rgb::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn switches_and_patch_panels_expose_port_rows() {
        assert_eq!(visual_profile(EquipmentType::Switch).port_count, 24);
        assert_eq!(visual_profile(EquipmentType::PatchPanel).port_count, 24);
        assert!(!visual_profile(EquipmentType::PatchPanel).has_leds);
    }
}
