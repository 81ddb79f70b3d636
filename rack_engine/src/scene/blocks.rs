use glam::Vec3;
use rack_model::materials::{color_for, material_for, status_color, visual_profile};
use rack_model::{
    Aabb, EquipmentItem, EquipmentStatus, EquipmentType, MaterialParams, MountSide, RackGeometry,
    Rgb, VisualProfile,
};
use serde::Serialize;

pub const SOLID_OPACITY: f32 = 1.0;
pub const XRAY_OPACITY: f32 = 0.25;

const PORTS_PER_ROW: u32 = 12;
const PORT_SPAN: f32 = 0.8;
const FACE_INSET: f32 = 0.005;
const HEAT_COLOR: Rgb = Rgb::new(1.0, 0.3, 0.1);
const HEAT_TINT_STRENGTH: f32 = 0.5;
pub const PORT_LIT_COLOR: Rgb = Rgb::new(0.13, 0.77, 0.37);
pub const PORT_DARK_COLOR: Rgb = Rgb::new(0.12, 0.12, 0.14);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockStyle {
    pub xray: bool,
    pub heat_tint: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortIndicator {
    pub position: Vec3,
    pub lit: bool,
}

impl PortIndicator {
    pub fn color(&self) -> Rgb {
        if self.lit {
            PORT_LIT_COLOR
        } else {
            PORT_DARK_COLOR
        }
    }
}

/// Summary shown when a block's popover is open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockPopover {
    pub name: String,
    pub equipment_type: &'static str,
    pub units: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub active_ports: u32,
    pub port_count: u32,
}

/// Renderable box for one piece of equipment plus its face decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentBlock {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub bounds: Aabb,
    pub material: MaterialParams,
    pub base_color: Rgb,
    pub color: Rgb,
    pub opacity: f32,
    pub profile: VisualProfile,
    pub ports: Vec<PortIndicator>,
    pub status_led: Option<Rgb>,
    pub hovered: bool,
    pub popover_open: bool,
    popover: BlockPopover,
}

impl EquipmentBlock {
    pub fn build(
        equipment: &EquipmentItem,
        geometry: &RackGeometry,
        active_ports: u32,
        style: BlockStyle,
    ) -> Self {
        let bounds = geometry.equipment_bounds(equipment);
        let profile = visual_profile(equipment.equipment_type);
        let ports = port_indicators(
            &bounds,
            equipment.mount_side,
            profile.port_count,
            active_ports,
        );
        let status_led = profile.has_leds.then(|| status_color(equipment.status));

        let mut block = Self {
            equipment_id: equipment.id.clone(),
            equipment_type: equipment.equipment_type,
            bounds,
            material: material_for(equipment.equipment_type),
            base_color: color_for(equipment.equipment_type),
            color: color_for(equipment.equipment_type),
            opacity: SOLID_OPACITY,
            profile,
            ports,
            status_led,
            hovered: false,
            popover_open: false,
            popover: BlockPopover {
                name: equipment.name.clone(),
                equipment_type: equipment.equipment_type.label(),
                units: equipment.u_label(),
                manufacturer: equipment.manufacturer.clone(),
                model: equipment.model.clone(),
                status: equipment.status,
                active_ports,
                port_count: profile.port_count,
            },
        };
        block.restyle(style);
        block
    }

    pub fn restyle(&mut self, style: BlockStyle) {
        self.opacity = if style.xray {
            XRAY_OPACITY
        } else {
            SOLID_OPACITY
        };
        self.color = if style.heat_tint {
            self.base_color
                .lerp(HEAT_COLOR, self.profile.heat_output * HEAT_TINT_STRENGTH)
        } else {
            self.base_color
        };
    }

    pub fn lit_ports(&self) -> usize {
        self.ports.iter().filter(|port| port.lit).count()
    }

    pub fn summary(&self) -> &BlockPopover {
        &self.popover
    }

    pub fn popover(&self) -> Option<&BlockPopover> {
        self.popover_open.then_some(&self.popover)
    }

    pub fn toggle_popover(&mut self) -> bool {
        self.popover_open = !self.popover_open;
        self.popover_open
    }
}

/// Lays ports out in rows of twelve on the mounted face. The first
/// `min(active, count)` indicators are lit so the pattern only changes when
/// the count does.
fn port_indicators(bounds: &Aabb, side: MountSide, count: u32, active: u32) -> Vec<PortIndicator> {
    if count == 0 {
        return Vec::new();
    }
    let face_z = match side {
        MountSide::Front => bounds.max.z + FACE_INSET,
        MountSide::Rear => bounds.min.z - FACE_INSET,
    };
    let lit = active.min(count);
    let rows = count.div_ceil(PORTS_PER_ROW);
    let size = bounds.size();
    let span = size.x * PORT_SPAN;
    let row_step = size.y / (rows + 1) as f32;

    (0..count)
        .map(|index| {
            let row = index / PORTS_PER_ROW;
            let column = index % PORTS_PER_ROW;
            let in_row = (count - row * PORTS_PER_ROW).min(PORTS_PER_ROW);
            let x = if in_row == 1 {
                bounds.center().x
            } else {
                bounds.center().x - span * 0.5 + span * column as f32 / (in_row - 1) as f32
            };
            let y = bounds.max.y - row_step * (row + 1) as f32;
            PortIndicator {
                position: Vec3::new(x, y, face_z),
                lit: index < lit,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch() -> EquipmentItem {
        let mut item = EquipmentItem::new("sw1", "Core switch", EquipmentType::Switch, 40, 40);
        item.status = Some(EquipmentStatus::Active);
        item
    }

    #[test]
    fn active_ports_light_a_prefix() {
        let block =
            EquipmentBlock::build(&switch(), &RackGeometry::default(), 5, BlockStyle::default());
        assert_eq!(block.ports.len(), 24);
        assert_eq!(block.lit_ports(), 5);
        assert!(block.ports[..5].iter().all(|port| port.lit));
        assert!(block.ports[5..].iter().all(|port| !port.lit));

        let again =

            EquipmentBlock::build(&switch(), &RackGeometry::default(), 5, BlockStyle::default());
        assert_eq!(block.ports, again.ports);
    }

    #[test]
    fn active_count_is_capped_by_port_count() {
        let block =
            EquipmentBlock::build(&switch(), &RackGeometry::default(), 99, BlockStyle::default());
        assert_eq!(block.lit_ports(), 24);
        assert_eq!(block.summary().active_ports, 99);
    }

    #[test]
    fn ports_sit_on_the_mounted_face() {
        let geometry = RackGeometry::default();
        let mut rear = switch();
        rear.mount_side = MountSide::Rear;
        let block = EquipmentBlock::build(&rear, &geometry, 0, BlockStyle::default());
        for port in &block.ports {
            assert!(port.position.z < block.bounds.min.z);
            assert!(port.position.y > block.bounds.min.y && port.position.y < block.bounds.max.y);
        }
    }

    #[test]
    fn xray_and_heat_restyle() {
        let item = EquipmentItem::new("s1", "db", EquipmentType::Server, 1, 2);
        let mut block =
            EquipmentBlock::build(&item, &RackGeometry::default(), 0, BlockStyle::default());
        assert_eq!(block.opacity, SOLID_OPACITY);
        assert_eq!(block.color, block.base_color);

        block.restyle(BlockStyle {
            xray: true,
            heat_tint: true,
        });
        assert_eq!(block.opacity, XRAY_OPACITY);
        assert_ne!(block.color, block.base_color);
    }

    #[test]
    fn popover_toggles() {
        let mut block =
            EquipmentBlock::build(&switch(), &RackGeometry::default(), 0, BlockStyle::default());
        assert!(block.popover().is_none());
        assert!(block.toggle_popover());
        assert_eq!(block.popover().map(|p| p.units.as_str()), Some("U40"));
        assert!(!block.toggle_popover());
    }

    #[test]
    fn passive_gear_has_no_led() {
        let panel = EquipmentItem::new("pp", "Patch", EquipmentType::PatchPanel, 3, 3);
        let block =
            EquipmentBlock::build(&panel, &RackGeometry::default(), 0, BlockStyle::default());
        assert!(block.status_led.is_none());
    }
}
