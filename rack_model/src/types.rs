//! Read-only records supplied by the asset-tracking data layer. The engine
//! never mutates these; it receives fresh snapshots and derives geometry from
//! them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Physical rack envelope. Immutable for the lifetime of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RackSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub size_u: u32,
}

impl RackSpec {
    pub fn new(id: impl Into<String>, size_u: u32) -> Self {
        Self {
            id: id.into(),
            name: None,
            size_u,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    Server,
    Switch,
    Router,
    Firewall,
    Storage,
    Pdu,
    Ups,
    PatchPanel,
    Kvm,
    LoadBalancer,
    #[serde(other)]
    Unknown,
}

impl EquipmentType {
    pub fn label(self) -> &'static str {
        match self {
            EquipmentType::Server => "Server",
            EquipmentType::Switch => "Switch",
            EquipmentType::Router => "Router",
            EquipmentType::Firewall => "Firewall",
            EquipmentType::Storage => "Storage",
            EquipmentType::Pdu => "PDU",
            EquipmentType::Ups => "UPS",
            EquipmentType::PatchPanel => "Patch Panel",
            EquipmentType::Kvm => "KVM",
            EquipmentType::LoadBalancer => "Load Balancer",
            EquipmentType::Unknown => "Equipment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountSide {
    #[default]
    Front,
    Rear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Active,
    Maintenance,
    Offline,
    Decommissioned,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    pub position_u_start: i32,
    pub position_u_end: i32,
    #[serde(default)]
    pub mount_side: MountSide,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<EquipmentStatus>,
}

impl EquipmentItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        equipment_type: EquipmentType,
        position_u_start: i32,
        position_u_end: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            equipment_type,
            position_u_start,
            position_u_end,
            mount_side: MountSide::Front,
            manufacturer: None,
            model: None,
            status: None,
        }
    }

    /// `(low, high)` U bounds; the data layer may deliver them inverted.
    pub fn u_range(&self) -> (i32, i32) {
        crate::spatial::normalized_range(self.position_u_start, self.position_u_end)
    }

    pub fn height_u(&self) -> u32 {
        let (low, high) = self.u_range();
        let units = i64::from(high) - i64::from(low) + 1;
        u32::try_from(units).unwrap_or(u32::MAX)
    }

    /// Short label used by tooltips and the side panel (`U5` or `U10-U12`).
    pub fn u_label(&self) -> String {
        let (low, high) = self.u_range();
        if low == high {
            format!("U{low}")
        } else {
            format!("U{low}-U{high}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableType {
    Cat5e,
    Cat6,
    Cat6a,
    Fiber,
    Dac,
    Power,
    Console,
    #[serde(other)]
    Unknown,
}

/// Cable between two pieces of equipment, resolved from its port endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEdge {
    pub id: String,
    pub cable_type: CableType,
    pub equipment_a_id: String,
    pub equipment_b_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSide {
    Front,
    Rear,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Info,
    Note,
    Attention,
    Warning,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub rack_id: String,
    pub position_u: u32,
    pub position_side: AnnotationSide,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub priority: AnnotationPriority,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// `equipment_id -> active port count`, pushed by the realtime feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivePortIndex {
    counts: BTreeMap<String, u32>,
}

impl ActivePortIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, equipment_id: impl Into<String>, count: u32) {
        self.counts.insert(equipment_id.into(), count);
    }

    /// Missing entries read as zero active ports.
    pub fn active_ports(&self, equipment_id: &str) -> u32 {
        self.counts.get(equipment_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u32)> for ActivePortIndex {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}
