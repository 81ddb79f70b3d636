//! Rack data model and the pure spatial helpers shared by the 3D scene and
//! the 2D side panel.
//!
//! Everything in this crate is stateless: the engine hands in snapshots from
//! the data layer and gets geometry, occupancy and styling back.

pub mod connections;
pub mod error;
pub mod materials;
pub mod occupancy;
pub mod snapshot;
pub mod spatial;
pub mod types;

pub use connections::{resolve_connections, CableRecord, PortRecord};
pub use error::ModelError;
pub use materials::{MaterialParams, Rgb, VisualProfile};
pub use occupancy::{analyze_occupancy, rack_elevation, ElevationSlot, FreeRange, OccupancyReport};
pub use snapshot::RackSnapshot;
pub use spatial::{Aabb, RackGeometry};
pub use types::{
    ActivePortIndex, Annotation, AnnotationPriority, AnnotationSide, AnnotationType, CableType,
    ConnectionEdge, EquipmentItem, EquipmentStatus, EquipmentType, MountSide, RackSpec,
};
