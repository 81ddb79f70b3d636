//! JSON snapshot of a rack as delivered by the data layer.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::connections::{resolve_connections, retain_resolved, CableRecord, PortRecord};
use crate::error::ModelError;
use crate::types::{ActivePortIndex, Annotation, ConnectionEdge, EquipmentItem, RackSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RackSnapshot {
    pub rack: RackSpec,
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
    #[serde(default)]
    pub ports: Vec<PortRecord>,
    #[serde(default)]
    pub cables: Vec<CableRecord>,
    /// Edges the data layer already resolved; merged with those derived from
    /// `cables`.
    #[serde(default)]
    pub connections: Vec<ConnectionEdge>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub active_ports: ActivePortIndex,
}

impl RackSnapshot {
    pub fn from_json_str(data: &str) -> Result<Self, ModelError> {
        let snapshot: RackSnapshot = serde_json::from_str(data)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ModelError> {
        let data = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Rejects snapshots the engine cannot lay out at all. Equipment ranges
    /// are not checked; out-of-range gear is drawn where its numbers put it.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.rack.size_u == 0 {
            return Err(ModelError::EmptyRack {
                rack_id: self.rack.id.clone(),
                size_u: self.rack.size_u,
            });
        }
        for annotation in &self.annotations {
            if annotation.position_u == 0 || annotation.position_u > self.rack.size_u {
                return Err(ModelError::AnnotationOutOfRange {
                    annotation_id: annotation.id.clone(),
                    position_u: annotation.position_u,
                    size_u: self.rack.size_u,
                });
            }
        }
        Ok(())
    }

    /// Every renderable edge: cable records resolved through their ports plus
    /// pre-resolved connections, with dangling references removed.
    pub fn resolved_connections(&self) -> Vec<ConnectionEdge> {
        let mut edges = resolve_connections(&self.cables, &self.ports, &self.equipment);
        edges.extend(retain_resolved(self.connections.clone(), &self.equipment));
        edges
    }
}
