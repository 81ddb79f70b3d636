//! Resolves raw cable/port records into equipment-to-equipment edges.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{CableType, ConnectionEdge, EquipmentItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    pub id: String,
    pub equipment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CableRecord {
    pub id: String,
    pub cable_type: CableType,
    pub port_a_id: String,
    pub port_b_id: String,
}

/// Maps each cable to the pair of equipment owning its ports. Cables whose
/// ports or owners cannot be found are dropped; they are a data-layer concern
/// and never reach the scene.
pub fn resolve_connections(
    cables: &[CableRecord],
    ports: &[PortRecord],
    equipment: &[EquipmentItem],
) -> Vec<ConnectionEdge> {
    let port_owner: BTreeMap<&str, &str> = ports
        .iter()
        .map(|port| (port.id.as_str(), port.equipment_id.as_str()))
        .collect();
    let known: BTreeSet<&str> = equipment.iter().map(|item| item.id.as_str()).collect();

    let mut edges = Vec::with_capacity(cables.len());
    for cable in cables {
        let owner_a = port_owner.get(cable.port_a_id.as_str()).copied();
        let owner_b = port_owner.get(cable.port_b_id.as_str()).copied();
        match (owner_a, owner_b) {
            (Some(a), Some(b)) if known.contains(a) && known.contains(b) => {
                edges.push(ConnectionEdge {
                    id: cable.id.clone(),
                    cable_type: cable.cable_type,
                    equipment_a_id: a.to_string(),
                    equipment_b_id: b.to_string(),
                });
            }
            _ => {
                log::debug!(
                    "dropping cable {} ({} -> {}): endpoint not in rack",
                    cable.id,
                    cable.port_a_id,
                    cable.port_b_id
                );
            }
        }
    }
    edges
}

/// Drops pre-resolved edges that reference equipment missing from `equipment`.
pub fn retain_resolved(
    edges: Vec<ConnectionEdge>,
    equipment: &[EquipmentItem],
) -> Vec<ConnectionEdge> {
    let known: BTreeSet<&str> = equipment.iter().map(|item| item.id.as_str()).collect();
    edges
        .into_iter()
        .filter(|edge| {
            let keep = known.contains(edge.equipment_a_id.as_str())
                && known.contains(edge.equipment_b_id.as_str());
            if !keep {
                log::debug!("dropping dangling connection {}", edge.id);
            }
            keep
        })
        .collect()
}
