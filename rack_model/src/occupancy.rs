//! Occupancy analysis for the rack side panel and the particle simulator's
//! populated-row lookup.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::EquipmentItem;

/// Contiguous run of free U positions, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeRange {
    pub start: u32,
    pub end: u32,
}

impl FreeRange {
    pub fn unit_count(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn label(&self) -> String {
        if self.start == self.end {
            format!("U{}", self.start)
        } else {
            format!("U{}-U{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyReport {
    pub size_u: u32,
    pub occupied_us: u32,
    pub available_us: u32,
    pub occupancy_percentage: f32,
    pub free_ranges: Vec<FreeRange>,
}

impl OccupancyReport {
    pub fn free_range_labels(&self) -> Vec<String> {
        self.free_ranges.iter().map(FreeRange::label).collect()
    }
}

/// Set of occupied U positions clipped to `[1, size_u]`.
pub fn occupied_units(equipment: &[EquipmentItem], size_u: u32) -> BTreeSet<u32> {
    let mut occupied = BTreeSet::new();
    for item in equipment {
        let (low, high) = item.u_range();
        let low = low.max(1);
        let high = high.min(size_u as i32);
        for u in low..=high {
            occupied.insert(u as u32);
        }
    }
    occupied
}

pub fn analyze_occupancy(equipment: &[EquipmentItem], size_u: u32) -> OccupancyReport {
    let occupied = occupied_units(equipment, size_u);

    let mut free_ranges = Vec::new();
    let mut run_start: Option<u32> = None;
    for u in 1..=size_u {
        if occupied.contains(&u) {
            if let Some(start) = run_start.take() {
                free_ranges.push(FreeRange { start, end: u - 1 });
            }
        } else if run_start.is_none() {
            run_start = Some(u);
        }
    }
    if let Some(start) = run_start {
        free_ranges.push(FreeRange { start, end: size_u });
    }

    let occupied_us = occupied.len() as u32;
    let occupancy_percentage = if size_u == 0 {
        0.0
    } else {
        occupied_us as f32 / size_u as f32 * 100.0
    };

    OccupancyReport {
        size_u,
        occupied_us,
        available_us: size_u - occupied_us,
        occupancy_percentage,
        free_ranges,
    }
}

/// One row of the 2D elevation drawing, top of the rack first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElevationSlot {
    Free { u: u32 },
    Occupied { u: u32, equipment_id: String, is_top: bool },
}

impl ElevationSlot {
    pub fn u(&self) -> u32 {
        match self {
            ElevationSlot::Free { u } | ElevationSlot::Occupied { u, .. } => *u,
        }
    }
}

/// Top-down slot listing for the side panel. On overlap the first equipment
/// in snapshot order owns the slot.
pub fn rack_elevation(equipment: &[EquipmentItem], size_u: u32) -> Vec<ElevationSlot> {
    (1..=size_u)
        .rev()
        .map(|u| {
            let owner = equipment.iter().find(|item| {
                let (low, high) = item.u_range();
                (low..=high).contains(&(u as i32))
            });
            match owner {
                Some(item) => ElevationSlot::Occupied {
                    u,
                    equipment_id: item.id.clone(),
                    is_top: item.u_range().1 == u as i32,
                },
                None => ElevationSlot::Free { u },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EquipmentType;
    use proptest::prelude::*;

    fn item(id: &str, start: i32, end: i32) -> EquipmentItem {
        EquipmentItem::new(id, id, EquipmentType::Server, start, end)
    }

    #[test]
    fn forty_two_u_rack_example() {
        let equipment = vec![item("a", 10, 12), item("b", 1, 1)];
        let report = analyze_occupancy(&equipment, 42);
        assert_eq!(report.occupied_us, 4);
        assert_eq!(report.available_us, 38);
        assert_eq!(report.free_range_labels(), vec!["U2-U9", "U13-U42"]);
        assert!((report.occupancy_percentage - 4.0 / 42.0 * 100.0).abs() < 1e-4);
    }

    #[test]
    fn empty_rack_is_fully_available() {
        let report = analyze_occupancy(&[], 24);
        assert_eq!(report.occupied_us, 0);
        assert_eq!(report.available_us, 24);
        assert_eq!(report.free_range_labels(), vec!["U1-U24"]);
        assert_eq!(report.occupancy_percentage, 0.0);
    }

    #[test]
    fn single_free_unit_uses_short_label() {
        let equipment = vec![item("a", 1, 4), item("b", 6, 8)];
        let report = analyze_occupancy(&equipment, 8);
        assert_eq!(report.free_range_labels(), vec!["U5"]);
    }

    #[test]
    fn out_of_range_equipment_is_clipped_for_counting() {
        let equipment = vec![item("a", 40, 45)];
        let report = analyze_occupancy(&equipment, 42);
        assert_eq!(report.occupied_us, 3);
        assert_eq!(report.available_us, 39);
    }

    #[test]
    fn elevation_lists_top_slot_first() {
        let equipment = vec![item("sw", 3, 2)];
        let rows = rack_elevation(&equipment, 4);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], ElevationSlot::Free { u: 4 });
        assert_eq!(
            rows[1],
            ElevationSlot::Occupied {
                u: 3,
                equipment_id: "sw".to_string(),
                is_top: true
            }
        );
        assert_eq!(
            rows[2],
            ElevationSlot::Occupied {
                u: 2,
                equipment_id: "sw".to_string(),
                is_top: false
            }
        );
        assert_eq!(rows[3].u(), 1);
    }

    proptest! {
        #[test]
        fn free_ranges_partition_the_rack(
            size_u in 1u32..64,
            ranges in proptest::collection::vec((1i32..64, 1i32..64), 0..8),
        ) {
            let equipment: Vec<EquipmentItem> = ranges
                .iter()
                .enumerate()
                .map(|(idx, (start, end))| item(&format!("eq-{idx}"), *start, *end))
                .collect();
            let report = analyze_occupancy(&equipment, size_u);
            let occupied = occupied_units(&equipment, size_u);

            let mut covered: Vec<u32> = occupied.iter().copied().collect();
            let mut previous_end: Option<u32> = None;
            for range in &report.free_ranges {
                prop_assert!(range.start <= range.end);
                if let Some(prev) = previous_end {
                    // Ascending and never adjacent: adjacent free runs must coalesce.
                    prop_assert!(range.start > prev + 1);
                }
                previous_end = Some(range.end);
                for u in range.start..=range.end {
                    prop_assert!(!occupied.contains(&u));
                    covered.push(u);
                }
            }
            covered.sort_unstable();
            let expected: Vec<u32> = (1..=size_u).collect();
            prop_assert_eq!(covered, expected);
            prop_assert_eq!(report.occupied_us + report.available_us, size_u);
        }
    }
}
