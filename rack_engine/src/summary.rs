use std::{fs, path::Path};

use anyhow::{Context, Result};
use rack_model::{analyze_occupancy, rack_elevation, ElevationSlot, OccupancyReport, RackSnapshot};
use serde::Serialize;

use crate::cli::OccupancyArgs;

#[derive(Serialize)]
struct OccupancyManifest<'a> {
    rack_id: &'a str,
    rack_name: Option<&'a str>,
    report: &'a OccupancyReport,
    free_range_labels: Vec<String>,
    elevation: &'a [ElevationSlot],
}

pub fn execute(args: OccupancyArgs) -> Result<()> {
    let snapshot = RackSnapshot::from_json_file(&args.snapshot)
        .with_context(|| format!("loading rack snapshot {}", args.snapshot.display()))?;
    let report = analyze_occupancy(&snapshot.equipment, snapshot.rack.size_u);
    print_occupancy(&snapshot, &report);

    let elevation = rack_elevation(&snapshot.equipment, snapshot.rack.size_u);
    print_elevation(&elevation);

    if let Some(path) = args.occupancy_json.as_deref() {
        write_occupancy_json(path, &snapshot, &report)?;
    }
    Ok(())
}

pub fn print_occupancy(snapshot: &RackSnapshot, report: &OccupancyReport) {
    let rack = &snapshot.rack;
    println!(
        "Rack {} ({}U): {} occupied, {} available ({:.1}%)",
        rack.name.as_deref().unwrap_or(&rack.id),
        report.size_u,
        report.occupied_us,
        report.available_us,
        report.occupancy_percentage
    );
    let labels = report.free_range_labels();
    if labels.is_empty() {
        println!("  free ranges: none");
    } else {
        println!("  free ranges: {}", labels.join(", "));
    }
}

fn print_elevation(elevation: &[ElevationSlot]) {
    for slot in elevation {
        match slot {
            ElevationSlot::Free { u } => println!("  U{u:>3}  ."),
            ElevationSlot::Occupied {
                u,
                equipment_id,
                is_top,
            } => {
                let marker = if *is_top { "+" } else { "|" };
                println!("  U{u:>3}  {marker} {equipment_id}");
            }
        }
    }
}

pub fn write_occupancy_json(
    path: &Path,
    snapshot: &RackSnapshot,
    report: &OccupancyReport,
) -> Result<()> {
    let elevation = rack_elevation(&snapshot.equipment, snapshot.rack.size_u);
    let manifest = OccupancyManifest {
        rack_id: &snapshot.rack.id,
        rack_name: snapshot.rack.name.as_deref(),
        report,
        free_range_labels: report.free_range_labels(),
        elevation: &elevation,
    };
    let json = serde_json::to_string_pretty(&manifest).context("serializing occupancy report")?;
    fs::write(path, json)
        .with_context(|| format!("writing occupancy report to {}", path.display()))?;
    println!("Saved occupancy report to {}", path.display());
    Ok(())
}
