use std::fs;

use anyhow::{Context, Result};
use rack_engine::annotations::AnnotationLabel;
use rack_engine::camera::CameraMode;
use rack_engine::config::EngineConfig;
use rack_engine::scene::{FrameReport, RackScene, SceneFlags, SceneObserver, SceneSnapshot};
use rack_model::{analyze_occupancy, Annotation, EquipmentItem, RackSnapshot};
use serde::Serialize;

use crate::cli::SimulateArgs;
use crate::summary::{print_occupancy, write_occupancy_json};

#[derive(Debug, Serialize)]
struct FrameSample {
    #[serde(flatten)]
    report: FrameReport,
    labels: Vec<AnnotationLabel>,
}

#[derive(Debug, Serialize)]
struct FrameLog<'a> {
    rack_id: &'a str,
    fps: f32,
    frames: u32,
    sample_every: u32,
    flags: &'a SceneFlags,
    tours_finished: u32,
    final_camera_mode: CameraMode,
    samples: Vec<FrameSample>,
}

/// Logs scene notifications; the headless host has no dialogs to open.
#[derive(Debug, Default)]
struct HeadlessObserver {
    tours_finished: u32,
}

impl SceneObserver for HeadlessObserver {
    fn equipment_clicked(&mut self, equipment: &EquipmentItem) {
        log::info!("equipment clicked: {}", equipment.id);
    }

    fn annotation_clicked(&mut self, annotation: &Annotation) {
        log::info!("annotation clicked: {}", annotation.id);
    }

    fn tour_finished(&mut self) {
        self.tours_finished += 1;
        log::info!("tour finished");
    }
}

fn load_config(args: &SimulateArgs) -> Result<EngineConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.particles.seed = seed;
    }
    Ok(config)
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let snapshot = RackSnapshot::from_json_file(&args.snapshot)
        .with_context(|| format!("loading rack snapshot {}", args.snapshot.display()))?;
    let config = load_config(&args)?;

    let report = analyze_occupancy(&snapshot.equipment, snapshot.rack.size_u);
    print_occupancy(&snapshot, &report);
    if let Some(path) = args.occupancy_json.as_deref() {
        write_occupancy_json(path, &snapshot, &report)?;
    }

    let mut scene = RackScene::mount(snapshot.rack.clone(), config)
        .with_context(|| format!("mounting rack {}", snapshot.rack.id))?;
    scene.submit_snapshot(SceneSnapshot::from(&snapshot));

    let flags = SceneFlags {
        xray_mode: args.xray,
        airflow_mode: args.airflow,
        show_annotations: args.show_annotations,
        zoom: args.zoom,
        camera_preset: args.preset,
        preset_request: 0,
        reset_camera: 0,
        tour_active: args.tour,
    };
    let dt = 1.0 / args.fps;
    let [width, height] = args.viewport;
    let mut observer = HeadlessObserver::default();
    let mut samples = Vec::new();

    for _ in 0..args.frames {
        let report = scene.frame(dt, &flags, &mut observer);
        if args.frame_log_json.is_some() && report.frame % u64::from(args.sample_every) == 0 {
            samples.push(FrameSample {
                labels: scene.annotation_labels(width, height),
                report,
            });
        }
    }

    let pose = scene.camera().pose();
    println!(
        "Simulated {} frames at {:.1} fps: camera {:?} at [{:.2}, {:.2}, {:.2}], {} tour pass(es), {} cables",
        args.frames,
        args.fps,
        scene.camera().mode(),
        pose.position.x,
        pose.position.y,
        pose.position.z,
        observer.tours_finished,
        scene.cables().len()
    );

    if let Some(path) = args.frame_log_json.as_deref() {
        let log = FrameLog {
            rack_id: &snapshot.rack.id,
            fps: args.fps,
            frames: args.frames,
            sample_every: args.sample_every,
            flags: &flags,
            tours_finished: observer.tours_finished,
            final_camera_mode: scene.camera().mode(),
            samples,
        };
        let json = serde_json::to_string_pretty(&log).context("serializing frame log")?;
        fs::write(path, json)
            .with_context(|| format!("writing frame log to {}", path.display()))?;
        println!("Saved frame log to {}", path.display());
    }

    scene.unmount();
    Ok(())
}
