//! Rack scene composer. `RackScene` owns every animated component for the
//! lifetime of a mounted rack and advances them from a single `frame` call.
//!
//! Per frame:
//! 1. swap in the pending snapshot, if any;
//! 2. turn flag edges into camera commands and drain the queue;
//! 3. tick the tour and retarget the camera;
//! 4. interpolate the camera;
//! 5. advance the particle pool.

mod blocks;
mod cables;
mod frame;

use std::collections::{BTreeMap, VecDeque};

use rack_model::connections::retain_resolved;
use rack_model::occupancy::occupied_units;
use rack_model::spatial::equipment_center_y;
use rack_model::{
    analyze_occupancy, rack_elevation, ActivePortIndex, Annotation, AnnotationSide,
    ConnectionEdge, ElevationSlot, EquipmentItem, OccupancyReport, RackGeometry, RackSnapshot,
    RackSpec,
};
use serde::Serialize;
use thiserror::Error;

use crate::annotations::{
    AnnotationLabel, AnnotationMarker, AnnotationOverlay, AnnotationStore, StoreError,
};
use crate::camera::{CameraController, CameraMode, CameraPose, CameraProjector, ViewPreset};
use crate::commands::{CameraCommand, CameraCommandQueue};
use crate::config::{ConfigError, EngineConfig};
use crate::particles::{AirflowMode, AirflowSimulator, ParticleVertex};
use crate::picking::{ray_aabb, Ray};
use crate::tour::{TourSequencer, TourTick};

pub use blocks::{
    BlockPopover, BlockStyle, EquipmentBlock, PortIndicator, SOLID_OPACITY, XRAY_OPACITY,
};
pub use cables::{quadratic_bezier, route_cable, CableCurve, CABLE_SAMPLES};
pub use frame::{DirectionalLight, Floor, LightingRig, RackFrame, ULabel};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("rack {rack_id} has no rack units")]
    EmptyRack { rack_id: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything the data layer refreshes while a rack is mounted. Always
/// replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSnapshot {
    pub equipment: Vec<EquipmentItem>,
    pub connections: Vec<ConnectionEdge>,
    pub annotations: Vec<Annotation>,
    pub active_ports: ActivePortIndex,
}

impl From<&RackSnapshot> for SceneSnapshot {
    fn from(snapshot: &RackSnapshot) -> Self {
        Self {
            equipment: snapshot.equipment.clone(),
            connections: snapshot.resolved_connections(),
            annotations: snapshot.annotations.clone(),
            active_ports: snapshot.active_ports.clone(),
        }
    }
}

/// Host-owned mode switches, passed in every frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneFlags {
    pub xray_mode: bool,
    pub airflow_mode: AirflowMode,
    pub show_annotations: bool,
    pub zoom: f32,
    /// A change to `Some(preset)` queues one preset transition.
    pub camera_preset: Option<ViewPreset>,
    /// Bumping the counter re-queues the current preset, so selecting the
    /// same view twice moves the camera twice.
    pub preset_request: u64,
    /// Bumping the counter queues one reset.
    pub reset_camera: u64,
    pub tour_active: bool,
}

impl Default for SceneFlags {
    fn default() -> Self {
        Self {
            xray_mode: false,
            airflow_mode: AirflowMode::Off,
            show_annotations: true,
            zoom: 1.0,
            camera_preset: None,
            preset_request: 0,
            reset_camera: 0,
            tour_active: false,
        }
    }
}

/// Notifications raised by the scene. Every method defaults to a no-op.
pub trait SceneObserver {
    fn equipment_clicked(&mut self, _equipment: &EquipmentItem) {}
    fn annotation_clicked(&mut self, _annotation: &Annotation) {}
    fn tour_finished(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SceneObserver for NullObserver {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move(Ray),
    Click(Ray),
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickTarget {
    Equipment(String),
    Annotation(String),
}

/// Ordered draw list handed to the host renderer.
#[derive(Debug, Clone, Copy)]
pub enum SceneLayer<'a> {
    Lighting(&'a LightingRig),
    RackFrame(&'a RackFrame),
    Equipment(&'a [EquipmentBlock]),
    Cables(&'a [CableCurve]),
    Floor(&'a Floor),
    Particles(&'a [ParticleVertex]),
    Annotations(&'a [AnnotationMarker]),
    Camera(CameraPose),
}

impl SceneLayer<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            SceneLayer::Lighting(_) => "lighting",
            SceneLayer::RackFrame(_) => "rack_frame",
            SceneLayer::Equipment(_) => "equipment",
            SceneLayer::Cables(_) => "cables",
            SceneLayer::Floor(_) => "floor",
            SceneLayer::Particles(_) => "particles",
            SceneLayer::Annotations(_) => "annotations",
            SceneLayer::Camera(_) => "camera",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleStats {
    pub active: usize,
    pub mean_color_state: f32,
    pub recycled_cold: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub snapshot_applied: bool,
    pub commands: Vec<CameraCommand>,
    pub camera_mode: CameraMode,
    pub camera_position: [f32; 3],
    pub camera_look_at: [f32; 3],
    pub camera_remaining: f32,
    pub tour: TourTick,
    pub tour_index: Option<usize>,
    pub particles: ParticleStats,
}

pub struct RackScene {
    rack: RackSpec,
    config: EngineConfig,
    equipment: Vec<EquipmentItem>,
    connections: Vec<ConnectionEdge>,
    active_ports: ActivePortIndex,
    blocks: Vec<EquipmentBlock>,
    cables: Vec<CableCurve>,
    rack_frame: RackFrame,
    floor: Floor,
    lighting: LightingRig,
    particles: AirflowSimulator,
    camera: CameraController,
    commands: CameraCommandQueue,
    tour: TourSequencer,
    overlay: AnnotationOverlay,
    pending: Option<SceneSnapshot>,
    last_flags: SceneFlags,
    frame_index: u64,
    mounted: bool,
}

impl RackScene {
    pub fn mount(rack: RackSpec, config: EngineConfig) -> Result<Self, SceneError> {
        if rack.size_u == 0 {
            return Err(SceneError::EmptyRack { rack_id: rack.id });
        }
        config.validate()?;

        let geometry = config.geometry;
        let size_u = rack.size_u;
        log::info!(
            "mounting rack {} ({}U, {} particles)",
            rack.id,
            size_u,
            config.particles.count
        );

        Ok(Self {
            equipment: Vec::new(),
            connections: Vec::new(),
            active_ports: ActivePortIndex::new(),
            blocks: Vec::new(),
            cables: Vec::new(),
            rack_frame: RackFrame::build(&geometry, size_u),
            floor: Floor::under(&geometry),
            lighting: LightingRig::studio(geometry.rack_center(size_u)),
            particles: AirflowSimulator::new(&config.particles, &geometry, size_u),
            camera: CameraController::new(&config.camera, &geometry, size_u),
            commands: CameraCommandQueue::new(),
            tour: TourSequencer::new(config.tour.dwell_seconds),
            overlay: AnnotationOverlay::new(geometry, size_u),
            pending: None,
            last_flags: SceneFlags::default(),
            frame_index: 0,
            mounted: true,
            rack,
            config,
        })
    }

    /// Queues a full data replacement for the start of the next frame. A
    /// newer submission overwrites one that has not been applied yet.
    pub fn submit_snapshot(&mut self, snapshot: SceneSnapshot) {
        if self.pending.replace(snapshot).is_some() {
            log::debug!("unapplied snapshot superseded");
        }
    }

    /// Queues a camera command directly, bypassing flag edge detection.
    pub fn queue_command(&mut self, command: CameraCommand) {
        self.commands.push(command);
    }

    pub fn frame(
        &mut self,
        dt: f32,
        flags: &SceneFlags,
        observer: &mut dyn SceneObserver,
    ) -> FrameReport {
        self.frame_index += 1;
        let dt = dt.max(0.0);

        let snapshot_applied = match self.pending.take() {
            Some(snapshot) if self.mounted => {
                self.apply_snapshot(snapshot);
                true
            }
            _ => false,
        };

        self.apply_flags(flags);
        let commands = self.commands.drain_frame();
        if self.mounted {
            self.run_commands(&commands);
        }

        let tour = self.tick_tour(dt, observer);
        let camera_remaining = self.camera.update(dt);
        self.particles.advance(dt);

        let pose = self.camera.pose();
        FrameReport {
            frame: self.frame_index,
            dt,
            snapshot_applied,
            commands,
            camera_mode: self.camera.mode(),
            camera_position: pose.position.to_array(),
            camera_look_at: pose.look_at.to_array(),
            camera_remaining,
            tour,
            tour_index: self.tour.is_active().then(|| self.tour.index()),
            particles: self.particle_stats(),
        }
    }

    fn apply_snapshot(&mut self, snapshot: SceneSnapshot) {
        let SceneSnapshot {
            equipment,
            connections,
            annotations,
            active_ports,
        } = snapshot;

        // Hover and popover state survive a refresh for blocks that still exist.
        let carried: BTreeMap<String, (bool, bool)> = self
            .blocks
            .iter()
            .map(|block| (block.equipment_id.clone(), (block.hovered, block.popover_open)))
            .collect();

        let geometry = self.config.geometry;
        let style = self.block_style();
        self.blocks = equipment
            .iter()
            .map(|item| {
                let mut block = EquipmentBlock::build(
                    item,
                    &geometry,
                    active_ports.active_ports(&item.id),
                    style,
                );
                if let Some(&(hovered, popover_open)) = carried.get(&item.id) {
                    block.hovered = hovered;
                    block.popover_open = popover_open;
                }
                block
            })
            .collect();

        self.connections = retain_resolved(connections, &equipment);
        let blocks = &self.blocks;
        self.cables = cables::route_cables(&self.connections, &geometry, |id| {
            blocks
                .iter()
                .find(|block| block.equipment_id == id)
                .map(|block| &block.bounds)
        });

        self.particles
            .set_occupancy(occupied_units(&equipment, self.rack.size_u));
        self.overlay.replace(annotations);
        self.equipment = equipment;
        self.active_ports = active_ports;

        log::debug!(
            "snapshot applied: {} equipment, {} cables, {} annotations",
            self.equipment.len(),
            self.cables.len(),
            self.overlay.annotations().len()
        );
    }

    fn block_style(&self) -> BlockStyle {
        BlockStyle {
            xray: self.last_flags.xray_mode,
            heat_tint: self.last_flags.airflow_mode.tints_equipment(),
        }
    }

    /// Compares against the previous frame's flags; only changes produce
    /// commands, so a held flag never re-triggers.
    fn apply_flags(&mut self, flags: &SceneFlags) {
        let previous = std::mem::replace(&mut self.last_flags, flags.clone());

        if flags.tour_active != previous.tour_active {
            self.commands.push(if flags.tour_active {
                CameraCommand::StartTour
            } else {
                CameraCommand::StopTour
            });
        }
        if flags.camera_preset != previous.camera_preset
            || flags.preset_request != previous.preset_request
        {
            if let Some(preset) = flags.camera_preset {
                self.commands.push(CameraCommand::Preset { preset });
            }
        }
        if flags.reset_camera != previous.reset_camera {
            self.commands.push(CameraCommand::Reset);
        }
        if flags.zoom.is_finite() && flags.zoom != previous.zoom {
            self.commands.push(CameraCommand::Zoom { zoom: flags.zoom });
        }

        if flags.xray_mode != previous.xray_mode
            || flags.airflow_mode.tints_equipment() != previous.airflow_mode.tints_equipment()
        {
            let style = self.block_style();
            for block in &mut self.blocks {
                block.restyle(style);
            }
            self.rack_frame.set_xray(flags.xray_mode);
        }

        self.particles
            .set_enabled(self.mounted && flags.airflow_mode.particles_enabled());
        self.particles
            .set_gradient(flags.airflow_mode.thermal_gradient());
    }

    /// Tour commands run first; once a tour holds the camera, presets and
    /// resets from the same batch are dropped.
    fn run_commands(&mut self, commands: &[CameraCommand]) {
        for command in commands {
            match command {
                CameraCommand::StartTour => {
                    if self.tour.start(self.equipment.len()) {
                        log::info!("tour started over {} items", self.equipment.len());
                        self.follow_tour();
                    }
                }
                CameraCommand::StopTour => {
                    if self.tour.is_active() {
                        log::info!("tour stopped at item {}", self.tour.index());
                        self.tour.stop();
                        self.camera.end_tour();
                    }
                }
                _ => {}
            }
        }

        let touring = self.tour.is_active();
        for command in commands {
            match *command {
                CameraCommand::Preset { preset } => {
                    if touring {
                        log::debug!("preset {preset} dropped: tour active");
                    } else {
                        self.camera.apply_preset(preset);
                    }
                }
                CameraCommand::Reset => {
                    if touring {
                        log::debug!("camera reset dropped: tour active");
                    } else {
                        self.camera.apply_reset();
                    }
                }
                CameraCommand::Zoom { zoom } => self.camera.set_zoom(zoom),
                CameraCommand::StartTour | CameraCommand::StopTour => {}
            }
        }
    }

    fn tick_tour(&mut self, dt: f32, observer: &mut dyn SceneObserver) -> TourTick {
        let tick = self.tour.tick(dt, self.equipment.len());
        match tick {
            TourTick::Inactive => {}
            TourTick::Holding(_) => self.follow_tour(),
            TourTick::Advanced(index) => {
                log::debug!("tour advanced to item {index}");
                self.follow_tour();
            }
            TourTick::Finished => {
                log::info!("tour finished");
                self.camera.end_tour();
                observer.tour_finished();
            }
        }
        tick
    }

    fn follow_tour(&mut self) {
        let index = self.tour.index();
        if let Some(item) = self.equipment.get(index) {
            let focus_y = equipment_center_y(item, self.config.geometry.unit_height);
            self.camera.follow(index, focus_y);
        }
    }

    fn particle_stats(&self) -> ParticleStats {
        if !self.particles.is_enabled() {
            return ParticleStats {
                active: 0,
                mean_color_state: 0.0,
                recycled_cold: 0,
            };
        }
        let particles = self.particles.particles();
        let total: f32 = particles.iter().map(|p| p.color_state).sum();
        ParticleStats {
            active: particles.len(),
            mean_color_state: if particles.is_empty() {
                0.0
            } else {
                total / particles.len() as f32
            },
            recycled_cold: particles.iter().filter(|p| p.color_state == 0.0).count(),
        }
    }

    /// Hover tracking and click dispatch. Clicks toggle only the hit block's
    /// popover.
    pub fn pointer(
        &mut self,
        event: PointerEvent,
        observer: &mut dyn SceneObserver,
    ) -> Option<PickTarget> {
        if !self.mounted {
            return None;
        }
        match event {
            PointerEvent::Leave => {
                for block in &mut self.blocks {
                    block.hovered = false;
                }
                None
            }
            PointerEvent::Move(ray) => {
                let hit = self.pick_block(&ray).map(|(index, _)| index);
                for (index, block) in self.blocks.iter_mut().enumerate() {
                    block.hovered = Some(index) == hit;
                }
                hit.map(|index| PickTarget::Equipment(self.blocks[index].equipment_id.clone()))
            }
            PointerEvent::Click(ray) => {
                let block_hit = self.pick_block(&ray);
                let annotation_hit = if self.last_flags.show_annotations {
                    self.overlay.pick(&ray).map(|(annotation, t)| (annotation.id.clone(), t))
                } else {
                    None
                };

                match (block_hit, annotation_hit) {
                    (Some((_, block_t)), Some((id, note_t))) if note_t <= block_t => {
                        self.click_annotation(&id, observer)
                    }
                    (Some((index, _)), _) => self.click_block(index, observer),
                    (None, Some((id, _))) => self.click_annotation(&id, observer),
                    (None, None) => None,
                }
            }
        }
    }

    fn pick_block(&self, ray: &Ray) -> Option<(usize, f32)> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| ray_aabb(ray, &block.bounds).map(|t| (index, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn click_block(
        &mut self,
        index: usize,
        observer: &mut dyn SceneObserver,
    ) -> Option<PickTarget> {
        let block = self.blocks.get_mut(index)?;
        block.toggle_popover();
        let id = block.equipment_id.clone();
        if let Some(item) = self.equipment.iter().find(|item| item.id == id) {
            observer.equipment_clicked(item);
        }
        Some(PickTarget::Equipment(id))
    }

    fn click_annotation(&self, id: &str, observer: &mut dyn SceneObserver) -> Option<PickTarget> {
        let annotation = self.overlay.get(id)?;
        observer.annotation_clicked(annotation);
        Some(PickTarget::Annotation(id.to_string()))
    }

    /// Orbit/pan input from the host. Refused while a tour holds the camera.
    pub fn set_user_pose(&mut self, pose: CameraPose) -> bool {
        self.mounted && self.camera.apply_user_pose(pose)
    }

    pub fn request_annotation<S>(
        &self,
        position_u: u32,
        side: AnnotationSide,
        store: &mut S,
    ) -> Result<(), StoreError>
    where
        S: AnnotationStore + ?Sized,
    {
        self.overlay
            .request_create(&self.rack.id, position_u, side, store)
    }

    pub fn request_delete_annotation(&mut self, annotation_id: &str) -> Result<(), StoreError> {
        self.overlay.request_delete(annotation_id)
    }

    pub fn cancel_delete_annotation(&mut self, annotation_id: &str) -> bool {
        self.overlay.cancel_delete(annotation_id)
    }

    pub fn confirm_delete_annotation<S>(
        &mut self,
        annotation_id: &str,
        store: &mut S,
    ) -> Result<(), StoreError>
    where
        S: AnnotationStore + ?Sized,
    {
        self.overlay.confirm_delete(annotation_id, store)
    }

    /// Screen-space annotation labels for the current camera pose.
    pub fn annotation_labels(
        &self,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<AnnotationLabel> {
        if !self.last_flags.show_annotations || viewport_height <= 0.0 {
            return Vec::new();
        }
        match self.projector(viewport_width / viewport_height) {
            Some(projector) => self
                .overlay
                .labels(&projector, viewport_width, viewport_height),
            None => Vec::new(),
        }
    }

    pub fn projector(&self, aspect_ratio: f32) -> Option<CameraProjector> {
        self.camera
            .projector(self.config.camera.fov_y_degrees, aspect_ratio)
    }

    /// Draw order: lighting, frame, equipment, cables, floor, particles,
    /// annotations, camera.
    pub fn compose(&self) -> Vec<SceneLayer<'_>> {
        let mut layers = vec![
            SceneLayer::Lighting(&self.lighting),
            SceneLayer::RackFrame(&self.rack_frame),
            SceneLayer::Equipment(&self.blocks),
            SceneLayer::Cables(&self.cables),
            SceneLayer::Floor(&self.floor),
        ];
        if self.particles.is_enabled() {
            layers.push(SceneLayer::Particles(self.particles.vertices()));
        }
        if self.last_flags.show_annotations {
            layers.push(SceneLayer::Annotations(self.overlay.markers()));
        }
        layers.push(SceneLayer::Camera(self.camera.pose()));
        layers
    }

    pub fn occupancy(&self) -> OccupancyReport {
        analyze_occupancy(&self.equipment, self.rack.size_u)
    }

    pub fn elevation(&self) -> Vec<ElevationSlot> {
        rack_elevation(&self.equipment, self.rack.size_u)
    }

    pub fn rack(&self) -> &RackSpec {
        &self.rack
    }

    pub fn geometry(&self) -> &RackGeometry {
        &self.config.geometry
    }

    pub fn equipment(&self) -> &[EquipmentItem] {
        &self.equipment
    }

    pub fn connections(&self) -> &[ConnectionEdge] {
        &self.connections
    }

    pub fn active_ports(&self) -> &ActivePortIndex {
        &self.active_ports
    }

    pub fn blocks(&self) -> &[EquipmentBlock] {
        &self.blocks
    }

    pub fn block(&self, equipment_id: &str) -> Option<&EquipmentBlock> {
        self.blocks.iter().find(|block| block.equipment_id == equipment_id)
    }

    pub fn cables(&self) -> &[CableCurve] {
        &self.cables
    }

    pub fn rack_frame(&self) -> &RackFrame {
        &self.rack_frame
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn tour(&self) -> &TourSequencer {
        &self.tour
    }

    pub fn particles(&self) -> &AirflowSimulator {
        &self.particles
    }

    pub fn annotations(&self) -> &AnnotationOverlay {
        &self.overlay
    }

    pub fn command_history(&self) -> &VecDeque<CameraCommand> {
        self.commands.history()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Stops the tour and the particle pool. Dropping the scene does the same.
    pub fn unmount(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.tour.stop();
        self.camera.end_tour();
        self.particles.set_enabled(false);
        self.commands.clear();
        self.pending = None;
        log::info!("unmounted rack {}", self.rack.id);
    }
}

impl Drop for RackScene {
    fn drop(&mut self) {
        self.shutdown();
    }
}
