//! Host-agnostic rack scene engine: airflow particles, camera state machine,
//! guided tour, annotation overlay and the scene composer that owns them.

pub mod annotations;
pub mod camera;
pub mod commands;
pub mod config;
pub mod particles;
pub mod picking;
pub mod scene;
pub mod tour;

pub use annotations::{AnnotationOverlay, AnnotationStore, StoreError};
pub use camera::{CameraController, CameraMode, CameraPose, ViewPreset};
pub use config::{ConfigError, EngineConfig};
pub use particles::{AirflowMode, AirflowSimulator};
pub use scene::{
    FrameReport, PointerEvent, RackScene, SceneError, SceneFlags, SceneLayer, SceneObserver,
    SceneSnapshot,
};
pub use tour::TourSequencer;
