//! Annotation markers anchored to rack faces, their screen-space labels, and
//! the create/delete intents forwarded to the external annotation store.
//!
//! The overlay never removes an annotation on its own: a confirmed delete is
//! handed to the store and the marker stays (flagged) until a snapshot without
//! it arrives.

use std::collections::BTreeSet;

use glam::Vec3;
use rack_model::materials::annotation_color;
use rack_model::spatial::face_anchor;
use rack_model::{Annotation, AnnotationPriority, AnnotationSide, RackGeometry, Rgb};
use serde::Serialize;
use thiserror::Error;

use crate::camera::CameraProjector;
use crate::picking::{ray_sphere, Ray};

pub const MARKER_RADIUS: f32 = 0.06;
pub const LABEL_OFFSET: f32 = 0.35;
const LABEL_PICK_RADIUS: f32 = 0.12;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("annotation store rejected the request: {0}")]
    Rejected(String),
    #[error("annotation {0} does not exist")]
    NotFound(String),
    #[error("U{position_u} is outside the rack (1..={size_u})")]
    OutOfRange { position_u: u32, size_u: u32 },
    #[error("delete of annotation {0} was not requested")]
    NotRequested(String),
}

/// Fields the scene knows when the user asks for a new annotation; the
/// external dialog fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDraft {
    pub rack_id: String,
    pub position_u: u32,
    pub position_side: AnnotationSide,
}

/// Persistence side of annotations, implemented by the host's data layer.
pub trait AnnotationStore {
    fn create(&mut self, draft: AnnotationDraft) -> Result<(), StoreError>;
    fn delete(&mut self, annotation_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationMarker {
    pub id: String,
    pub title: String,
    pub anchor: Vec3,
    pub label_anchor: Vec3,
    pub color: Rgb,
    pub scale: f32,
    pub priority: AnnotationPriority,
    pub pending_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationLabel {
    pub id: String,
    pub text: String,
    /// Pixel position, origin top-left.
    pub screen: [f32; 2],
}

/// World anchor of an annotation: the middle of its U slot on the chosen face.
pub fn annotation_anchor(annotation: &Annotation, geometry: &RackGeometry) -> Vec3 {
    face_anchor(annotation.position_u, annotation.position_side, geometry)
}

/// Label position pushed away from the rack so it never overlaps the rack
/// volume: sideways for left/right anchors, along the depth for front/rear.
pub fn label_anchor(anchor: Vec3) -> Vec3 {
    if anchor.x != 0.0 {
        anchor + Vec3::new(anchor.x.signum() * LABEL_OFFSET, 0.0, 0.0)
    } else {
        anchor + Vec3::new(0.0, 0.0, anchor.z.signum() * LABEL_OFFSET)
    }
}

pub fn priority_scale(priority: AnnotationPriority) -> f32 {
    match priority {
        AnnotationPriority::Low => 0.8,
        AnnotationPriority::Medium => 1.0,
        AnnotationPriority::High => 1.2,
        AnnotationPriority::Critical => 1.45,
    }
}

pub struct AnnotationOverlay {
    geometry: RackGeometry,
    size_u: u32,
    annotations: Vec<Annotation>,
    markers: Vec<AnnotationMarker>,
    delete_requested: BTreeSet<String>,
    awaiting_store: BTreeSet<String>,
}

impl AnnotationOverlay {
    pub fn new(geometry: RackGeometry, size_u: u32) -> Self {
        Self {
            geometry,
            size_u,
            annotations: Vec::new(),
            markers: Vec::new(),
            delete_requested: BTreeSet::new(),
            awaiting_store: BTreeSet::new(),
        }
    }

    /// Swaps in a new annotation snapshot and rebuilds every marker.
    pub fn replace(&mut self, annotations: Vec<Annotation>) {
        let present: BTreeSet<&str> = annotations.iter().map(|a| a.id.as_str()).collect();
        self.delete_requested.retain(|id| present.contains(id.as_str()));
        self.awaiting_store.retain(|id| present.contains(id.as_str()));

        self.markers = annotations
            .iter()
            .map(|annotation| self.build_marker(annotation))
            .collect();
        self.annotations = annotations;
    }

    fn build_marker(&self, annotation: &Annotation) -> AnnotationMarker {
        let anchor = annotation_anchor(annotation, &self.geometry);
        let color = annotation
            .color
            .as_deref()
            .and_then(Rgb::from_hex)
            .unwrap_or_else(|| annotation_color(annotation.annotation_type));
        AnnotationMarker {
            id: annotation.id.clone(),
            title: annotation.title.clone(),
            anchor,
            label_anchor: label_anchor(anchor),
            color,
            scale: priority_scale(annotation.priority),
            priority: annotation.priority,
            pending_delete: self.awaiting_store.contains(&annotation.id),
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn markers(&self) -> &[AnnotationMarker] {
        &self.markers
    }

    pub fn get(&self, annotation_id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == annotation_id)
    }

    /// Projects each marker's label anchor; labels behind the camera are
    /// skipped.
    pub fn labels(
        &self,
        projector: &CameraProjector,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<AnnotationLabel> {
        self.markers
            .iter()
            .filter_map(|marker| {
                let ndc = projector.project(marker.label_anchor)?;
                Some(AnnotationLabel {
                    id: marker.id.clone(),
                    text: marker.title.clone(),
                    screen: CameraProjector::to_screen(ndc, viewport_width, viewport_height),
                })
            })
            .collect()
    }

    /// Nearest marker or label hit by `ray`, with its distance.
    pub fn pick(&self, ray: &Ray) -> Option<(&Annotation, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (index, marker) in self.markers.iter().enumerate() {
            let marker_hit = ray_sphere(ray, marker.anchor, MARKER_RADIUS * marker.scale);
            let label_hit = ray_sphere(ray, marker.label_anchor, LABEL_PICK_RADIUS);
            let hit = match (marker_hit, label_hit) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            if let Some(t) = hit {
                if best.map_or(true, |(_, current)| t < current) {
                    best = Some((index, t));
                }
            }
        }
        best.and_then(|(index, t)| self.annotations.get(index).map(|a| (a, t)))
    }

    pub fn request_create<S>(
        &self,
        rack_id: &str,
        position_u: u32,
        position_side: AnnotationSide,
        store: &mut S,
    ) -> Result<(), StoreError>
    where
        S: AnnotationStore + ?Sized,
    {
        if position_u == 0 || position_u > self.size_u {
            return Err(StoreError::OutOfRange {
                position_u,
                size_u: self.size_u,
            });
        }
        store.create(AnnotationDraft {
            rack_id: rack_id.to_string(),
            position_u,
            position_side,
        })
    }

    /// First step of a delete: marks the annotation as awaiting confirmation.
    pub fn request_delete(&mut self, annotation_id: &str) -> Result<(), StoreError> {
        if self.get(annotation_id).is_none() {
            return Err(StoreError::NotFound(annotation_id.to_string()));
        }
        self.delete_requested.insert(annotation_id.to_string());
        Ok(())
    }

    pub fn cancel_delete(&mut self, annotation_id: &str) -> bool {
        self.delete_requested.remove(annotation_id)
    }

    pub fn is_delete_requested(&self, annotation_id: &str) -> bool {
        self.delete_requested.contains(annotation_id)
    }

    /// Second step: forwards the delete to the store. The marker remains until
    /// the next snapshot drops it; on failure the annotation stays as it was.
    pub fn confirm_delete<S>(
        &mut self,
        annotation_id: &str,
        store: &mut S,
    ) -> Result<(), StoreError>
    where
        S: AnnotationStore + ?Sized,
    {
        if !self.delete_requested.remove(annotation_id) {
            return Err(StoreError::NotRequested(annotation_id.to_string()));
        }
        match store.delete(annotation_id) {
            Ok(()) => {
                self.awaiting_store.insert(annotation_id.to_string());
                if let Some(marker) = self.markers.iter_mut().find(|m| m.id == annotation_id) {
                    marker.pending_delete = true;
                }
                Ok(())
            }
            Err(err) => {
                log::warn!("annotation store failed to delete {annotation_id}: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rack_model::AnnotationType;

    #[derive(Default)]
    struct RecordingStore {
        created: Vec<AnnotationDraft>,
        deleted: Vec<String>,
        fail_deletes: bool,
    }

    impl AnnotationStore for RecordingStore {
        fn create(&mut self, draft: AnnotationDraft) -> Result<(), StoreError> {
            self.created.push(draft);
            Ok(())
        }

        fn delete(&mut self, annotation_id: &str) -> Result<(), StoreError> {
            if self.fail_deletes {
                return Err(StoreError::Rejected("offline".to_string()));
            }
            self.deleted.push(annotation_id.to_string());
            Ok(())
        }
    }

    fn annotation(id: &str, position_u: u32, side: AnnotationSide) -> Annotation {
        Annotation {
            id: id.to_string(),
            rack_id: "rack".to_string(),
            position_u,
            position_side: side,
            title: format!("note {id}"),
            description: None,
            annotation_type: AnnotationType::Warning,
            priority: AnnotationPriority::High,
            color: None,
            due_date: None,
        }
    }

    fn side_strategy() -> impl Strategy<Value = AnnotationSide> {
        prop_oneof![
            Just(AnnotationSide::Front),
            Just(AnnotationSide::Rear),
            Just(AnnotationSide::Left),
            Just(AnnotationSide::Right),
        ]
    }

    #[test]
    fn labels_are_pushed_away_from_rack() {
        let geometry = RackGeometry::default();
        let left = annotation_anchor(&annotation("l", 5, AnnotationSide::Left), &geometry);
        assert!(label_anchor(left).x < left.x);
        let right = annotation_anchor(&annotation("r", 5, AnnotationSide::Right), &geometry);
        assert!(label_anchor(right).x > right.x);
        let rear = annotation_anchor(&annotation("b", 5, AnnotationSide::Rear), &geometry);
        assert!(label_anchor(rear).z < rear.z);
        assert!((left.y - geometry.slot_center_y(5)).abs() < 1e-6);
    }

    #[test]
    fn custom_color_overrides_type_color() {
        let mut overlay = AnnotationOverlay::new(RackGeometry::default(), 42);
        let mut custom = annotation("a", 3, AnnotationSide::Front);
        custom.color = Some("#00ff00".to_string());
        let mut broken = annotation("b", 4, AnnotationSide::Front);
        broken.color = Some("greenish".to_string());
        overlay.replace(vec![custom, broken]);
        assert_eq!(overlay.markers()[0].color, Rgb::new(0.0, 1.0, 0.0));
        assert_eq!(
            overlay.markers()[1].color,
            annotation_color(AnnotationType::Warning)
        );
        assert_eq!(overlay.markers()[0].scale, 1.2);
    }

    #[test]
    fn delete_waits_for_confirmation_and_snapshot() {
        let mut overlay = AnnotationOverlay::new(RackGeometry::default(), 42);
        overlay.replace(vec![
            annotation("a", 3, AnnotationSide::Front),
            annotation("b", 8, AnnotationSide::Rear),
        ]);
        let mut store = RecordingStore::default();

        assert!(matches!(
            overlay.confirm_delete("a", &mut store),
            Err(StoreError::NotRequested(_))
        ));
        overlay.request_delete("a").expect("request delete");
        assert!(overlay.is_delete_requested("a"));
        overlay.confirm_delete("a", &mut store).expect("confirm delete");
        assert_eq!(store.deleted, vec!["a".to_string()]);

        // Still rendered until the data layer confirms with a new snapshot.
        assert_eq!(overlay.markers().len(), 2);
        assert!(overlay.markers()[0].pending_delete);

        overlay.replace(vec![annotation("b", 8, AnnotationSide::Rear)]);
        assert_eq!(overlay.markers().len(), 1);
        assert_eq!(overlay.markers()[0].id, "b");
        assert!(!overlay.markers()[0].pending_delete);
    }

    #[test]
    fn failed_delete_keeps_annotation() {
        let mut overlay = AnnotationOverlay::new(RackGeometry::default(), 42);
        overlay.replace(vec![annotation("a", 3, AnnotationSide::Front)]);
        let mut store = RecordingStore {
            fail_deletes: true,
            ..RecordingStore::default()
        };
        overlay.request_delete("a").expect("request delete");
        assert!(overlay.confirm_delete("a", &mut store).is_err());
        assert!(!overlay.is_delete_requested("a"));
        assert!(!overlay.markers()[0].pending_delete);
        assert!(overlay.get("a").is_some());
    }

    #[test]
    fn cancel_and_unknown_deletes() {
        let mut overlay = AnnotationOverlay::new(RackGeometry::default(), 42);
        overlay.replace(vec![annotation("a", 3, AnnotationSide::Front)]);
        assert!(matches!(
            overlay.request_delete("zzz"),
            Err(StoreError::NotFound(_))
        ));
        overlay.request_delete("a").expect("request delete");
        assert!(overlay.cancel_delete("a"));
        assert!(!overlay.cancel_delete("a"));
    }

    #[test]
    fn create_rejects_out_of_range_slots() {
        let overlay = AnnotationOverlay::new(RackGeometry::default(), 42);
        let mut store = RecordingStore::default();
        assert!(matches!(
            overlay.request_create("rack", 43, AnnotationSide::Left, &mut store),
            Err(StoreError::OutOfRange { .. })
        ));
        overlay
            .request_create("rack", 42, AnnotationSide::Left, &mut store)
            .expect("create");
        assert_eq!(store.created.len(), 1);
        assert_eq!(store.created[0].position_u, 42);
    }

    #[test]
    fn pick_hits_marker_and_label() {
        let geometry = RackGeometry::default();
        let mut overlay = AnnotationOverlay::new(geometry, 42);
        overlay.replace(vec![annotation("a", 10, AnnotationSide::Right)]);
        let marker = overlay.markers()[0].clone();

        let at_marker = Ray::through(marker.anchor + Vec3::new(0.0, 0.0, 5.0), marker.anchor)
            .expect("ray");
        let (hit, _) = overlay.pick(&at_marker).expect("marker hit");
        assert_eq!(hit.id, "a");

        let at_label = Ray::through(
            marker.label_anchor + Vec3::new(0.0, 0.0, 5.0),
            marker.label_anchor,
        )
        .expect("ray");
        assert!(overlay.pick(&at_label).is_some());

        let miss = Ray::new(Vec3::new(0.0, 50.0, 5.0), Vec3::NEG_Z).expect("ray");
        assert!(overlay.pick(&miss).is_none());
    }

    proptest! {
        #[test]
        fn anchors_are_deterministic(
            u in 1u32..=42,
            side in side_strategy(),
            other_u in 1u32..=42,
        ) {
            let geometry = RackGeometry::default();
            let first = annotation("x", u, side);
            let second = annotation("y", u, side);
            let unrelated = annotation("z", other_u, AnnotationSide::Left);

            let a = annotation_anchor(&first, &geometry);
            let _ = annotation_anchor(&unrelated, &geometry);
            let b = annotation_anchor(&second, &geometry);
            prop_assert_eq!(a, b);

            let mut overlay = AnnotationOverlay::new(geometry, 42);
            overlay.replace(vec![unrelated.clone(), second.clone(), first.clone()]);
            let markers = overlay.markers();
            prop_assert_eq!(markers[1].anchor, markers[2].anchor);
            prop_assert_eq!(markers[2].anchor, a);
        }
    }
}
