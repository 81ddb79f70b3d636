use std::collections::VecDeque;

use serde::Serialize;

use crate::camera::ViewPreset;

/// Discrete camera requests raised by the host UI. Each command is consumed
/// exactly once, on the frame after it was queued.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CameraCommand {
    Preset { preset: ViewPreset },
    Reset,
    Zoom { zoom: f32 },
    StartTour,
    StopTour,
}

/// Number of drained commands kept for inspection.
pub const HISTORY_LIMIT: usize = 64;

/// FIFO of pending camera commands plus the most recent drained ones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CameraCommandQueue {
    pending: VecDeque<CameraCommand>,
    history: VecDeque<CameraCommand>,
}

impl CameraCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: CameraCommand) {
        self.pending.push_back(command);
    }

    /// Removes every pending command in arrival order.
    pub fn drain_frame(&mut self) -> Vec<CameraCommand> {
        let drained: Vec<CameraCommand> = self.pending.drain(..).collect();
        self.history.extend(drained.iter().copied());
        let overflow = self.history.len().saturating_sub(HISTORY_LIMIT);
        self.history.drain(..overflow);
        drained
    }

    pub fn peek(&self) -> Option<&CameraCommand> {
        self.pending.front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Oldest first, at most `HISTORY_LIMIT` entries.
    pub fn history(&self) -> &VecDeque<CameraCommand> {
        &self.history
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
