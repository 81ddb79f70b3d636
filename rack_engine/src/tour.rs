//! Guided tour timer. Frame-driven: the scene feeds it `dt` every frame, so
//! the timer lives exactly as long as the sequencer value and nothing can
//! fire after `stop` or after the scene is dropped.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "index", rename_all = "snake_case")]
pub enum TourTick {
    Inactive,
    Holding(usize),
    Advanced(usize),
    /// The last item's dwell elapsed; the tour stopped and rewound to 0.
    Finished,
}

#[derive(Debug, Clone)]
pub struct TourSequencer {
    active: bool,
    index: usize,
    elapsed: f32,
    dwell: f32,
    completed_passes: u32,
}

impl TourSequencer {
    pub fn new(dwell_seconds: f32) -> Self {
        Self {
            active: false,
            index: 0,
            elapsed: 0.0,
            dwell: dwell_seconds,
            completed_passes: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn dwell(&self) -> f32 {
        self.dwell
    }

    pub fn completed_passes(&self) -> u32 {
        self.completed_passes
    }

    /// Arms the timer at index 0. Refused for an empty list.
    pub fn start(&mut self, len: usize) -> bool {
        if len == 0 {
            log::debug!("tour refused: rack has no equipment");
            return false;
        }
        self.active = true;
        self.index = 0;
        self.elapsed = 0.0;
        true
    }

    /// Cancels the timer and rewinds to the first item.
    pub fn stop(&mut self) {
        self.active = false;
        self.index = 0;
        self.elapsed = 0.0;
    }

    /// Advances the dwell timer. At most one step is taken per call so a
    /// long frame cannot skip items.
    pub fn tick(&mut self, dt: f32, len: usize) -> TourTick {
        if !self.active {
            return TourTick::Inactive;
        }
        if len == 0 {
            self.stop();
            return TourTick::Finished;
        }
        if self.index >= len {
            self.index = len - 1;
        }

        self.elapsed += dt.max(0.0);
        if self.elapsed < self.dwell {
            return TourTick::Holding(self.index);
        }
        self.elapsed = 0.0;

        if self.index + 1 >= len {
            self.stop();
            self.completed_passes += 1;
            TourTick::Finished
        } else {
            self.index += 1;
            TourTick::Advanced(self.index)
        }
    }
}
