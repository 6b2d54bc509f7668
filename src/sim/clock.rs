//! Fixed timestep accumulator
//!
//! Converts variable frame times into a whole number of fixed ticks. Long
//! frames are clamped and capped so a stall never turns into a burst of
//! catch-up ticks.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};

#[derive(Debug, Clone)]
pub struct FixedStepClock {
    accumulator: f32,
    fixed_dt: f32,
    max_substeps: u32,
    paused: bool,
}

impl FixedStepClock {
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt,
            max_substeps: MAX_SUBSTEPS,
            paused: false,
        }
    }

    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps.max(1);
        self
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Time carried over to the next frame
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Feed one frame's elapsed time; returns how many ticks to run
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if self.paused || !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }

        self.accumulator += frame_dt.min(MAX_FRAME_DT);

        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_substeps {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }

        if self.accumulator >= self.fixed_dt {
            log::warn!(
                "Simulation falling behind, dropping {:.3}s after {} substeps",
                self.accumulator,
                ticks
            );
            self.accumulator %= self.fixed_dt;
        }
        ticks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Simulation paused");
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            log::info!("Simulation resumed");
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}
