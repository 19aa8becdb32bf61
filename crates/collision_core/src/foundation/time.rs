//! Time management utilities

/// Fixed-step accumulator for physics updates
///
/// Frame time is accumulated and consumed in whole `step` increments, so the
/// simulation advances identically regardless of render frame rate. At most
/// `max_steps` are produced per frame; excess time is dropped to avoid a
/// spiral of ever longer frames.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_steps: u32,
    accumulator: f32,
    total_steps: u64,
}

impl FixedTimestep {
    /// Create a new accumulator with the given step length in seconds
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step: step.max(f32::EPSILON),
            max_steps: max_steps.max(1),
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Add frame time and return how many fixed steps should run now
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if steps == self.max_steps && self.accumulator >= self.step {
            log::debug!(
                "FixedTimestep: dropping {:.4}s of accumulated time",
                self.accumulator
            );
            self.accumulator %= self.step;
        }

        self.total_steps += u64::from(steps);
        steps
    }

    /// Length of one fixed step in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Interpolation factor between the last two fixed steps (0..1)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Total number of fixed steps produced so far
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 8)
    }
}
