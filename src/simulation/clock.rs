//! Simulation clock

/// Elapsed simulated seconds, bounded by the run horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    elapsed: u32,
    horizon: u32,
}

impl SimClock {
    pub fn new(horizon: u32) -> Self {
        Self {
            elapsed: 0,
            horizon,
        }
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.horizon
    }

    /// Count one second; returns true once the horizon is reached
    pub fn tick(&mut self) -> bool {
        if !self.is_finished() {
            self.elapsed += 1;
        }
        self.is_finished()
    }
}
