/// Cyclic animation state driving the slab's depth oscillation
use std::f64::consts::TAU;

/// Phase advance per elapsed millisecond (one cycle every 10 seconds)
pub const PHASE_RATE_PER_MS: f64 = 0.0001;

/// Normalized animation phase in [0, 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    phase: f64,
    rate: f64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::with_rate(PHASE_RATE_PER_MS)
    }

    pub fn with_rate(rate: f64) -> Self {
        Self { phase: 0.0, rate }
    }

    /// Start from an arbitrary phase, wrapped into [0, 1)
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = wrap_phase(phase);
        self
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Advance by `elapsed_ms`. Negative or non-finite values are ignored.
    pub fn advance(&mut self, elapsed_ms: f64) {
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            return;
        }
        self.phase = wrap_phase(self.phase + self.rate * elapsed_ms);
    }

    /// Slab translation along Z for the current phase
    pub fn depth_offset(&self) -> f32 {
        -(TAU * self.phase).sin() as f32
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
