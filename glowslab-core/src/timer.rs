/// Smoothed frame-time measurement over a fixed circular buffer
use crate::error::{GlowslabError, GlowslabResult};

/// Number of frame durations averaged for the readout
pub const FRAME_TIMER_CAPACITY: usize = 20;

/// Ring buffer of recent frame durations in milliseconds.
///
/// All slots start at zero and take part in the average from the first
/// sample on, so the reported rate ramps in over the first `capacity`
/// frames instead of jumping on a single measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTimer {
    samples: Vec<f64>,
    cursor: usize,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            samples: vec![0.0; FRAME_TIMER_CAPACITY],
            cursor: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> GlowslabResult<Self> {
        if capacity == 0 {
            return Err(GlowslabError::InvalidConfig(
                "frame timer capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            samples: vec![0.0; capacity],
            cursor: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Slot the next sample will overwrite
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn record_sample(&mut self, duration_ms: f64) {
        self.samples[self.cursor] = duration_ms;
        self.cursor = (self.cursor + 1) % self.samples.len();
    }

    /// Mean over every slot, including ones not yet written
    pub fn average_millis(&self) -> f64 {
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Frames per second as `"{:.2}fps"`, or `None` while the average is zero
    pub fn as_fps_string(&self) -> Option<String> {
        let average = self.average_millis();
        if average <= 0.0 || !average.is_finite() {
            return None;
        }
        Some(format!("{:.2}fps", 1000.0 / average))
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_buffer_of_constant_samples() {
        let mut timer = FrameTimer::new();
        for _ in 0..FRAME_TIMER_CAPACITY {
            timer.record_sample(16.0);
        }
        assert!((timer.average_millis() - 16.0).abs() < 1e-9);
        assert_eq!(timer.cursor(), 0);
    }

    #[test]
    fn test_unfilled_slots_bias_average_towards_zero() {
        let mut timer = FrameTimer::new();
        timer.record_sample(20.0);
        assert!((timer.average_millis() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_oldest_sample_is_overwritten() {
        let mut timer = FrameTimer::with_capacity(3).unwrap();
        for sample in [30.0, 30.0, 30.0, 60.0] {
            timer.record_sample(sample);
        }
        assert_eq!(timer.cursor(), 1);
        assert!((timer.average_millis() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_fps_string_formatting() {
        let mut timer = FrameTimer::new();
        for _ in 0..FRAME_TIMER_CAPACITY {
            timer.record_sample(1000.0);
        }
        assert_eq!(timer.as_fps_string().as_deref(), Some("1.00fps"));

        for _ in 0..FRAME_TIMER_CAPACITY {
            timer.record_sample(16.0);
        }
        assert_eq!(timer.as_fps_string().as_deref(), Some("62.50fps"));
    }

    #[test]
    fn test_fps_string_hidden_while_empty() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.as_fps_string(), None);
        timer.record_sample(0.0);
        assert_eq!(timer.as_fps_string(), None);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(FrameTimer::with_capacity(0).is_err());
    }
}
