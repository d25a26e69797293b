use std::time::Duration;

/// Default ceiling on one frame's simulated step, in seconds.
pub const DEFAULT_MAX_STEP: f64 = 0.05;

/// Errors from clock configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    #[error("max step must be positive and finite, got {0}")]
    InvalidMaxStep(f64),
}

/// Monotonic simulation clock fed by wall-clock frame deltas.
///
/// Each raw delta is clamped to `max_step`, so a long stall (a backgrounded
/// window, a debugger pause) shows up as one short step instead of a jump.
/// Time is kept in `f64`; thousands of 16 ms steps accumulate without visible drift.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_step: f64,
    simulation_time: f64,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            max_step: DEFAULT_MAX_STEP,
            simulation_time: 0.0,
            frames: 0,
        }
    }
}

impl FrameClock {
    pub fn new(max_step: f64) -> Result<Self, ClockError> {
        if !(max_step.is_finite() && max_step > 0.0) {
            return Err(ClockError::InvalidMaxStep(max_step));
        }
        Ok(Self {
            max_step,
            ..Self::default()
        })
    }

    /// Advance by `raw_delta` seconds, clamped to `[0, max_step]`.
    /// Returns the step actually taken. Negative or NaN deltas count as zero.
    pub fn advance(&mut self, raw_delta: f64) -> f64 {
        let step = if raw_delta > 0.0 {
            raw_delta.min(self.max_step)
        } else {
            0.0
        };
        self.simulation_time += step;
        self.frames += 1;
        step
    }

    /// [`FrameClock::advance`] for a measured frame duration.
    pub fn advance_duration(&mut self, elapsed: Duration) -> f64 {
        self.advance(elapsed.as_secs_f64())
    }

    /// Accumulated simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.simulation_time
    }

    /// Number of `advance` calls since creation or the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Back to time zero. Only explicit scene reinitialisation calls this.
    pub fn reset(&mut self) {
        self.simulation_time = 0.0;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_pause_is_clamped() {
        let mut clock = FrameClock::new(0.05).unwrap();
        assert_eq!(clock.advance(1000.0), 0.05);
        assert_eq!(clock.time(), 0.05);
    }

    #[test]
    fn small_steps_pass_through() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(0.016), 0.016);
    }

    #[test]
    fn thousand_frames_accumulate_without_drift() {
        let mut clock = FrameClock::new(0.05).unwrap();
        let mut last = clock.time();
        for _ in 0..1000 {
            clock.advance(0.016);
            assert!(clock.time() >= last);
            last = clock.time();
        }
        assert!((clock.time() - 16.0).abs() < 1e-6);
        assert_eq!(clock.frames(), 1000);
    }

    #[test]
    fn negative_and_nan_deltas_do_not_rewind() {
        let mut clock = FrameClock::default();
        clock.advance(0.02);
        assert_eq!(clock.advance(-5.0), 0.0);
        assert_eq!(clock.advance(f64::NAN), 0.0);
        assert_eq!(clock.time(), 0.02);
    }

    #[test]
    fn invalid_max_step_is_rejected() {
        assert_eq!(FrameClock::new(0.0).unwrap_err(), ClockError::InvalidMaxStep(0.0));
        assert!(FrameClock::new(-1.0).is_err());
        assert!(FrameClock::new(f64::INFINITY).is_err());
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut clock = FrameClock::default();
        clock.advance_duration(Duration::from_millis(30));
        assert!(clock.time() > 0.0);
        clock.reset();
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.frames(), 0);
    }

    #[test]
    fn duration_is_clamped_too() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance_duration(Duration::from_secs(10)), DEFAULT_MAX_STEP);
    }
}
