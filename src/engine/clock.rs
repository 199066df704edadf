//! Fixed-step simulation clock.
//!
//! Time is derived from the step counter (`t = step_count * dt`) rather than
//! accumulated, so batch and incremental runs stamp identical times and long
//! runs do not pick up summation drift.

use serde::{Deserialize, Serialize};

use crate::error::{check_timestep, LorenzResult};

/// Simulation clock with a fixed timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepClock {
    /// Timestep in simulation time units.
    dt: f64,
    /// Number of steps taken since the last reset.
    step_count: u64,
}

impl StepClock {
    /// Create a new clock with the given timestep.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` is not finite and strictly positive.
    pub fn new(dt: f64) -> LorenzResult<Self> {
        check_timestep(dt)?;
        Ok(Self { dt, step_count: 0 })
    }

    /// Get timestep.
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Get number of steps taken.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Current simulation time.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.time_at(self.step_count)
    }

    /// Simulation time after `step` steps.
    #[must_use]
    pub fn time_at(&self, step: u64) -> f64 {
        self.dt * step as f64
    }

    /// Advance clock by one timestep, returning the new time.
    pub fn tick(&mut self) -> f64 {
        self.step_count += 1;
        self.current_time()
    }

    /// Reset clock to zero.
    pub fn reset(&mut self) {
        self.step_count = 0;
    }

    /// Number of steps needed to reach `target` time, rounding up.
    #[must_use]
    pub fn steps_until(&self, target: f64) -> u64 {
        let remaining = target - self.current_time();
        if remaining <= 0.0 || !remaining.is_finite() {
            return 0;
        }
        (remaining / self.dt).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_creation() {
        let clock = StepClock::new(0.01).expect("valid dt");
        assert_eq!(clock.step_count(), 0);
        assert!(clock.current_time().abs() < f64::EPSILON);
        assert!((clock.dt() - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clock_rejects_bad_dt() {
        assert!(StepClock::new(0.0).is_err());
        assert!(StepClock::new(-1.0).is_err());
        assert!(StepClock::new(f64::NAN).is_err());
    }

    #[test]
    fn test_clock_tick() {
        let mut clock = StepClock::new(0.5).expect("valid dt");
        assert!((clock.tick() - 0.5).abs() < f64::EPSILON);
        assert!((clock.tick() - 1.0).abs() < f64::EPSILON);
        assert_eq!(clock.step_count(), 2);
    }

    #[test]
    fn test_time_is_not_accumulated() {
        let mut clock = StepClock::new(0.1).expect("valid dt");
        for _ in 0..1000 {
            clock.tick();
        }
        assert_eq!(clock.current_time().to_bits(), (0.1_f64 * 1000.0).to_bits());
    }

    #[test]
    fn test_clock_reset() {
        let mut clock = StepClock::new(0.01).expect("valid dt");
        clock.tick();
        clock.tick();
        clock.reset();
        assert_eq!(clock.step_count(), 0);
        assert!(clock.current_time().abs() < f64::EPSILON);
    }

    #[test]
    fn test_steps_until() {
        let clock = StepClock::new(0.01).expect("valid dt");
        assert_eq!(clock.steps_until(1.0), 100);
        assert_eq!(clock.steps_until(0.015), 2);
        assert_eq!(clock.steps_until(-1.0), 0);
    }
}
