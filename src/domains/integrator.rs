//! Fixed-step integrators for the Lorenz system.
//!
//! - RK4 (4th order, default)
//! - Euler (1st order, kept for compatibility with plots that used it)
//!
//! Both are single-pass arithmetic. A step never fails: non-finite inputs
//! produce non-finite outputs, and detecting that is left to the caller.

use serde::{Deserialize, Serialize};

use crate::domains::lorenz::LorenzParameters;
use crate::engine::state::State;

/// Numerical integrator for the Lorenz vector field.
pub trait Integrator {
    /// Advance `state` by one timestep of size `dt`.
    fn step(&self, state: &State, params: &LorenzParameters, dt: f64) -> State;

    /// Global error order of this integrator.
    fn error_order(&self) -> u32;
}

/// Classical Runge-Kutta 4th order integrator.
///
/// Algorithm:
/// ```text
/// k1 = f(s)
/// k2 = f(s + dt/2 · k1)
/// k3 = f(s + dt/2 · k2)
/// k4 = f(s + dt · k3)
/// s_next = s + dt/6 · (k1 + 2k2 + 2k3 + k4)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4Integrator;

impl Rk4Integrator {
    /// Create a new RK4 integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for Rk4Integrator {
    fn step(&self, state: &State, params: &LorenzParameters, dt: f64) -> State {
        let half_dt = dt / 2.0;
        let sixth_dt = dt / 6.0;
        let s = *state;

        let k1 = params.derivative(&s);
        let k2 = params.derivative(&(s + k1 * half_dt));
        let k3 = params.derivative(&(s + k2 * half_dt));
        let k4 = params.derivative(&(s + k3 * dt));

        s + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * sixth_dt
    }

    fn error_order(&self) -> u32 {
        4
    }
}

/// Explicit Euler integrator (1st order).
///
/// `s_next = s + dt · f(s)`. Visibly less accurate than RK4 at the step
/// sizes used for plotting.
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerIntegrator;

impl EulerIntegrator {
    /// Create a new Euler integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for EulerIntegrator {
    fn step(&self, state: &State, params: &LorenzParameters, dt: f64) -> State {
        *state + params.derivative(state) * dt
    }

    fn error_order(&self) -> u32 {
        1
    }
}

/// Integration method selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorMethod {
    /// Runge-Kutta 4th order.
    #[default]
    Rk4,
    /// Explicit Euler.
    Euler,
}

impl IntegratorMethod {
    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rk4 => "rk4",
            Self::Euler => "euler",
        }
    }
}

impl Integrator for IntegratorMethod {
    fn step(&self, state: &State, params: &LorenzParameters, dt: f64) -> State {
        match self {
            Self::Rk4 => Rk4Integrator.step(state, params, dt),
            Self::Euler => EulerIntegrator.step(state, params, dt),
        }
    }

    fn error_order(&self) -> u32 {
        match self {
            Self::Rk4 => Rk4Integrator.error_order(),
            Self::Euler => EulerIntegrator.error_order(),
        }
    }
}

impl std::fmt::Display for IntegratorMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: LorenzParameters = LorenzParameters::STANDARD;

    #[test]
    fn test_rk4_origin_is_fixed() {
        let next = Rk4Integrator::new().step(&State::origin(), &P, 0.01);
        assert!(next.norm() < 1e-15);
    }

    #[test]
    fn test_rk4_fixed_point_stays_put() {
        let c_plus = P.fixed_points()[1];
        let next = Rk4Integrator::new().step(&c_plus, &P, 0.01);
        assert!(next.distance(&c_plus) < 1e-9);
    }

    #[test]
    fn test_rk4_matches_manual_stages() {
        let s = State::new(0.1, 0.0, 0.0);
        let dt = 0.01;
        let k1 = P.derivative(&s);
        let k2 = P.derivative(&(s + k1 * (dt / 2.0)));
        let k3 = P.derivative(&(s + k2 * (dt / 2.0)));
        let k4 = P.derivative(&(s + k3 * dt));
        let expected = s + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);

        assert_eq!(Rk4Integrator::new().step(&s, &P, dt), expected);
    }

    #[test]
    fn test_euler_single_step() {
        let s = State::new(1.0, 1.0, 1.0);
        let next = EulerIntegrator::new().step(&s, &P, 0.1);
        // f(s) = (0, 26, 1 − 8/3)
        assert!((next.x - 1.0).abs() < 1e-12);
        assert!((next.y - 3.6).abs() < 1e-12);
        assert!((next.z - (1.0 + 0.1 * (1.0 - 8.0 / 3.0))).abs() < 1e-12);
    }

    #[test]
    fn test_methods_agree_for_tiny_step() {
        let s = State::new(1.0, 2.0, 20.0);
        let dt = 1e-7;
        let a = IntegratorMethod::Rk4.step(&s, &P, dt);
        let b = IntegratorMethod::Euler.step(&s, &P, dt);
        assert!(a.distance(&b) < 1e-10);
    }

    #[test]
    fn test_methods_differ_for_large_step() {
        let s = State::new(1.0, 2.0, 20.0);
        let a = IntegratorMethod::Rk4.step(&s, &P, 0.05);
        let b = IntegratorMethod::Euler.step(&s, &P, 0.05);
        assert!(a.distance(&b) > 1e-3);
    }

    #[test]
    fn test_rk4_converges_faster_than_euler() {
        // Reference: RK4 with a very fine step over the same interval.
        let s0 = State::new(1.0, 1.0, 1.0);
        let horizon = 0.1;
        let fine_steps = 10_000;
        let mut reference = s0;
        for _ in 0..fine_steps {
            reference = Rk4Integrator.step(&reference, &P, horizon / f64::from(fine_steps));
        }

        let coarse_steps = 10;
        let dt = horizon / f64::from(coarse_steps);
        let (mut rk4, mut euler) = (s0, s0);
        for _ in 0..coarse_steps {
            rk4 = Rk4Integrator.step(&rk4, &P, dt);
            euler = EulerIntegrator.step(&euler, &P, dt);
        }

        assert!(rk4.distance(&reference) < euler.distance(&reference));
    }

    #[test]
    fn test_error_orders() {
        assert_eq!(IntegratorMethod::Rk4.error_order(), 4);
        assert_eq!(IntegratorMethod::Euler.error_order(), 1);
    }

    #[test]
    fn test_method_default_and_serde() {
        assert_eq!(IntegratorMethod::default(), IntegratorMethod::Rk4);
        let m: IntegratorMethod = serde_yaml::from_str("euler").expect("parse");
        assert_eq!(m, IntegratorMethod::Euler);
        assert_eq!(IntegratorMethod::Rk4.to_string(), "rk4");
    }

    #[test]
    fn test_nan_propagates() {
        let next = Rk4Integrator.step(&State::new(f64::NAN, 1.0, 1.0), &P, 0.01);
        assert!(!next.is_finite());
    }
}
