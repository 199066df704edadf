//! Lorenz system definition.
//!
//! # Governing Equations
//!
//! ```text
//! dx/dt = σ(y − x)
//! dy/dt = x(ρ − z) − y
//! dz/dt = xy − βz
//! ```
//!
//! The system is defined everywhere on ℝ³, so the derivative has no error
//! conditions. Overflow for extreme inputs propagates as non-finite values.

use serde::{Deserialize, Serialize};

use crate::engine::state::State;

/// Parameters `(σ, ρ, β)` of the Lorenz system.
///
/// Immutable for the lifetime of a simulation run. The classical chaotic
/// regime is `σ = 10`, `ρ = 28`, `β = 8/3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzParameters {
    /// Prandtl number σ.
    pub sigma: f64,
    /// Rayleigh number ρ.
    pub rho: f64,
    /// Geometric factor β.
    pub beta: f64,
}

impl Default for LorenzParameters {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl LorenzParameters {
    /// Classical chaotic parameter set.
    pub const STANDARD: Self = Self {
        sigma: 10.0,
        rho: 28.0,
        beta: 8.0 / 3.0,
    };

    /// Create a parameter set.
    #[must_use]
    pub const fn new(sigma: f64, rho: f64, beta: f64) -> Self {
        Self { sigma, rho, beta }
    }

    /// Instantaneous rate of change at `state`.
    #[must_use]
    pub fn derivative(&self, state: &State) -> State {
        derivative(state, self)
    }

    /// Magnitude of the flow vector at `state`.
    ///
    /// Used by renderers as a proxy for turbulence intensity.
    #[must_use]
    pub fn speed(&self, state: &State) -> f64 {
        self.derivative(state).norm()
    }

    /// Phase-space volume contraction rate, `−(σ + 1 + β)`.
    ///
    /// Constant everywhere; negative for all physical parameter sets.
    #[must_use]
    pub fn divergence(&self) -> f64 {
        -(self.sigma + 1.0 + self.beta)
    }

    /// Equilibria of the system.
    ///
    /// The origin is always a fixed point. For `ρ > 1` the two convection
    /// rolls `C± = (±√(β(ρ−1)), ±√(β(ρ−1)), ρ−1)` are added.
    #[must_use]
    pub fn fixed_points(&self) -> Vec<State> {
        let mut points = vec![State::origin()];
        if self.rho > 1.0 {
            let c = (self.beta * (self.rho - 1.0)).sqrt();
            let z = self.rho - 1.0;
            points.push(State::new(c, c, z));
            points.push(State::new(-c, -c, z));
        }
        points
    }

    /// Check that every parameter is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.sigma.is_finite() && self.rho.is_finite() && self.beta.is_finite()
    }
}

/// Lorenz vector field evaluated at `state`.
#[must_use]
pub fn derivative(state: &State, params: &LorenzParameters) -> State {
    State {
        x: params.sigma * (state.y - state.x),
        y: state.x * (params.rho - state.z) - state.y,
        z: state.x * state.y - params.beta * state.z,
    }
}
