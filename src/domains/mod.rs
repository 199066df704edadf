//! Lorenz dynamics and the integrators that advance them.
//!
//! - [`lorenz`]: parameters, vector field, and fixed-point analytics
//! - [`integrator`]: RK4 (default) and Euler stepping rules

pub mod integrator;
pub mod lorenz;

pub use integrator::{EulerIntegrator, Integrator, IntegratorMethod, Rk4Integrator};
pub use lorenz::{derivative, LorenzParameters};
