//! Core engine.
//!
//! Implements the incremental simulation loop with:
//! - Phase-space state and timestamped points
//! - A fixed-step clock deriving time from the step count
//! - Deterministic RNG (PCG with partitioned seeds) for perturbations
//! - The [`Simulation`] session itself

pub mod clock;
pub mod rng;
pub mod simulation;
pub mod state;

pub use clock::StepClock;
pub use rng::SimRng;
pub use simulation::{Phase, Simulation, SimulationBuilder, DEFAULT_DT, DEFAULT_EPSILON};
pub use state::{State, TrajectoryPoint};
