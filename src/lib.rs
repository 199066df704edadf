//! # lorenz-engine
//!
//! Deterministic trajectory engine for the Lorenz system.
//!
//! Provides:
//! - Batch generation of fixed-step RK4 trajectories
//! - An incremental [`Simulation`] with bounded history and seeded
//!   perturbation
//! - Divergence reports comparing nearby runs
//! - Background export of trajectory snapshots
//!
//! ## Example
//!
//! ```rust
//! use lorenz_engine::prelude::*;
//!
//! let traj = generate(State::DEFAULT_INITIAL, 0.01, 1000, &LorenzParameters::STANDARD)
//!     .expect("dt > 0");
//! assert_eq!(traj.len(), 1001);
//!
//! let mut sim = Simulation::builder().seed(42).build().expect("valid config");
//! sim.advance(1000).expect("k > 0");
//! assert_eq!(sim.snapshot(), traj);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Integrator arithmetic mirrors the RK4 formula
    clippy::imprecise_flops,
    clippy::many_single_char_names,
    clippy::missing_const_for_fn,
)]

pub mod config;
pub mod divergence;
pub mod domains;
pub mod engine;
pub mod error;
pub mod export;
pub mod trajectory;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{EngineConfig, EngineConfigBuilder};
    pub use crate::divergence::{paired_run, DivergenceReport};
    pub use crate::domains::{Integrator, IntegratorMethod, LorenzParameters};
    pub use crate::engine::rng::SimRng;
    pub use crate::engine::{Phase, Simulation, SimulationBuilder, State, TrajectoryPoint};
    pub use crate::error::{LorenzError, LorenzResult};
    pub use crate::trajectory::{generate, generate_with, HistoryPolicy, Trajectory};
}

/// Re-export for public API
pub use engine::Simulation;
pub use error::{LorenzError, LorenzResult};
