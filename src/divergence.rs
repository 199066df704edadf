//! Sensitivity to initial conditions.
//!
//! Two runs with identical parameters and timestep whose initial states
//! differ by a tiny offset are compared index by index. Because integration
//! is deterministic, any separation that develops comes from the initial
//! offset alone.
//!
//! # Example
//!
//! ```rust
//! use lorenz_engine::prelude::*;
//! use lorenz_engine::divergence::paired_run;
//!
//! let report = paired_run(
//!     State::DEFAULT_INITIAL,
//!     State::new(1e-5, 0.0, 0.0),
//!     0.01,
//!     5000,
//!     &LorenzParameters::STANDARD,
//! )
//! .expect("valid dt");
//! assert!(report.final_max_component_distance() > 5.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::domains::lorenz::LorenzParameters;
use crate::engine::state::State;
use crate::error::{LorenzError, LorenzResult};
use crate::trajectory::{generate, Trajectory};

/// Separation between two trajectories at one time index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationSample {
    /// Time index.
    pub index: usize,
    /// Simulation time of the reference trajectory at this index.
    pub t: f64,
    /// Euclidean distance.
    pub distance: f64,
    /// Largest absolute componentwise difference.
    pub max_component: f64,
}

/// Index-by-index comparison of two trajectories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceReport {
    samples: Vec<SeparationSample>,
}

impl DivergenceReport {
    /// Compare `reference` and `other` over their common length.
    #[must_use]
    pub fn compare(reference: &Trajectory, other: &Trajectory) -> Self {
        let samples = reference
            .iter()
            .zip(other.iter())
            .enumerate()
            .map(|(index, (a, b))| SeparationSample {
                index,
                t: a.t,
                distance: a.state.distance(&b.state),
                max_component: a.state.max_component_distance(&b.state),
            })
            .collect();
        Self { samples }
    }

    /// Per-index samples.
    #[must_use]
    pub fn samples(&self) -> &[SeparationSample] {
        &self.samples
    }

    /// Number of compared indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if nothing was compared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Euclidean separation series.
    #[must_use]
    pub fn distances(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.distance).collect()
    }

    /// Separation at the last compared index.
    #[must_use]
    pub fn final_separation(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.distance)
    }

    /// Max componentwise distance at the last compared index.
    #[must_use]
    pub fn final_max_component_distance(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.max_component)
    }

    /// Largest Euclidean separation over the run.
    #[must_use]
    pub fn max_separation(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.distance)
            .fold(0.0, f64::max)
    }

    /// First sample whose Euclidean separation exceeds `threshold`.
    #[must_use]
    pub fn first_exceeding(&self, threshold: f64) -> Option<&SeparationSample> {
        self.samples.iter().find(|s| s.distance > threshold)
    }

    /// Average exponential growth rate of the separation,
    /// `ln(d_end / d_0) / (t_end − t_0)`, measured up to the first index
    /// where separation exceeds `saturation` (or the end of the run).
    ///
    /// A rough finite-time Lyapunov estimate; returns `None` if the initial
    /// separation is zero or no time elapses.
    #[must_use]
    pub fn growth_rate(&self, saturation: f64) -> Option<f64> {
        let first = self.samples.first()?;
        let end = self
            .samples
            .iter()
            .find(|s| s.distance > saturation)
            .or_else(|| self.samples.last())?;

        let elapsed = end.t - first.t;
        if first.distance <= 0.0 || elapsed <= 0.0 {
            return None;
        }
        Some((end.distance / first.distance).ln() / elapsed)
    }
}

/// Generate two trajectories, `initial` and `initial + offset`, and compare
/// them.
///
/// The two batch runs share no state and are generated on separate threads.
///
/// # Errors
///
/// Returns error if `dt` is not finite and strictly positive.
pub fn paired_run(
    initial: State,
    offset: State,
    dt: f64,
    steps: usize,
    params: &LorenzParameters,
) -> LorenzResult<DivergenceReport> {
    let shifted = initial + offset;
    let (reference, perturbed) = std::thread::scope(|scope| {
        let handle = scope.spawn(|| generate(shifted, dt, steps, params));
        let reference = generate(initial, dt, steps, params);
        let perturbed = handle
            .join()
            .map_err(|_| LorenzError::config("divergence worker panicked"));
        (reference, perturbed)
    });
    let reference = reference?;
    let perturbed = perturbed??;

    let report = DivergenceReport::compare(&reference, &perturbed);
    tracing::debug!(
        steps,
        offset = %offset,
        final_separation = report.final_separation(),
        "paired run compared"
    );
    Ok(report)
}
