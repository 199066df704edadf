//! Trajectories and batch generation.
//!
//! A [`Trajectory`] is an ordered, chronological sequence of
//! [`TrajectoryPoint`]s. [`generate`] produces one in a single call:
//! `steps + 1` points, the first being the initial condition and each
//! subsequent point exactly one integration step after its predecessor.
//!
//! # Example
//!
//! ```rust
//! use lorenz_engine::prelude::*;
//!
//! let traj = generate(State::DEFAULT_INITIAL, 0.01, 100, &LorenzParameters::STANDARD)
//!     .expect("valid dt");
//! assert_eq!(traj.len(), 101);
//! assert_eq!(traj.first().map(|p| p.state), Some(State::DEFAULT_INITIAL));
//! ```

pub mod history;

use serde::{Deserialize, Serialize};

use crate::domains::integrator::{Integrator, IntegratorMethod};
use crate::domains::lorenz::LorenzParameters;
use crate::engine::clock::StepClock;
use crate::engine::state::{State, TrajectoryPoint};
use crate::error::LorenzResult;

pub use history::{HistoryBuffer, HistoryPolicy};

/// Generate `steps + 1` points from `initial` using RK4.
///
/// # Errors
///
/// Returns [`crate::LorenzError::InvalidTimestep`] if `dt` is not finite
/// and strictly positive. A non-finite `initial` is accepted and yields a
/// non-finite trajectory.
pub fn generate(
    initial: State,
    dt: f64,
    steps: usize,
    params: &LorenzParameters,
) -> LorenzResult<Trajectory> {
    generate_with(IntegratorMethod::Rk4, initial, dt, steps, params)
}

/// Generate `steps + 1` points from `initial` using the given method.
///
/// # Errors
///
/// Returns [`crate::LorenzError::InvalidTimestep`] if `dt` is not finite
/// and strictly positive.
pub fn generate_with(
    method: IntegratorMethod,
    initial: State,
    dt: f64,
    steps: usize,
    params: &LorenzParameters,
) -> LorenzResult<Trajectory> {
    let mut clock = StepClock::new(dt)?;

    let mut points = Vec::with_capacity(steps.saturating_add(1));
    let mut state = initial;
    points.push(TrajectoryPoint::new(state, clock.current_time()));

    for _ in 0..steps {
        state = method.step(&state, params, dt);
        let t = clock.tick();
        points.push(TrajectoryPoint::new(state, t));
    }

    tracing::trace!(steps, dt, method = %method, "generated trajectory");
    Ok(Trajectory { points })
}

/// Ordered sequence of trajectory points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

/// Axis-aligned bounding box of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Componentwise minimum.
    pub min: State,
    /// Componentwise maximum.
    pub max: State,
}

impl Bounds {
    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn padded(&self, margin: f64) -> Self {
        let pad = State::new(margin, margin, margin);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }
}

impl Trajectory {
    /// Wrap an existing point sequence.
    ///
    /// The caller is responsible for chronological ordering.
    #[must_use]
    pub fn from_points(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the trajectory has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First (oldest) point.
    #[must_use]
    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    /// Last (most recent) point.
    #[must_use]
    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Point at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrajectoryPoint> {
        self.points.get(index)
    }

    /// All points as a slice.
    #[must_use]
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    /// Consume into the underlying points.
    #[must_use]
    pub fn into_points(self) -> Vec<TrajectoryPoint> {
        self.points
    }

    /// Iterate over points.
    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryPoint> {
        self.points.iter()
    }

    /// Iterate over states.
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        self.points.iter().map(|p| p.state)
    }

    /// Time stamps.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.t).collect()
    }

    /// X column.
    #[must_use]
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state.x).collect()
    }

    /// Y column.
    #[must_use]
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state.y).collect()
    }

    /// Z column.
    #[must_use]
    pub fn zs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state.z).collect()
    }

    /// Flow speed `|f(s)|` at every point, for colour mapping.
    #[must_use]
    pub fn speeds(&self, params: &LorenzParameters) -> Vec<f64> {
        self.points.iter().map(|p| params.speed(&p.state)).collect()
    }

    /// The last `n` points (all of them if `n >= len`).
    #[must_use]
    pub fn tail(&self, n: usize) -> &[TrajectoryPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Window of at most `n` points ending just before `end`.
    ///
    /// This is the "growing trail" a renderer draws at frame `end`.
    #[must_use]
    pub fn trail(&self, end: usize, n: usize) -> &[TrajectoryPoint] {
        let end = end.min(self.points.len());
        let start = end.saturating_sub(n);
        &self.points[start..end]
    }

    /// Every `stride`-th point, starting with the first.
    ///
    /// A stride of 0 is treated as 1.
    #[must_use]
    pub fn decimate(&self, stride: usize) -> Self {
        let stride = stride.max(1);
        Self {
            points: self.points.iter().step_by(stride).copied().collect(),
        }
    }

    /// Stride that maps this trajectory onto `frames` output frames.
    ///
    /// `max(1, len / frames)`: long trajectories are sped up, short ones are
    /// shown point by point.
    #[must_use]
    pub fn frame_stride(&self, frames: usize) -> usize {
        (self.points.len() / frames.max(1)).max(1)
    }

    /// Componentwise bounding box, ignoring non-finite points.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut finite = self.states().filter(State::is_finite);
        let first = finite.next()?;
        let bounds = finite.fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, s| Bounds {
                min: State::new(b.min.x.min(s.x), b.min.y.min(s.y), b.min.z.min(s.z)),
                max: State::new(b.max.x.max(s.x), b.max.y.max(s.y), b.max.z.max(s.z)),
            },
        );
        Some(bounds)
    }

    /// Index of the first point with a non-finite component, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.points.iter().position(|p| !p.state.is_finite())
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl IntoIterator for Trajectory {
    type Item = TrajectoryPoint;
    type IntoIter = std::vec::IntoIter<TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl std::ops::Index<usize> for Trajectory {
    type Output = TrajectoryPoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}
