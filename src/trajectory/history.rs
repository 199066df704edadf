//! Bounded trajectory history.
//!
//! The incremental engine appends one point per sub-step. Under
//! [`HistoryPolicy::Bounded`] the oldest points are evicted so that at most
//! `M` remain; callers that need the full run select
//! [`HistoryPolicy::Unbounded`].

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::engine::state::TrajectoryPoint;
use crate::error::{LorenzError, LorenzResult};
use crate::trajectory::Trajectory;

/// Retention policy for incremental history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Keep only the most recent `M` points.
    Bounded(NonZeroUsize),
    /// Keep every point.
    Unbounded,
}

impl HistoryPolicy {
    /// Default retained length for live views.
    pub const DEFAULT_MAX_POINTS: usize = 10_000;

    /// Bounded policy keeping `max_points` points.
    ///
    /// # Errors
    ///
    /// Returns error if `max_points` is zero.
    pub fn bounded(max_points: usize) -> LorenzResult<Self> {
        NonZeroUsize::new(max_points)
            .map(Self::Bounded)
            .ok_or_else(|| LorenzError::config("history must retain at least one point"))
    }

    /// Maximum retained length, if bounded.
    #[must_use]
    pub const fn max_points(&self) -> Option<usize> {
        match self {
            Self::Bounded(m) => Some(m.get()),
            Self::Unbounded => None,
        }
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self::Bounded(
            NonZeroUsize::new(Self::DEFAULT_MAX_POINTS).unwrap_or(NonZeroUsize::MIN),
        )
    }
}

/// Append-only point buffer with keep-most-recent eviction.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<TrajectoryPoint>,
    policy: HistoryPolicy,
    /// Points evicted since the last reset.
    evicted: u64,
}

impl HistoryBuffer {
    /// Create a buffer holding only `initial`.
    #[must_use]
    pub fn new(initial: TrajectoryPoint, policy: HistoryPolicy) -> Self {
        let mut points = VecDeque::with_capacity(initial_capacity(policy));
        points.push_back(initial);
        Self {
            points,
            policy,
            evicted: 0,
        }
    }

    /// Discard all points and start again from `initial`.
    pub fn reset(&mut self, initial: TrajectoryPoint) {
        self.points.clear();
        self.points.push_back(initial);
        self.evicted = 0;
    }

    /// Append a point, evicting the oldest if the bound is exceeded.
    ///
    /// Returns the number of points evicted by this call.
    pub fn push(&mut self, point: TrajectoryPoint) -> usize {
        self.points.push_back(point);
        self.enforce_bound()
    }

    fn enforce_bound(&mut self) -> usize {
        let Some(max) = self.policy.max_points() else {
            return 0;
        };
        let excess = self.points.len().saturating_sub(max);
        if excess > 0 {
            self.points.drain(..excess);
            self.evicted += excess as u64;
        }
        excess
    }

    /// Retention policy.
    #[must_use]
    pub const fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Number of retained points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: the buffer holds at least the reset point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent point.
    #[must_use]
    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.back()
    }

    /// Oldest retained point.
    #[must_use]
    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.front()
    }

    /// Points evicted since the last reset.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, TrajectoryPoint> {
        self.points.iter()
    }

    /// Owned copy as a [`Trajectory`].
    #[must_use]
    pub fn to_trajectory(&self) -> Trajectory {
        Trajectory::from_points(self.points.iter().copied().collect())
    }
}

fn initial_capacity(policy: HistoryPolicy) -> usize {
    // Bounded buffers reach their cap quickly in live views; avoid regrowth.
    policy.max_points().map_or(64, |m| m.min(HistoryPolicy::DEFAULT_MAX_POINTS))
}
