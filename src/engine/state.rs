//! Phase-space state.
//!
//! A [`State`] is a point `(x, y, z)` in the Lorenz phase space. It has no
//! identity beyond its value. A [`TrajectoryPoint`] pairs a state with the
//! elapsed simulation time at which it was reached.

use serde::{Deserialize, Serialize};

/// Point in the 3-dimensional Lorenz phase space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    /// Convection rate.
    pub x: f64,
    /// Horizontal temperature variation.
    pub y: f64,
    /// Vertical temperature gradient.
    pub z: f64,
}

impl State {
    /// Conventional initial condition `(0.1, 0, 0)`.
    pub const DEFAULT_INITIAL: Self = Self::new(0.1, 0.0, 0.0);

    /// Create a new state.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin, an equilibrium of the Lorenz system for every parameter set.
    #[must_use]
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Components as an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another state.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    /// Largest absolute componentwise difference (L∞ distance).
    #[must_use]
    pub fn max_component_distance(&self, other: &Self) -> f64 {
        let d = *self - *other;
        d.x.abs().max(d.y.abs()).max(d.z.abs())
    }

    /// Scale by scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<(f64, f64, f64)> for State {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for State {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl std::ops::Add for State {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for State {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::Mul<f64> for State {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

/// A state together with the simulation time at which it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Phase-space position.
    pub state: State,
    /// Elapsed simulation time.
    pub t: f64,
}

impl TrajectoryPoint {
    /// Create a new trajectory point.
    #[must_use]
    pub const fn new(state: State, t: f64) -> Self {
        Self { state, t }
    }

    /// Flatten into `(x, y, z, t)`.
    #[must_use]
    pub const fn to_tuple(self) -> (f64, f64, f64, f64) {
        (self.state.x, self.state.y, self.state.z, self.t)
    }
}
