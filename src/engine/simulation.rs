//! Incremental simulation handle.
//!
//! A [`Simulation`] owns a running Lorenz trajectory: the current state and
//! time, the parameters, the timestep, a bounded history buffer, and a
//! seeded RNG for perturbations. It is advanced in place and is never
//! shared implicitly; concurrent owners must serialize access themselves.
//!
//! # Lifecycle
//!
//! ```text
//!   new / reset / perturb ──► Idle ──advance──► Running ──advance──► Running
//!          ▲                                        │
//!          └────────────── reset / perturb ─────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::domains::integrator::{Integrator, IntegratorMethod};
use crate::domains::lorenz::LorenzParameters;
use crate::engine::clock::StepClock;
use crate::engine::rng::SimRng;
use crate::engine::state::{State, TrajectoryPoint};
use crate::error::{LorenzError, LorenzResult};
use crate::trajectory::{HistoryBuffer, HistoryPolicy, Trajectory};

/// Default timestep for interactive runs.
pub const DEFAULT_DT: f64 = 0.01;

/// Default perturbation magnitude.
pub const DEFAULT_EPSILON: f64 = 1e-2;

/// Lifecycle phase of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Just created, reset, or perturbed; history holds one point.
    Idle,
    /// Advanced at least once since the last reset.
    Running,
}

/// Stateful, incrementally advanced Lorenz trajectory.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: LorenzParameters,
    method: IntegratorMethod,
    clock: StepClock,
    state: State,
    history: HistoryBuffer,
    rng: SimRng,
    epsilon: f64,
    phase: Phase,
}

impl Simulation {
    /// Create a simulation at `initial` with the standard parameters, RK4,
    /// and the default bounded history.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` is not finite and strictly positive.
    pub fn new(initial: State, dt: f64) -> LorenzResult<Self> {
        Self::builder().initial_state(initial).dt(dt).build()
    }

    /// Start configuring a simulation.
    #[must_use]
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    /// Create a simulation from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration holds an invalid timestep,
    /// history bound or perturbation epsilon.
    pub fn from_config(config: &EngineConfig) -> LorenzResult<Self> {
        Self::builder()
            .parameters(config.parameters)
            .method(config.integration.method)
            .dt(config.integration.dt)
            .initial_state(config.initial_state)
            .history(config.history.policy()?)
            .epsilon(config.perturbation.epsilon)
            .seed(config.reproducibility.seed)
            .build()
    }

    /// Discard all history and restart from `(x0, y0, z0)` at time 0.
    pub fn reset(&mut self, x0: f64, y0: f64, z0: f64) {
        self.reset_to(State::new(x0, y0, z0));
    }

    /// Discard all history and restart from `initial` at time 0.
    pub fn reset_to(&mut self, initial: State) {
        self.clock.reset();
        self.state = initial;
        self.history
            .reset(TrajectoryPoint::new(initial, self.clock.current_time()));
        self.phase = Phase::Idle;
        tracing::debug!(initial = %initial, "simulation reset");
    }

    /// Perform `k` integration sub-steps, appending each result.
    ///
    /// Under a bounded history policy the oldest points are evicted so that
    /// at most `M` remain.
    ///
    /// # Errors
    ///
    /// Returns [`LorenzError::InvalidStepCount`] if `k` is zero. Validation
    /// happens before the first sub-step, so a rejected call leaves the
    /// handle untouched.
    pub fn advance(&mut self, k: usize) -> LorenzResult<()> {
        if k == 0 {
            return Err(LorenzError::InvalidStepCount { steps: k });
        }

        let dt = self.clock.dt();
        let mut evicted = 0;
        for _ in 0..k {
            self.state = self.method.step(&self.state, &self.params, dt);
            let t = self.clock.tick();
            evicted += self.history.push(TrajectoryPoint::new(self.state, t));
        }
        self.phase = Phase::Running;

        if evicted > 0 {
            tracing::trace!(evicted, retained = self.history.len(), "history trimmed");
        }
        Ok(())
    }

    /// Advance until the clock reaches `target`, rounding up to whole steps.
    ///
    /// Returns the number of sub-steps taken; a target at or before the
    /// current time takes none.
    ///
    /// # Errors
    ///
    /// Returns [`LorenzError::InvalidStepCount`] if the step count does not
    /// fit in `usize`.
    pub fn advance_to(&mut self, target: f64) -> LorenzResult<usize> {
        let needed = self.clock.steps_until(target);
        if needed == 0 {
            return Ok(0);
        }
        let k = usize::try_from(needed).map_err(|_| LorenzError::InvalidStepCount {
            steps: usize::MAX,
        })?;
        self.advance(k)?;
        Ok(k)
    }

    /// Restart from a random point near the last retained state.
    ///
    /// Each axis is offset independently by a uniform draw in
    /// `[-epsilon, +epsilon]`. History is discarded; the perturbed run is a
    /// fresh trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`LorenzError::InvalidPerturbation`] if `epsilon` is not
    /// finite and strictly positive.
    pub fn perturb(&mut self, epsilon: f64) -> LorenzResult<State> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(LorenzError::InvalidPerturbation { epsilon });
        }

        let base = self.history.last().map_or(self.state, |p| p.state);
        let perturbed = base + self.rng.gen_offset(epsilon);
        tracing::debug!(epsilon, from = %base, to = %perturbed, "perturbing simulation");
        self.reset_to(perturbed);
        Ok(perturbed)
    }

    /// [`perturb`](Self::perturb) with the configured epsilon.
    ///
    /// # Errors
    ///
    /// Never fails for a handle built through [`SimulationBuilder`], which
    /// validates the epsilon up front.
    pub fn perturb_default(&mut self) -> LorenzResult<State> {
        self.perturb(self.epsilon)
    }

    /// Independent copy of this handle.
    ///
    /// The copy keeps the state, clock and history but draws perturbations
    /// from a new RNG stream partitioned off this handle's generator, so the
    /// two handles can be perturbed without mirroring each other.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        let rng = self
            .rng
            .partition(1)
            .pop()
            .unwrap_or_else(|| self.rng.clone());
        tracing::debug!(stream = rng.stream(), "simulation forked");
        Self {
            rng,
            ..self.clone()
        }
    }

    /// Owned copy of the retained history for export collaborators.
    #[must_use]
    pub fn snapshot(&self) -> Trajectory {
        self.history.to_trajectory()
    }

    /// Retained history, oldest first.
    #[must_use]
    pub const fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Current state.
    #[must_use]
    pub const fn current_state(&self) -> State {
        self.state
    }

    /// Current simulation time.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    /// Sub-steps taken since the last reset.
    #[must_use]
    pub const fn steps_taken(&self) -> u64 {
        self.clock.step_count()
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// System parameters.
    #[must_use]
    pub const fn parameters(&self) -> &LorenzParameters {
        &self.params
    }

    /// Integration method.
    #[must_use]
    pub const fn method(&self) -> IntegratorMethod {
        self.method
    }

    /// Timestep.
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.clock.dt()
    }

    /// History retention policy.
    #[must_use]
    pub const fn history_policy(&self) -> HistoryPolicy {
        self.history.policy()
    }

    /// Points evicted since the last reset.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.history.evicted()
    }

    /// Default perturbation magnitude used by [`perturb_default`](Self::perturb_default).
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

/// Builder for [`Simulation`].
#[derive(Debug, Clone)]
pub struct SimulationBuilder {
    params: LorenzParameters,
    method: IntegratorMethod,
    dt: f64,
    initial: State,
    history: HistoryPolicy,
    epsilon: f64,
    seed: Option<u64>,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self {
            params: LorenzParameters::STANDARD,
            method: IntegratorMethod::Rk4,
            dt: DEFAULT_DT,
            initial: State::DEFAULT_INITIAL,
            history: HistoryPolicy::default(),
            epsilon: DEFAULT_EPSILON,
            seed: None,
        }
    }
}

impl SimulationBuilder {
    /// Set the system parameters.
    #[must_use]
    pub const fn parameters(mut self, params: LorenzParameters) -> Self {
        self.params = params;
        self
    }

    /// Set the integration method.
    #[must_use]
    pub const fn method(mut self, method: IntegratorMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the timestep.
    ///
    /// Any finite positive value is accepted; the `1.0` upper bound in
    /// [`EngineConfig`] applies to config files only.
    #[must_use]
    pub const fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set the initial state.
    #[must_use]
    pub const fn initial_state(mut self, initial: State) -> Self {
        self.initial = initial;
        self
    }

    /// Set the history retention policy.
    #[must_use]
    pub const fn history(mut self, policy: HistoryPolicy) -> Self {
        self.history = policy;
        self
    }

    /// Set the default perturbation magnitude.
    #[must_use]
    pub const fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Seed the perturbation RNG. Unseeded simulations draw from entropy.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the simulation.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` or `epsilon` is not finite and strictly
    /// positive.
    pub fn build(self) -> LorenzResult<Simulation> {
        let clock = StepClock::new(self.dt)?;
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(LorenzError::InvalidPerturbation {
                epsilon: self.epsilon,
            });
        }
        let rng = self.seed.map_or_else(SimRng::from_entropy, SimRng::new);
        let history = HistoryBuffer::new(
            TrajectoryPoint::new(self.initial, clock.current_time()),
            self.history,
        );

        tracing::debug!(
            dt = self.dt,
            method = %self.method,
            max_points = ?self.history.max_points(),
            seed = rng.master_seed(),
            "simulation created"
        );

        Ok(Simulation {
            params: self.params,
            method: self.method,
            clock,
            state: self.initial,
            history,
            rng,
            epsilon: self.epsilon,
            phase: Phase::Idle,
        })
    }
}
