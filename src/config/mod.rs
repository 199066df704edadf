//! Engine configuration with YAML loading and validation.
//!
//! Mistakes are caught before a simulation is built:
//! - Type-safe configuration structs (`serde`, unknown fields rejected)
//! - Range checks via `validator`
//! - Semantic validation (finite parameters and initial state)
//!
//! ```yaml
//! schema_version: "1.0"
//! parameters: { sigma: 10.0, rho: 28.0, beta: 2.6666666666666665 }
//! integration: { dt: 0.005, method: rk4 }
//! initial_state: { x: 0.1, y: 0.0, z: 0.0 }
//! history: { max_points: 10000 }
//! perturbation: { epsilon: 0.01 }
//! reproducibility: { seed: 42 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::domains::integrator::IntegratorMethod;
use crate::domains::lorenz::LorenzParameters;
use crate::engine::simulation::{DEFAULT_DT, DEFAULT_EPSILON};
use crate::engine::state::State;
use crate::error::{LorenzError, LorenzResult};
use crate::trajectory::HistoryPolicy;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Lorenz system parameters.
    #[serde(default)]
    pub parameters: LorenzParameters,

    /// Integration settings.
    #[validate(nested)]
    #[serde(default)]
    pub integration: IntegrationConfig,

    /// Initial condition.
    #[serde(default = "default_initial_state")]
    pub initial_state: State,

    /// History retention.
    #[validate(nested)]
    #[serde(default)]
    pub history: HistoryConfig,

    /// Perturbation settings.
    #[validate(nested)]
    #[serde(default)]
    pub perturbation: PerturbationConfig,

    /// Reproducibility settings.
    #[serde(default)]
    pub reproducibility: ReproducibilityConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

const fn default_initial_state() -> State {
    State::DEFAULT_INITIAL
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> LorenzResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        tracing::info!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> LorenzResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> LorenzResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Run schema and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn check(&self) -> LorenzResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Validate constraints that the schema cannot express.
    fn validate_semantic(&self) -> LorenzResult<()> {
        if !self.parameters.is_finite() {
            return Err(LorenzError::config("Lorenz parameters must be finite"));
        }

        if !self.integration.dt.is_finite() {
            return Err(LorenzError::config("Timestep must be finite"));
        }

        let epsilon = self.perturbation.epsilon;
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(LorenzError::config(format!(
                "Perturbation epsilon must be finite and positive, got {epsilon}"
            )));
        }

        if !self.initial_state.is_finite() {
            return Err(LorenzError::config(format!(
                "Initial state must be finite, got {}",
                self.initial_state
            )));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            parameters: LorenzParameters::STANDARD,
            integration: IntegrationConfig::default(),
            initial_state: default_initial_state(),
            history: HistoryConfig::default(),
            perturbation: PerturbationConfig::default(),
            reproducibility: ReproducibilityConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    parameters: Option<LorenzParameters>,
    dt: Option<f64>,
    method: Option<IntegratorMethod>,
    initial_state: Option<State>,
    max_points: Option<Option<usize>>,
    epsilon: Option<f64>,
    seed: Option<u64>,
}

impl EngineConfigBuilder {
    /// Set the Lorenz parameters.
    #[must_use]
    pub const fn parameters(mut self, parameters: LorenzParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set the timestep.
    #[must_use]
    pub const fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Set the integration method.
    #[must_use]
    pub const fn method(mut self, method: IntegratorMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the initial state.
    #[must_use]
    pub const fn initial_state(mut self, state: State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the history bound (`None` keeps full history).
    #[must_use]
    pub const fn max_points(mut self, max_points: Option<usize>) -> Self {
        self.max_points = Some(max_points);
        self
    }

    /// Set the default perturbation magnitude.
    #[must_use]
    pub const fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Values are not validated here; call [`EngineConfig::check`] or let
    /// [`crate::Simulation::from_config`] reject them.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        let mut config = EngineConfig::default();

        if let Some(parameters) = self.parameters {
            config.parameters = parameters;
        }
        if let Some(dt) = self.dt {
            config.integration.dt = dt;
        }
        if let Some(method) = self.method {
            config.integration.method = method;
        }
        if let Some(state) = self.initial_state {
            config.initial_state = state;
        }
        if let Some(max_points) = self.max_points {
            config.history.max_points = max_points;
        }
        if let Some(epsilon) = self.epsilon {
            config.perturbation.epsilon = epsilon;
        }
        if let Some(seed) = self.seed {
            config.reproducibility.seed = seed;
        }

        config
    }
}

/// Integration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Fixed timestep.
    ///
    /// Config files are held to `1e-9..=1.0`, a sanity bound for
    /// hand-edited files. Programmatic callers going through
    /// `SimulationBuilder::dt` or `generate` only need a finite positive dt.
    #[validate(range(min = 1e-9, max = 1.0))]
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Integration method.
    #[serde(default)]
    pub method: IntegratorMethod,
}

const fn default_dt() -> f64 {
    DEFAULT_DT
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            method: IntegratorMethod::Rk4,
        }
    }
}

/// History retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum retained points; `null` keeps the full history.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_points")]
    pub max_points: Option<usize>,
}

#[allow(clippy::unnecessary_wraps)]
const fn default_max_points() -> Option<usize> {
    Some(HistoryPolicy::DEFAULT_MAX_POINTS)
}

impl HistoryConfig {
    /// Resolve into a [`HistoryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns error if `max_points` is zero.
    pub fn policy(&self) -> LorenzResult<HistoryPolicy> {
        self.max_points
            .map_or(Ok(HistoryPolicy::Unbounded), HistoryPolicy::bounded)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
        }
    }
}

/// Perturbation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PerturbationConfig {
    /// Per-axis offset half-width.
    #[validate(range(min = 1e-15, max = 1.0))]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

const fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
        }
    }
}

/// Reproducibility settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReproducibilityConfig {
    /// Seed for the perturbation RNG.
    pub seed: u64,
}

impl Default for ReproducibilityConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}
