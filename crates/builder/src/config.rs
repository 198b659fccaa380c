use thiserror::Error;

/// Trajectory configuration for a problem builder.
///
/// `steps` is the number of time steps `T` treated as decision variables, and
/// `qderivs` lists the derivative orders of the joint trajectory to include.
/// Order `0` is the configuration `q`, order `1` the velocity `dq`, and so on.
/// A block for order `d` has `T - d` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawConfig", into = "RawConfig")
)]
pub struct Config {
    steps: usize,
    qderivs: Vec<usize>,
}

/// Errors that can occur when validating a builder config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one derivative order is required")]
    NoDerivatives,

    #[error("steps must be strictly positive")]
    ZeroSteps,

    #[error("steps must be greater than {max_qderiv}, got {steps}")]
    TooFewSteps { steps: usize, max_qderiv: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps: 1,
            qderivs: vec![0],
        }
    }
}

impl Config {
    /// Creates a new config with validated steps and derivative orders.
    ///
    /// Repeated derivative orders are dropped; the first occurrence keeps its
    /// position.
    ///
    /// # Errors
    ///
    /// Returns an error if no derivative order is given, if `steps` is zero,
    /// or if `steps` does not exceed the highest derivative order.
    pub fn new(
        steps: usize,
        qderivs: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ConfigError> {
        let mut unique = Vec::new();
        for qderiv in qderivs {
            if !unique.contains(&qderiv) {
                unique.push(qderiv);
            }
        }

        let max_qderiv = unique.iter().copied().max().ok_or(ConfigError::NoDerivatives)?;
        if steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if steps <= max_qderiv {
            return Err(ConfigError::TooFewSteps { steps, max_qderiv });
        }

        Ok(Self {
            steps,
            qderivs: unique,
        })
    }

    /// Returns the number of time steps.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Returns the configured derivative orders, in the order given.
    #[must_use]
    pub fn qderivs(&self) -> &[usize] {
        &self.qderivs
    }

    /// Returns `true` if `qderiv` is one of the configured orders.
    #[must_use]
    pub fn has_qderiv(&self, qderiv: usize) -> bool {
        self.qderivs.contains(&qderiv)
    }
}

#[cfg(feature = "serde-derive")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawConfig {
    steps: usize,
    qderivs: Vec<usize>,
}

#[cfg(feature = "serde-derive")]
impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        Self::new(raw.steps, raw.qderivs)
    }
}

#[cfg(feature = "serde-derive")]
impl From<Config> for RawConfig {
    fn from(config: Config) -> Self {
        Self {
            steps: config.steps,
            qderivs: config.qderivs,
        }
    }
}
