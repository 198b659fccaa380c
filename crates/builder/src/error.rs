use std::error::Error as StdError;

use invk_core::{ContainerError, Shape};
use thiserror::Error;

use crate::ConfigError;

/// Errors that can occur while building an optimization problem.
///
/// Every registration checks for these before touching the builder, so a
/// failed call leaves the builder as it was.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("cost term '{name}' must be scalar, got shape {shape}")]
    CostNotScalar { name: String, shape: Shape },

    #[error("constraint '{name}' is not affine in the decision variables")]
    ConstraintNotAffine { name: String },

    #[error("derivative order {qderiv} is not configured, expected one of {configured:?}")]
    UnknownDerivative {
        qderiv: usize,
        configured: Vec<usize>,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("observer rejected moving constraint '{name}' to the linear group")]
    ReclassificationRejected { name: String },

    #[error("symbolic engine error")]
    Engine(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn engine<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Engine(Box::new(err))
    }
}
