//! Assembles and classifies robot-motion optimization problems.
//!
//! A [`ProblemBuilder`] owns the decision variables for one or more robots
//! over a fixed number of time steps. Callers add parameters, scalar cost
//! terms, and constraints expressed in a [`SymbolicEngine`]'s expressions,
//! then call [`ProblemBuilder::finalize`] to get an [`OptimizationProblem`]:
//!
//! - the [`ProblemKind`], selected from the structure of the cost and the
//!   constraints
//! - the compiled cost `f` and constraint functions `k`, `g`, `h`, each with
//!   its first and second derivatives
//! - snapshots of the variable, parameter, and cost containers
//!
//! Constraints declared as inequalities or equalities that are affine in the
//! decision variables are stored as linear constraints. The builder reports
//! each such move to its observer as an [`Event`] and logs it with
//! [`tracing`].
//!
//! # Example
//!
//! ```
//! use invk_builder::{Config, ProblemBuilder, ProblemKind};
//! use invk_symbolic::{Sx, SxEngine};
//!
//! let config = Config::new(2, [0])?;
//! let mut builder = ProblemBuilder::new(SxEngine, [("arm", 2_usize)], config)?;
//!
//! let q = builder.get_state("arm", 1, 0)?;
//! builder.add_cost_term("reach", q.dot(&q))?;
//! builder.add_linear_constraint("limits", &Sx::full(2, 1, -1.0), &q, &Sx::full(2, 1, 1.0))?;
//!
//! let problem = builder.finalize()?;
//! assert_eq!(problem.kind(), ProblemKind::LinearConstrainedQp);
//! assert_eq!(problem.num_variables(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod config;
mod error;
mod event;
mod kind;
mod problem;
mod state;

#[cfg(test)]
mod tests;

pub use builder::ProblemBuilder;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::{Action, Declared, Event};
pub use kind::ProblemKind;
pub use problem::{Derivatives, OptimizationProblem};
pub use state::state_name;

pub use invk_core::{Observer, RobotModel, Shape, Shaped, SymbolContainer, SymbolicEngine};
