use std::{fmt, sync::Arc};

use invk_core::{Function, SymbolContainer, SymbolicEngine};
use ndarray::Array2;

use crate::ProblemKind;

/// A compiled function together with its first and second derivatives.
///
/// All three take the flat decision vector `x` and parameter vector `p`.
///
/// For an expression with `m` elements and `n` decision variables:
///
/// - `value` returns the expression, shaped as registered
/// - `first` returns the `m × n` jacobian with respect to `x`
/// - `second` returns the jacobian of `first` (flattened row-major), an
///   `(m·n) × n` matrix
///
/// Only for the scalar cost (`m = 1`) is `second` the hessian. For
/// constraint vectors it stacks the hessian of each element, row by row.
#[derive(Debug, Clone)]
pub struct Derivatives<F> {
    pub value: F,
    pub first: F,
    pub second: F,
}

impl<F: Function> Derivatives<F> {
    /// Evaluates the value function.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` or `p` has the wrong length.
    pub fn value_at(&self, x: &[f64], p: &[f64]) -> Result<Array2<f64>, F::Error> {
        self.value.call(&[x, p])
    }

    /// Evaluates the jacobian with respect to `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` or `p` has the wrong length.
    pub fn first_at(&self, x: &[f64], p: &[f64]) -> Result<Array2<f64>, F::Error> {
        self.first.call(&[x, p])
    }

    /// Evaluates the jacobian of the jacobian with respect to `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` or `p` has the wrong length.
    pub fn second_at(&self, x: &[f64], p: &[f64]) -> Result<Array2<f64>, F::Error> {
        self.second.call(&[x, p])
    }
}

/// An assembled optimization problem, ready for a numeric solver.
///
/// The [`kind`](Self::kind) decides which constraint functions are present:
///
/// - [`linear`](Self::linear) (`k >= 0`) for every constrained kind
/// - [`equality`](Self::equality) (`g == 0`) and
///   [`inequality`](Self::inequality) (`h >= 0`) for nonlinearly constrained
///   kinds
///
/// The containers are snapshots of the builder at the time the problem was
/// built. A solver uses them to map flat numeric vectors onto named blocks
/// (see [`SymbolContainer::split`]).
pub struct OptimizationProblem<E: SymbolicEngine> {
    pub(crate) kind: ProblemKind,
    pub(crate) cost: Derivatives<E::Function>,
    pub(crate) linear: Option<Derivatives<E::Function>>,
    pub(crate) equality: Option<Derivatives<E::Function>>,
    pub(crate) inequality: Option<Derivatives<E::Function>>,
    pub(crate) decision_variables: Arc<SymbolContainer<E::Expr>>,
    pub(crate) parameters: Arc<SymbolContainer<E::Expr>>,
    pub(crate) cost_terms: Arc<SymbolContainer<E::Expr>>,
}

impl<E: SymbolicEngine> OptimizationProblem<E> {
    #[must_use]
    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    /// Returns the cost function `f` and its derivatives.
    #[must_use]
    pub fn cost(&self) -> &Derivatives<E::Function> {
        &self.cost
    }

    /// Returns the linear constraint functions `k`, if the kind has them.
    #[must_use]
    pub fn linear(&self) -> Option<&Derivatives<E::Function>> {
        self.linear.as_ref()
    }

    /// Returns the nonlinear equality constraint functions `g`, if the kind
    /// has them.
    #[must_use]
    pub fn equality(&self) -> Option<&Derivatives<E::Function>> {
        self.equality.as_ref()
    }

    /// Returns the nonlinear inequality constraint functions `h`, if the kind
    /// has them.
    #[must_use]
    pub fn inequality(&self) -> Option<&Derivatives<E::Function>> {
        self.inequality.as_ref()
    }

    #[must_use]
    pub fn decision_variables(&self) -> &SymbolContainer<E::Expr> {
        &self.decision_variables
    }

    #[must_use]
    pub fn parameters(&self) -> &SymbolContainer<E::Expr> {
        &self.parameters
    }

    #[must_use]
    pub fn cost_terms(&self) -> &SymbolContainer<E::Expr> {
        &self.cost_terms
    }

    /// Returns the length of the decision vector `x`.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.decision_variables.numel()
    }

    /// Returns the length of the parameter vector `p`.
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.parameters.numel()
    }
}

impl<E: SymbolicEngine> fmt::Debug for OptimizationProblem<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationProblem")
            .field("kind", &self.kind)
            .field("num_variables", &self.num_variables())
            .field("num_parameters", &self.num_parameters())
            .field("cost_terms", &self.cost_terms.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
