use std::fmt;

/// The canonical shape of an assembled optimization problem.
///
/// With decision variables `x`, parameters `p`, and `'` for transpose:
///
/// | Kind | Cost | Constraints |
/// |---|---|---|
/// | [`UnconstrainedQp`] | `x'·P(p)·x + x'·q(p)` | none |
/// | [`LinearConstrainedQp`] | quadratic | `k(x, p) = M(p)·x + c(p) >= 0` |
/// | [`NonlinearConstrainedQp`] | quadratic | `k >= 0`, `g(x, p) == 0`, `h(x, p) >= 0` |
/// | [`UnconstrainedOptimization`] | any | none |
/// | [`LinearConstrainedOptimization`] | any | `k >= 0` |
/// | [`NonlinearConstrainedOptimization`] | any | `k >= 0`, `g == 0`, `h >= 0` |
///
/// `P`, `q`, `M`, and `c` are never stated explicitly; they are implied by
/// the registered cost terms and constraints. The kind decides which solvers
/// can take the problem.
///
/// [`UnconstrainedQp`]: Self::UnconstrainedQp
/// [`LinearConstrainedQp`]: Self::LinearConstrainedQp
/// [`NonlinearConstrainedQp`]: Self::NonlinearConstrainedQp
/// [`UnconstrainedOptimization`]: Self::UnconstrainedOptimization
/// [`LinearConstrainedOptimization`]: Self::LinearConstrainedOptimization
/// [`NonlinearConstrainedOptimization`]: Self::NonlinearConstrainedOptimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub enum ProblemKind {
    UnconstrainedQp,
    LinearConstrainedQp,
    NonlinearConstrainedQp,
    UnconstrainedOptimization,
    LinearConstrainedOptimization,
    NonlinearConstrainedOptimization,
}

impl ProblemKind {
    /// Selects the kind from the cost structure and constraint counts.
    ///
    /// Any nonlinear constraint makes the problem nonlinearly constrained,
    /// whatever the number of linear constraints.
    #[must_use]
    pub fn select(cost_is_quadratic: bool, n_nonlinear: usize, n_linear: usize) -> Self {
        match (cost_is_quadratic, n_nonlinear > 0, n_linear > 0) {
            (true, true, _) => Self::NonlinearConstrainedQp,
            (true, false, true) => Self::LinearConstrainedQp,
            (true, false, false) => Self::UnconstrainedQp,
            (false, true, _) => Self::NonlinearConstrainedOptimization,
            (false, false, true) => Self::LinearConstrainedOptimization,
            (false, false, false) => Self::UnconstrainedOptimization,
        }
    }

    /// Returns `true` if the cost is at most quadratic in the decision variables.
    #[must_use]
    pub fn is_qp(self) -> bool {
        matches!(
            self,
            Self::UnconstrainedQp | Self::LinearConstrainedQp | Self::NonlinearConstrainedQp
        )
    }

    /// Returns `true` if the problem carries linear constraint functions `k`.
    ///
    /// Nonlinearly constrained kinds always carry `k`, possibly empty.
    #[must_use]
    pub fn has_linear_constraints(self) -> bool {
        !matches!(self, Self::UnconstrainedQp | Self::UnconstrainedOptimization)
    }

    /// Returns `true` if the problem carries nonlinear constraint functions
    /// `g` and `h`.
    #[must_use]
    pub fn has_nonlinear_constraints(self) -> bool {
        matches!(
            self,
            Self::NonlinearConstrainedQp | Self::NonlinearConstrainedOptimization
        )
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnconstrainedQp => "unconstrained QP",
            Self::LinearConstrainedQp => "linear constrained QP",
            Self::NonlinearConstrainedQp => "nonlinear constrained QP",
            Self::UnconstrainedOptimization => "unconstrained optimization",
            Self::LinearConstrainedOptimization => "linear constrained optimization",
            Self::NonlinearConstrainedOptimization => "nonlinear constrained optimization",
        };
        f.write_str(name)
    }
}
