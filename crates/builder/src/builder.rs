use std::sync::Arc;

use invk_core::{Observer, RobotModel, Shape, Shaped, SymbolContainer, SymbolicEngine};
use tracing::{debug, warn};

use crate::{
    Action, Config, Declared, Derivatives, Error, Event, OptimizationProblem, ProblemKind,
    state_name,
};

/// Accumulates decision variables, parameters, cost terms, and constraints,
/// then assembles them into an [`OptimizationProblem`].
///
/// Decision variables for every robot and configured derivative order exist
/// from construction. Everything else is registered during the build phase,
/// and [`finalize`](Self::finalize) turns the accumulated state into a
/// problem. Registration takes `&mut self`; concurrent use must be serialized
/// by the caller.
///
/// Constraints are two-sided residuals `(lower, upper)`, feasible when both
/// are non-negative. Inequality and equality constraints that are affine in
/// the decision variables are moved to the linear group; each move is
/// reported to the builder's observer as an [`Event::Reclassified`].
pub struct ProblemBuilder<E: SymbolicEngine, Obs = ()> {
    engine: E,
    config: Config,
    robots: Vec<(String, usize)>,
    observer: Obs,
    decision_variables: Arc<SymbolContainer<E::Expr>>,
    parameters: Arc<SymbolContainer<E::Expr>>,
    cost_terms: Arc<SymbolContainer<E::Expr>>,
    linear: SymbolContainer<E::Expr>,
    equality: SymbolContainer<E::Expr>,
    inequality: SymbolContainer<E::Expr>,
}

impl<E: SymbolicEngine> ProblemBuilder<E> {
    /// Creates a builder with decision variables for each robot.
    ///
    /// For every robot and every configured derivative order `d`, a block
    /// named [`state_name(robot, d)`](state_name) with shape
    /// `(ndof, steps - d)` is created, robots first, then orders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Container`] if two robots share a name.
    pub fn new<N, R>(
        engine: E,
        robots: impl IntoIterator<Item = (N, R)>,
        config: Config,
    ) -> Result<Self, Error>
    where
        N: Into<String>,
        R: RobotModel,
    {
        let robots: Vec<(String, usize)> = robots
            .into_iter()
            .map(|(name, robot)| (name.into(), robot.ndof()))
            .collect();

        let mut decision_variables = SymbolContainer::new();
        for (robot, ndof) in &robots {
            for &qderiv in config.qderivs() {
                let name = state_name(robot, qderiv);
                let shape = Shape::new(*ndof, config.steps() - qderiv);
                let block = engine.symbol(&name, shape);
                decision_variables.try_insert(name, block)?;
            }
        }

        Ok(Self {
            engine,
            config,
            robots,
            observer: (),
            decision_variables: Arc::new(decision_variables),
            parameters: Arc::default(),
            cost_terms: Arc::default(),
            linear: SymbolContainer::new(),
            equality: SymbolContainer::new(),
            inequality: SymbolContainer::new(),
        })
    }
}

impl<E: SymbolicEngine, Obs> ProblemBuilder<E, Obs> {
    /// Replaces the observer that receives reclassification events.
    #[must_use]
    pub fn with_observer<O>(self, observer: O) -> ProblemBuilder<E, O>
    where
        O: for<'a> Observer<Event<'a>, Action>,
    {
        ProblemBuilder {
            engine: self.engine,
            config: self.config,
            robots: self.robots,
            observer,
            decision_variables: self.decision_variables,
            parameters: self.parameters,
            cost_terms: self.cost_terms,
            linear: self.linear,
            equality: self.equality,
            inequality: self.inequality,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns each robot's name and degree-of-freedom count.
    pub fn robots(&self) -> impl Iterator<Item = (&str, usize)> {
        self.robots.iter().map(|(name, ndof)| (name.as_str(), *ndof))
    }

    #[must_use]
    pub fn observer(&self) -> &Obs {
        &self.observer
    }

    /// Consumes the builder and returns its observer.
    pub fn into_observer(self) -> Obs {
        self.observer
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

    /// Returns the linear constraint residuals (`name_lb`, `name_ub`).
    #[must_use]
    pub fn linear_constraints(&self) -> &SymbolContainer<E::Expr> {
        &self.linear
    }

    /// Returns the nonlinear equality residuals, each expected to be zero.
    #[must_use]
    pub fn equality_constraints(&self) -> &SymbolContainer<E::Expr> {
        &self.equality
    }

    /// Returns the nonlinear inequality residuals (`name_lb`, `name_ub`).
    #[must_use]
    pub fn inequality_constraints(&self) -> &SymbolContainer<E::Expr> {
        &self.inequality
    }

    /// Returns the flattened decision vector `x`.
    #[must_use]
    pub fn decision_vector(&self) -> E::Expr {
        self.decision_variables.flatten(&self.engine)
    }

    /// Returns column `t` of a robot's `qderiv`-th derivative block.
    ///
    /// Keeping `t` below `steps - qderiv` is up to the caller; an index past
    /// the block is reported by the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDerivative`] if `qderiv` is not configured,
    /// [`Error::Container`] if the robot is unknown, or [`Error::Engine`] if
    /// `t` is out of range.
    pub fn get_state(&self, robot: &str, t: usize, qderiv: usize) -> Result<E::Expr, Error> {
        if !self.config.has_qderiv(qderiv) {
            return Err(Error::UnknownDerivative {
                qderiv,
                configured: self.config.qderivs().to_vec(),
            });
        }
        let states = self.decision_variables.get(&state_name(robot, qderiv))?;
        self.engine.column(states, t).map_err(Error::engine)
    }

    /// Registers an additional block of decision variables and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Container`] if the name is already taken.
    pub fn add_decision_variable(
        &mut self,
        name: &str,
        rows: usize,
        cols: usize,
    ) -> Result<E::Expr, Error> {
        let block = self.engine.symbol(name, Shape::new(rows, cols));
        Arc::make_mut(&mut self.decision_variables).try_insert(name, block.clone())?;
        Ok(block)
    }

    /// Registers a block of parameters and returns it.
    ///
    /// Parameters are supplied numerically when the compiled functions are
    /// evaluated; they are not optimized over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Container`] if the name is already taken.
    pub fn add_parameter(
        &mut self,
        name: &str,
        rows: usize,
        cols: usize,
    ) -> Result<E::Expr, Error> {
        let block = self.engine.symbol(name, Shape::new(rows, cols));
        Arc::make_mut(&mut self.parameters).try_insert(name, block.clone())?;
        Ok(block)
    }

    /// Registers a scalar cost term. The cost is the sum of all terms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CostNotScalar`] unless `term` has shape `(1, 1)`, or
    /// [`Error::Container`] if the name is already taken.
    pub fn add_cost_term(&mut self, name: &str, term: E::Expr) -> Result<(), Error> {
        let shape = term.shape();
        if !shape.is_scalar() {
            return Err(Error::CostNotScalar {
                name: name.to_owned(),
                shape,
            });
        }
        Arc::make_mut(&mut self.cost_terms).try_insert(name, term)?;
        Ok(())
    }

    /// Registers `lower <= c <= upper` as a linear constraint.
    ///
    /// Stored as the residuals `name_lb = c - lower` and
    /// `name_ub = upper - c`, both required to be non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstraintNotAffine`] if either residual is not affine
    /// in the decision vector, [`Error::Container`] if the name is taken, or
    /// [`Error::Engine`] if the shapes are incompatible.
    pub fn add_linear_constraint(
        &mut self,
        name: &str,
        lower: &E::Expr,
        c: &E::Expr,
        upper: &E::Expr,
    ) -> Result<(), Error> {
        let (lb, ub) = self.residuals(lower, c, upper)?;
        let x = self.decision_vector();
        if !(self.engine.is_affine(&lb, &x) && self.engine.is_affine(&ub, &x)) {
            return Err(Error::ConstraintNotAffine {
                name: name.to_owned(),
            });
        }
        self.ensure_constraint_name_free(name)?;

        self.linear.insert(format!("{name}_lb"), lb);
        self.linear.insert(format!("{name}_ub"), ub);
        Ok(())
    }

    /// Registers `lower <= c <= upper` as an inequality constraint.
    ///
    /// If both residuals are affine in the decision vector the constraint is
    /// registered with [`add_linear_constraint`](Self::add_linear_constraint)
    /// instead, after reporting an [`Event::Reclassified`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReclassificationRejected`] if the observer vetoes the
    /// move, [`Error::Container`] if the name is taken, or [`Error::Engine`]
    /// if the shapes are incompatible.
    pub fn add_inequality_constraint(
        &mut self,
        name: &str,
        lower: &E::Expr,
        c: &E::Expr,
        upper: &E::Expr,
    ) -> Result<(), Error>
    where
        Obs: for<'a> Observer<Event<'a>, Action>,
    {
        let (lb, ub) = self.residuals(lower, c, upper)?;
        self.ensure_constraint_name_free(name)?;

        let x = self.decision_vector();
        if self.engine.is_affine(&lb, &x) && self.engine.is_affine(&ub, &x) {
            self.reclassify(name, Declared::Inequality)?;
            return self.add_linear_constraint(name, lower, c, upper);
        }

        self.inequality.insert(format!("{name}_lb"), lb);
        self.inequality.insert(format!("{name}_ub"), ub);
        Ok(())
    }

    /// Registers `lhs == rhs` as an equality constraint.
    ///
    /// `rhs` defaults to zeros shaped like `lhs`. The residual `lhs - rhs` is
    /// stored as is, not split into two inequalities. If it is affine in the
    /// decision vector, the constraint is registered as the linear constraint
    /// `lhs <= rhs <= lhs` instead, after reporting an
    /// [`Event::Reclassified`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReclassificationRejected`] if the observer vetoes the
    /// move, [`Error::Container`] if the name is taken, or [`Error::Engine`]
    /// if the shapes are incompatible.
    pub fn add_equality_constraint(
        &mut self,
        name: &str,
        lhs: &E::Expr,
        rhs: Option<&E::Expr>,
    ) -> Result<(), Error>
    where
        Obs: for<'a> Observer<Event<'a>, Action>,
    {
        let zeros;
        let rhs = match rhs {
            Some(rhs) => rhs,
            None => {
                zeros = self.engine.zeros(lhs.shape());
                &zeros
            }
        };
        let eq = self.engine.sub(lhs, rhs).map_err(Error::engine)?;
        self.ensure_constraint_name_free(name)?;

        let x = self.decision_vector();
        if self.engine.is_affine(&eq, &x) {
            self.reclassify(name, Declared::Equality)?;
            // lhs == rhs holds exactly when rhs - lhs >= 0 and lhs - rhs >= 0.
            return self.add_linear_constraint(name, lhs, rhs, lhs);
        }

        self.equality.insert(name, eq);
        Ok(())
    }

    /// Assembles the registered state into an optimization problem.
    ///
    /// The cost `f` is the sum of all cost terms (zero if there are none). The
    /// problem kind is selected from whether `f` is quadratic in `x` and from
    /// the number of linear and nonlinear constraint elements. Then `f`, the
    /// stacked linear residuals `k`, and the stacked nonlinear residuals `g`
    /// and `h` are compiled with their derivatives, as the kind requires.
    ///
    /// The builder is left untouched, so registration can continue and
    /// `finalize` can be called again. Each problem keeps the containers as
    /// they were when it was built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if compilation fails.
    pub fn finalize(&self) -> Result<OptimizationProblem<E>, Error> {
        let x = self.decision_vector();
        let p = self.parameters.flatten(&self.engine);
        let terms: Vec<&E::Expr> = self.cost_terms.iter().map(|(_, term)| term).collect();
        let f = self.engine.sum(&terms);

        let n_linear = self.linear.numel();
        let n_nonlinear = self.equality.numel() + self.inequality.numel();
        let kind = ProblemKind::select(self.engine.is_quadratic(&f, &x), n_nonlinear, n_linear);
        debug!(%kind, n_linear, n_nonlinear, num_variables = x.numel(), "assembling problem");

        let compile = |name: &str, expr: &E::Expr| self.functionize(name, expr, &x, &p);

        let cost = compile("f", &f)?;
        let linear = kind
            .has_linear_constraints()
            .then(|| compile("k", &self.linear.flatten(&self.engine)))
            .transpose()?;
        let (equality, inequality) = if kind.has_nonlinear_constraints() {
            let g = compile("g", &self.equality.flatten(&self.engine))?;
            let h = compile("h", &self.inequality.flatten(&self.engine))?;
            (Some(g), Some(h))
        } else {
            (None, None)
        };

        Ok(OptimizationProblem {
            kind,
            cost,
            linear,
            equality,
            inequality,
            decision_variables: Arc::clone(&self.decision_variables),
            parameters: Arc::clone(&self.parameters),
            cost_terms: Arc::clone(&self.cost_terms),
        })
    }

    /// Alias for [`finalize`](Self::finalize).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if compilation fails.
    pub fn build(&self) -> Result<OptimizationProblem<E>, Error> {
        self.finalize()
    }

    /// Compiles `expr` as `name`, its jacobian as `d{name}`, and the jacobian
    /// of that as `dd{name}`, all as functions of `(x, p)`.
    fn functionize(
        &self,
        name: &str,
        expr: &E::Expr,
        x: &E::Expr,
        p: &E::Expr,
    ) -> Result<Derivatives<E::Function>, Error> {
        let first = self.engine.jacobian(expr, x).map_err(Error::engine)?;
        let second = self.engine.jacobian(&first, x).map_err(Error::engine)?;
        let compile = |name: String, output: &E::Expr| {
            self.engine
                .compile(&name, &[x, p], output)
                .map_err(Error::engine)
        };
        debug!(
            function = name,
            jacobian = %first.shape(),
            hessian = %second.shape(),
            "compiling with derivatives"
        );
        Ok(Derivatives {
            value: compile(name.to_owned(), expr)?,
            first: compile(format!("d{name}"), &first)?,
            second: compile(format!("dd{name}"), &second)?,
        })
    }

    /// Returns the two-sided residuals `(c - lower, upper - c)`.
    fn residuals(
        &self,
        lower: &E::Expr,
        c: &E::Expr,
        upper: &E::Expr,
    ) -> Result<(E::Expr, E::Expr), Error> {
        let lb = self.engine.sub(c, lower).map_err(Error::engine)?;
        let ub = self.engine.sub(upper, c).map_err(Error::engine)?;
        Ok((lb, ub))
    }

    /// Fails if `name` or its bound residuals exist in any constraint group.
    fn ensure_constraint_name_free(&self, name: &str) -> Result<(), Error> {
        let groups = [&self.linear, &self.equality, &self.inequality];
        for key in [name.to_owned(), format!("{name}_lb"), format!("{name}_ub")] {
            if groups.iter().any(|group| group.contains(&key)) {
                return Err(invk_core::ContainerError::DuplicateName(key).into());
            }
        }
        Ok(())
    }

    /// Reports a move to the linear group and applies the observer's verdict.
    fn reclassify(&mut self, name: &str, declared: Declared) -> Result<(), Error>
    where
        Obs: for<'a> Observer<Event<'a>, Action>,
    {
        let event = Event::Reclassified { name, declared };
        if let Some(Action::Reject) = self.observer.observe(&event) {
            return Err(Error::ReclassificationRejected {
                name: name.to_owned(),
            });
        }
        warn!(
            constraint = name,
            %declared,
            "constraint is affine in the decision variables, adding as linear constraint"
        );
        Ok(())
    }
}
