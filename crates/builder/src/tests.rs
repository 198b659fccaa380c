use approx::assert_relative_eq;
use invk_core::ContainerError;
use invk_symbolic::{Sx, SxEngine};
use ndarray::{Array2, array};

use super::{
    Action, Config, ConfigError, Declared, Error, Event, ProblemBuilder, ProblemKind, Shape,
};

/// One robot with `ndof` joints over `steps` steps, positions only.
fn single_robot(ndof: usize, steps: usize) -> ProblemBuilder<SxEngine> {
    let config = Config::new(steps, [0]).expect("valid config");
    ProblemBuilder::new(SxEngine, [("r", ndof)], config).expect("unique robot names")
}

/// Names of the symbols making up `expr`, row-major.
fn symbol_names(expr: &Sx) -> Vec<&str> {
    expr.elements()
        .iter()
        .map(|e| e.as_symbol().expect("a decision variable").name())
        .collect()
}

#[test]
fn creates_one_block_per_robot_and_derivative() {
    let config = Config::new(5, [0, 1, 2]).unwrap();
    let builder =
        ProblemBuilder::new(SxEngine, [("arm", 7_usize), ("base", 3)], config).unwrap();

    let blocks: Vec<_> = builder
        .decision_variables()
        .iter()
        .map(|(name, block)| (name.to_owned(), block.shape()))
        .collect();

    assert_eq!(
        blocks,
        [
            ("arm/q".to_owned(), Shape::new(7, 5)),
            ("arm/dq".to_owned(), Shape::new(7, 4)),
            ("arm/ddq".to_owned(), Shape::new(7, 3)),
            ("base/q".to_owned(), Shape::new(3, 5)),
            ("base/dq".to_owned(), Shape::new(3, 4)),
            ("base/ddq".to_owned(), Shape::new(3, 3)),
        ]
    );
    assert_eq!(builder.decision_variables().numel(), 10 * (5 + 4 + 3));
    assert_eq!(builder.decision_vector().shape(), Shape::column(120));
}

#[test]
fn rejects_duplicate_robot_names() {
    let config = Config::new(2, [0]).unwrap();
    let result = ProblemBuilder::new(SxEngine, [("arm", 2_usize), ("arm", 3)], config);

    assert!(matches!(
        result,
        Err(Error::Container(ContainerError::DuplicateName(name))) if name == "arm/q"
    ));
}

#[test]
fn get_state_returns_a_column() {
    let config = Config::new(4, [0, 1]).unwrap();
    let builder = ProblemBuilder::new(SxEngine, [("r", 2_usize)], config).unwrap();

    let state = builder.get_state("r", 2, 1).unwrap();

    assert_eq!(state.shape(), Shape::column(2));
    assert_eq!(symbol_names(&state), ["r/dq[0,2]", "r/dq[1,2]"]);
}

#[test]
fn get_state_rejects_unknown_inputs() {
    let config = Config::new(4, [0, 2]).unwrap();
    let builder = ProblemBuilder::new(SxEngine, [("r", 2_usize)], config).unwrap();

    let err = builder.get_state("r", 0, 1).expect_err("order 1 is not configured");
    assert!(matches!(
        err,
        Error::UnknownDerivative { qderiv: 1, ref configured } if configured == &[0, 2]
    ));

    let err = builder.get_state("arm", 0, 0).expect_err("no such robot");
    assert!(matches!(
        err,
        Error::Container(ContainerError::NameNotFound(name)) if name == "arm/q"
    ));

    let err = builder.get_state("r", 2, 2).expect_err("ddq has two columns");
    assert!(matches!(err, Error::Engine(_)));
}

#[test]
fn rejects_invalid_configs() {
    assert_eq!(Config::new(3, []), Err(ConfigError::NoDerivatives));
    assert_eq!(Config::new(0, [0]), Err(ConfigError::ZeroSteps));
    assert_eq!(
        Config::new(2, [0, 2]),
        Err(ConfigError::TooFewSteps {
            steps: 2,
            max_qderiv: 2
        })
    );
}

#[test]
fn registers_variables_and_parameters() {
    let mut builder = single_robot(2, 1);

    let slack = builder.add_decision_variable("slack", 3, 1).unwrap();
    let goal = builder.add_parameter("goal", 2, 1).unwrap();

    assert_eq!(slack.shape(), Shape::column(3));
    assert_eq!(goal.shape(), Shape::column(2));
    assert_eq!(builder.decision_variables().numel(), 5);
    assert_eq!(builder.parameters().numel(), 2);

    let err = builder.add_parameter("goal", 1, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::Container(ContainerError::DuplicateName(name)) if name == "goal"
    ));
    assert_eq!(builder.parameters().numel(), 2);
}

#[test]
fn cost_terms_must_be_scalar() {
    let mut builder = single_robot(2, 1);
    let q = builder.get_state("r", 0, 0).unwrap();

    let err = builder.add_cost_term("raw", q.clone()).unwrap_err();
    assert!(matches!(
        err,
        Error::CostNotScalar { ref name, shape } if name == "raw" && shape == Shape::column(2)
    ));
    assert!(builder.cost_terms().is_empty());

    builder.add_cost_term("norm", q.dot(&q)).unwrap();
    assert_eq!(builder.cost_terms().names().collect::<Vec<_>>(), ["norm"]);
}

#[test]
fn linear_constraint_evaluates_both_residuals() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();

    builder
        .add_linear_constraint("box", &Sx::from(0.0), &x, &Sx::from(1.0))
        .unwrap();
    assert_eq!(
        builder.linear_constraints().names().collect::<Vec<_>>(),
        ["box_lb", "box_ub"]
    );

    let problem = builder.finalize().unwrap();
    let k = problem.linear().expect("linear constraints are compiled");

    assert_relative_eq!(k.value_at(&[0.5], &[]).unwrap(), array![[0.5], [0.5]]);
    assert_relative_eq!(k.value_at(&[0.25], &[]).unwrap(), array![[0.25], [0.75]]);
    assert_relative_eq!(k.first_at(&[0.5], &[]).unwrap(), array![[1.0], [-1.0]]);
}

#[test]
fn linear_constraint_must_be_affine() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();

    let err = builder
        .add_linear_constraint("square", &Sx::from(0.0), &(&x * &x), &Sx::from(1.0))
        .unwrap_err();

    assert!(matches!(err, Error::ConstraintNotAffine { ref name } if name == "square"));
    assert!(builder.linear_constraints().is_empty());
}

#[test]
fn linear_constraint_affine_in_x_may_depend_on_parameters() {
    let mut builder = single_robot(2, 1);
    let q = builder.get_state("r", 0, 0).unwrap();
    let scale = builder.add_parameter("scale", 1, 1).unwrap();

    let scaled = &q * &(&scale * &scale);
    builder
        .add_linear_constraint("scaled", &Sx::zeros(2, 1), &scaled, &Sx::ones(2, 1))
        .unwrap();

    let problem = builder.finalize().unwrap();
    let k = problem.linear().unwrap();

    assert_relative_eq!(
        k.value_at(&[1.0, 2.0], &[3.0]).unwrap(),
        array![[9.0], [18.0], [-8.0], [-17.0]]
    );
}

#[test]
fn affine_inequality_moves_to_linear_with_one_event() {
    let mut events = Vec::new();
    let mut builder = single_robot(1, 1).with_observer(|event: &Event<'_>| -> Option<Action> {
        let Event::Reclassified { name, declared } = *event;
        events.push((name.to_owned(), declared));
        None
    });
    let x = builder.get_state("r", 0, 0).unwrap();

    builder
        .add_inequality_constraint("bound", &Sx::from(-1.0), &(&x * 2.0), &Sx::from(1.0))
        .unwrap();

    assert!(builder.inequality_constraints().is_empty());
    assert_eq!(
        builder.linear_constraints().names().collect::<Vec<_>>(),
        ["bound_lb", "bound_ub"]
    );
    let problem = builder.finalize().unwrap();
    assert_eq!(problem.kind(), ProblemKind::LinearConstrainedQp);
    drop(builder);

    assert_eq!(events, [("bound".to_owned(), Declared::Inequality)]);
}

#[test]
fn affine_equality_moves_to_linear_and_is_satisfied_at_zero() {
    let mut count = 0;
    let mut builder = single_robot(1, 1).with_observer(|event: &Event<'_>| -> Option<Action> {
        assert!(matches!(
            event,
            Event::Reclassified {
                declared: Declared::Equality,
                ..
            }
        ));
        count += 1;
        None
    });
    let x = builder.get_state("r", 0, 0).unwrap();

    builder.add_equality_constraint("pin", &x, None).unwrap();

    assert!(builder.equality_constraints().is_empty());
    let problem = builder.finalize().unwrap();
    let k = problem.linear().unwrap();

    assert_relative_eq!(k.value_at(&[0.0], &[]).unwrap(), array![[0.0], [0.0]]);
    assert_relative_eq!(k.value_at(&[0.5], &[]).unwrap(), array![[-0.5], [0.5]]);
    drop(builder);
    assert_eq!(count, 1);
}

#[test]
fn equality_with_rhs_maps_to_two_sided_linear_constraint() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();

    builder
        .add_equality_constraint("at_two", &x, Some(&Sx::from(2.0)))
        .unwrap();

    let problem = builder.finalize().unwrap();
    let k = problem.linear().unwrap();

    // lb = rhs - lhs, ub = lhs - rhs
    assert_relative_eq!(k.value_at(&[2.0], &[]).unwrap(), array![[0.0], [0.0]]);
    assert_relative_eq!(k.value_at(&[3.0], &[]).unwrap(), array![[-1.0], [1.0]]);
}

#[test]
fn nonlinear_constraints_stay_in_their_groups() {
    let mut events = 0;
    let mut builder = single_robot(2, 1).with_observer(|_: &Event<'_>| -> Option<Action> {
        events += 1;
        None
    });
    let q = builder.get_state("r", 0, 0).unwrap();
    let q0 = q.get(0, 0).unwrap();
    let q1 = q.get(1, 0).unwrap();

    builder.add_cost_term("norm", q.dot(&q)).unwrap();
    builder
        .add_inequality_constraint("circle", &Sx::from(0.0), &q.dot(&q), &Sx::from(4.0))
        .unwrap();
    builder
        .add_equality_constraint("curve", &q1, Some(&q0.sin()))
        .unwrap();

    assert_eq!(
        builder.inequality_constraints().names().collect::<Vec<_>>(),
        ["circle_lb", "circle_ub"]
    );
    assert_eq!(builder.equality_constraints().names().collect::<Vec<_>>(), ["curve"]);
    assert!(builder.linear_constraints().is_empty());

    let problem = builder.finalize().unwrap();
    assert_eq!(problem.kind(), ProblemKind::NonlinearConstrainedQp);

    let x = [1.0, 1.0];
    let g = problem.equality().unwrap();
    let h = problem.inequality().unwrap();
    let k = problem.linear().expect("nonlinear kinds also carry k");

    assert_relative_eq!(g.value_at(&x, &[]).unwrap(), array![[1.0 - 1.0_f64.sin()]]);
    assert_relative_eq!(h.value_at(&x, &[]).unwrap(), array![[2.0], [2.0]]);
    assert_relative_eq!(
        h.first_at(&x, &[]).unwrap(),
        array![[2.0, 2.0], [-2.0, -2.0]]
    );
    assert_eq!(h.second_at(&x, &[]).unwrap().dim(), (4, 2));
    assert_eq!(k.value_at(&x, &[]).unwrap().dim(), (0, 1));

    drop(builder);
    assert_eq!(events, 0);
}

#[test]
fn observer_can_reject_a_move() {
    let mut builder = single_robot(1, 1).with_observer(|_: &Event<'_>| Some(Action::Reject));
    let x = builder.get_state("r", 0, 0).unwrap();

    let err = builder
        .add_inequality_constraint("bound", &Sx::from(0.0), &x, &Sx::from(1.0))
        .unwrap_err();
    assert!(matches!(err, Error::ReclassificationRejected { ref name } if name == "bound"));

    builder.add_linear_constraint("bound", &Sx::from(0.0), &x, &Sx::from(1.0)).unwrap();
    assert_eq!(builder.linear_constraints().len(), 2);
}

#[test]
fn constraint_names_are_unique_across_groups() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();

    builder.add_equality_constraint("c", &x.sin(), None).unwrap();

    let err = builder
        .add_linear_constraint("c", &Sx::from(0.0), &x, &Sx::from(1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Container(ContainerError::DuplicateName(name)) if name == "c"
    ));

    builder.add_linear_constraint("d", &Sx::from(0.0), &x, &Sx::from(1.0)).unwrap();
    let err = builder
        .add_inequality_constraint("d", &Sx::from(0.0), &x.exp(), &Sx::from(1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Container(ContainerError::DuplicateName(name)) if name == "d_lb"
    ));
}

#[test]
fn shape_mismatch_is_an_engine_error() {
    let mut builder = single_robot(2, 1);
    let q = builder.get_state("r", 0, 0).unwrap();

    let err = builder
        .add_linear_constraint("bad", &Sx::zeros(3, 1), &q, &Sx::ones(2, 1))
        .unwrap_err();

    assert!(matches!(err, Error::Engine(_)));
    assert!(builder.linear_constraints().is_empty());
}

#[test]
fn kind_follows_cost_and_constraints() {
    let mut builder = single_robot(2, 1);
    let q = builder.get_state("r", 0, 0).unwrap();

    assert_eq!(builder.finalize().unwrap().kind(), ProblemKind::UnconstrainedQp);

    builder.add_cost_term("norm", q.dot(&q)).unwrap();
    assert_eq!(builder.finalize().unwrap().kind(), ProblemKind::UnconstrainedQp);

    builder
        .add_linear_constraint("box", &Sx::full(2, 1, -1.0), &q, &Sx::full(2, 1, 1.0))
        .unwrap();
    assert_eq!(builder.finalize().unwrap().kind(), ProblemKind::LinearConstrainedQp);

    builder
        .add_cost_term("wave", q.get(0, 0).unwrap().sin())
        .unwrap();
    assert_eq!(
        builder.finalize().unwrap().kind(),
        ProblemKind::LinearConstrainedOptimization
    );
}

#[test]
fn unconstrained_optimization_has_no_constraint_functions() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();
    builder.add_cost_term("cubic", x.powi(3)).unwrap();

    let problem = builder.build().unwrap();

    assert_eq!(problem.kind(), ProblemKind::UnconstrainedOptimization);
    assert!(problem.linear().is_none());
    assert!(problem.equality().is_none());
    assert!(problem.inequality().is_none());
}

#[test]
fn quadratic_cost_derivatives() {
    let mut builder = single_robot(2, 1);
    let x = builder.get_state("r", 0, 0).unwrap();
    builder.add_cost_term("norm", x.dot(&x)).unwrap();

    let problem = builder.finalize().unwrap();
    let f = problem.cost();
    let x = [1.0, 2.0];

    assert_relative_eq!(f.value_at(&x, &[]).unwrap(), array![[5.0]]);
    assert_relative_eq!(f.first_at(&x, &[]).unwrap(), array![[2.0, 4.0]]);
    assert_relative_eq!(f.second_at(&x, &[]).unwrap(), 2.0 * Array2::<f64>::eye(2));
}

#[test]
fn cost_is_the_sum_of_terms_and_uses_parameters() {
    let mut builder = single_robot(2, 1);
    let q = builder.get_state("r", 0, 0).unwrap();
    let goal = builder.add_parameter("goal", 2, 1).unwrap();

    let error = &q - &goal;
    builder.add_cost_term("track", error.dot(&error)).unwrap();
    builder.add_cost_term("offset", Sx::from(1.5)).unwrap();

    let problem = builder.finalize().unwrap();
    let f = problem.cost();
    assert_eq!(problem.num_parameters(), 2);

    assert_relative_eq!(f.value_at(&[1.0, 1.0], &[0.0, 3.0]).unwrap(), array![[6.5]]);
    assert_relative_eq!(
        f.first_at(&[1.0, 1.0], &[0.0, 3.0]).unwrap(),
        array![[2.0, -4.0]]
    );
}

#[test]
fn empty_cost_is_zero() {
    let problem = single_robot(3, 2).finalize().unwrap();

    assert_eq!(problem.num_variables(), 6);
    assert_relative_eq!(problem.cost().value_at(&[1.0; 6], &[]).unwrap(), array![[0.0]]);
    assert_relative_eq!(
        problem.cost().first_at(&[1.0; 6], &[]).unwrap(),
        Array2::<f64>::zeros((1, 6))
    );
}

#[test]
fn compiled_functions_are_named_by_derivative() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();
    builder
        .add_inequality_constraint("wave", &Sx::from(0.0), &x.cos(), &Sx::from(1.0))
        .unwrap();

    let problem = builder.finalize().unwrap();
    let f = problem.cost();
    let h = problem.inequality().unwrap();

    assert_eq!([f.value.name(), f.first.name(), f.second.name()], ["f", "df", "ddf"]);
    assert_eq!([h.value.name(), h.first.name(), h.second.name()], ["h", "dh", "ddh"]);
    assert_eq!(problem.equality().unwrap().value.name(), "g");
    assert_eq!(problem.linear().unwrap().value.name(), "k");
}

#[test]
fn wrong_argument_lengths_are_reported() {
    let problem = single_robot(2, 1).finalize().unwrap();

    let err = problem.cost().value_at(&[1.0], &[]).unwrap_err();
    assert!(matches!(
        err,
        invk_symbolic::Error::ArgumentLength {
            index: 0,
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn finalized_problems_keep_their_snapshot() {
    let mut builder = single_robot(1, 1);
    let x = builder.get_state("r", 0, 0).unwrap();
    builder.add_cost_term("square", &x * &x).unwrap();

    let first = builder.finalize().unwrap();

    builder.add_decision_variable("slack", 2, 1).unwrap();
    builder.add_parameter("weight", 1, 1).unwrap();
    builder.add_cost_term("linear", x.clone()).unwrap();
    let second = builder.finalize().unwrap();

    assert_eq!(first.num_variables(), 1);
    assert_eq!(first.num_parameters(), 0);
    assert_eq!(first.cost_terms().names().collect::<Vec<_>>(), ["square"]);

    assert_eq!(second.num_variables(), 3);
    assert_eq!(second.num_parameters(), 1);
    assert_eq!(second.cost_terms().names().collect::<Vec<_>>(), ["square", "linear"]);
    assert_relative_eq!(
        first.cost().value_at(&[2.0], &[]).unwrap(),
        array![[4.0]]
    );
    assert_relative_eq!(
        second.cost().value_at(&[2.0, 0.0, 0.0], &[1.0]).unwrap(),
        array![[6.0]]
    );
}

#[test]
fn problem_layout_splits_solutions_by_block() {
    let config = Config::new(3, [0, 1]).unwrap();
    let builder = ProblemBuilder::new(SxEngine, [("r", 2_usize)], config).unwrap();
    let problem = builder.finalize().unwrap();

    let x: Vec<f64> = (0_u32..10).map(f64::from).collect();
    let blocks = problem.decision_variables().split(&x).unwrap();

    assert_eq!(blocks[0].0, "r/q");
    assert_eq!(blocks[0].1, array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
    assert_eq!(blocks[1].0, "r/dq");
    assert_eq!(blocks[1].1, array![[6.0, 7.0], [8.0, 9.0]]);
}

#[test]
fn exposes_robots_and_config() {
    let config = Config::new(3, [0, 1]).unwrap();
    let builder = ProblemBuilder::new(SxEngine, [("arm", 6_usize), ("gripper", 1)], config.clone())
        .unwrap();

    assert_eq!(builder.config(), &config);
    assert_eq!(builder.robots().collect::<Vec<_>>(), [("arm", 6), ("gripper", 1)]);
}

#[test]
fn finalizes_costs_accumulated_one_term_at_a_time() {
    let mut builder = single_robot(2, 1);
    let x = builder.get_state("r", 0, 0).unwrap().get(0, 0).unwrap();
    let mut cost = Sx::from(0.0);
    for _ in 0..100_000 {
        cost = cost + &x * &x;
    }
    builder.add_cost_term("chain", cost).unwrap();

    let problem = builder.finalize().unwrap();

    let x = [3.0, 0.0];
    let f = problem.cost();
    assert_eq!(problem.kind(), ProblemKind::UnconstrainedQp);
    assert_relative_eq!(f.value_at(&x, &[]).unwrap(), array![[900_000.0]]);
    assert_relative_eq!(f.first_at(&x, &[]).unwrap(), array![[600_000.0, 0.0]]);
    assert_relative_eq!(
        f.second_at(&x, &[]).unwrap(),
        array![[200_000.0, 0.0], [0.0, 0.0]]
    );
}

#[test]
fn joint_limits_compile_to_sparse_derivatives() {
    let (ndof, steps) = (7, 20);
    let n = ndof * steps;
    let mut builder = single_robot(ndof, steps);
    let (lower, upper) = (Sx::full(ndof, 1, -2.0), Sx::full(ndof, 1, 2.0));
    for t in 0..steps {
        let q = builder.get_state("r", t, 0).unwrap();
        builder
            .add_linear_constraint(&format!("limits_{t}"), &lower, &q, &upper)
            .unwrap();
        builder.add_cost_term(&format!("effort_{t}"), q.dot(&q)).unwrap();
    }

    let problem = builder.finalize().unwrap();

    assert_eq!(problem.kind(), ProblemKind::LinearConstrainedQp);
    let linear = problem.linear().expect("linear constraints");
    assert_eq!(linear.second.shape(), Shape::new(2 * n * n, n));
    assert_eq!(linear.second.instructions(), 1);
    assert!(linear.first.instructions() <= 2 * n + 2);
    assert!(problem.cost().second.instructions() <= 2 * n);

    let x = vec![0.5; n];
    let dk = linear.first_at(&x, &[]).unwrap();
    assert_eq!(dk.dim(), (2 * n, n));
    assert_relative_eq!(dk.sum(), 0.0);
    assert_relative_eq!(
        problem.cost().second_at(&x, &[]).unwrap(),
        Array2::<f64>::eye(n) * 2.0
    );
}
