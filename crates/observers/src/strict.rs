use invk_builder::{Action, Event};
use invk_core::Observer;

/// Rejects every reclassification.
///
/// With this observer an affine constraint registered as an inequality or
/// equality fails with [`Error::ReclassificationRejected`] instead of being
/// moved, which surfaces constraints declared in the wrong group.
///
/// [`Error::ReclassificationRejected`]: invk_builder::Error::ReclassificationRejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strict;

impl<'a> Observer<Event<'a>, Action> for Strict {
    fn observe(&mut self, _event: &Event<'a>) -> Option<Action> {
        Some(Action::Reject)
    }
}

#[cfg(test)]
mod tests {
    use invk_builder::{Config, Error, ProblemBuilder, ProblemKind};
    use invk_symbolic::{Sx, SxEngine};

    use super::*;

    #[test]
    fn affine_constraints_must_be_declared_linear() {
        let config = Config::new(1, [0]).unwrap();
        let mut builder = ProblemBuilder::new(SxEngine, [("r", 1_usize)], config)
            .unwrap()
            .with_observer(Strict);
        let q = builder.get_state("r", 0, 0).unwrap();

        let err = builder.add_equality_constraint("rest", &q, None).unwrap_err();
        assert!(matches!(err, Error::ReclassificationRejected { ref name } if name == "rest"));
        assert!(builder.linear_constraints().is_empty());

        builder
            .add_inequality_constraint("reach", &Sx::from(0.0), &q.sin(), &Sx::from(0.5))
            .unwrap();
        builder
            .add_linear_constraint("rest", &q, &Sx::zeros(1, 1), &q)
            .unwrap();

        let problem = builder.finalize().unwrap();
        assert_eq!(problem.kind(), ProblemKind::NonlinearConstrainedQp);
    }
}
