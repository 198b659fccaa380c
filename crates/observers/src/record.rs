use invk_builder::{Action, Declared, Event};
use invk_core::Observer;

/// An owned record of one constraint moved to the linear group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reclassification {
    pub name: String,
    pub declared: Declared,
}

/// Records every reclassification and never acts.
///
/// Hand the recorder to the builder, then take it back with
/// [`ProblemBuilder::into_observer`] or inspect it through
/// [`ProblemBuilder::observer`].
///
/// [`ProblemBuilder::into_observer`]: invk_builder::ProblemBuilder::into_observer
/// [`ProblemBuilder::observer`]: invk_builder::ProblemBuilder::observer
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    records: Vec<Reclassification>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records in the order the moves happened.
    #[must_use]
    pub fn records(&self) -> &[Reclassification] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Reclassification> {
        self.records
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> Observer<Event<'a>, Action> for Recorder {
    fn observe(&mut self, event: &Event<'a>) -> Option<Action> {
        let Event::Reclassified { name, declared } = *event;
        self.records.push(Reclassification {
            name: name.to_owned(),
            declared,
        });
        None
    }
}
