use std::fmt;

/// Events emitted by the problem builder.
///
/// A constraint registered as an inequality or equality that turns out to be
/// affine in the decision variables is moved to the linear group. The builder
/// reports each such move before making it, so observers can record it or
/// veto it with [`Action::Reject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// A constraint is about to be stored as linear instead of as declared.
    Reclassified {
        /// The name the constraint was registered under.
        name: &'a str,

        /// The group the caller asked for.
        declared: Declared,
    },
}

impl Event<'_> {
    /// Returns the name of the constraint the event concerns.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Reclassified { name, .. } => name,
        }
    }
}

/// The constraint group a caller registered a constraint into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub enum Declared {
    Inequality,
    Equality,
}

impl fmt::Display for Declared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inequality => f.write_str("inequality"),
            Self::Equality => f.write_str("equality"),
        }
    }
}

/// Actions an observer can take in response to an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fail the registration instead of moving the constraint.
    ///
    /// The call returns [`Error::ReclassificationRejected`] and the builder
    /// is left unchanged.
    ///
    /// [`Error::ReclassificationRejected`]: crate::Error::ReclassificationRejected
    Reject,
}
