use invk_builder::{Action, Event};
use invk_core::Observer;
use tracing::info;

/// Logs each reclassification at info level and never acts.
///
/// The builder already emits a warning for every move. This observer adds an
/// info-level record carrying an optional label, which helps tell apart
/// several builders logging to the same subscriber.
#[derive(Debug, Clone, Default)]
pub struct LogReclassifications {
    label: Option<String>,
}

impl LogReclassifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a logger that attaches `label` to every record.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl<'a> Observer<Event<'a>, Action> for LogReclassifications {
    fn observe(&mut self, event: &Event<'a>) -> Option<Action> {
        let Event::Reclassified { name, declared } = *event;
        match &self.label {
            Some(label) => info!(label = %label, constraint = name, %declared, "moved to linear"),
            None => info!(constraint = name, %declared, "moved to linear"),
        }
        None
    }
}
