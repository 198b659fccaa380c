//! Reusable observers for the invk problem builder.
//!
//! Each type implements [`Observer`] for the builder's [`Event`] and
//! [`Action`], so it can be handed to [`ProblemBuilder::with_observer`]:
//!
//! - [`LogReclassifications`]: logs every move to the linear group
//! - [`Recorder`]: keeps a [`Reclassification`] record of every move
//! - [`Strict`]: rejects every move, so affine constraints must be registered
//!   with [`ProblemBuilder::add_linear_constraint`]
//!
//! [`Observer`]: invk_core::Observer
//! [`Event`]: invk_builder::Event
//! [`Action`]: invk_builder::Action
//! [`ProblemBuilder::with_observer`]: invk_builder::ProblemBuilder::with_observer
//! [`ProblemBuilder::add_linear_constraint`]: invk_builder::ProblemBuilder::add_linear_constraint

mod log;
mod record;
mod strict;

pub use log::LogReclassifications;
pub use record::{Reclassification, Recorder};
pub use strict::Strict;
