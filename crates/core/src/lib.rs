//! Core traits and containers for the invk problem builder.
//!
//! This crate defines the shared abstractions that the builder, symbolic
//! engines, and observers build on:
//!
//! - [`SymbolicEngine`]: the capability a symbolic/autodiff engine provides:
//!   symbol creation, exact affine/quadratic tests, jacobians, and compilation
//! - [`Function`]: a compiled function evaluable at numeric inputs
//! - [`SymbolContainer`]: an insertion-ordered map of named symbolic blocks
//! - [`RobotModel`]: supplies a robot's degree-of-freedom count
//! - [`Observer`]: receives builder events and optionally returns actions

mod container;
mod engine;
mod observer;
mod robot;
mod shape;

pub use container::{Block, ContainerError, SymbolContainer};
pub use engine::{Function, SymbolicEngine};
pub use observer::Observer;
pub use robot::RobotModel;
pub use shape::{Shape, Shaped};
