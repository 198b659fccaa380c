//! A reference symbolic engine for the invk problem builder.
//!
//! [`Sx`] is a dense matrix of shared scalar expressions. [`SxEngine`]
//! implements [`SymbolicEngine`] on top of it:
//!
//! - exact affine/quadratic tests by polynomial-degree analysis of the
//!   expression DAG (never by sampling)
//! - forward symbolic differentiation for jacobians
//! - compilation into a straight-line [`Function`] tape
//!
//! # Example
//!
//! ```
//! use invk_core::{Shape, SymbolicEngine};
//! use invk_symbolic::SxEngine;
//!
//! let engine = SxEngine;
//! let x = engine.symbol("x", Shape::column(2));
//! let f = x.dot(&x);
//!
//! assert!(engine.is_quadratic(&f, &x));
//! assert!(!engine.is_affine(&f, &x));
//!
//! let df = engine.jacobian(&f, &x).unwrap();
//! let fun = engine.compile("df", &[&x], &df).unwrap();
//! let value = fun.call(&[&[1.0, 2.0]]).unwrap();
//! assert_eq!(value, ndarray::array![[2.0, 4.0]]);
//! ```
//!
//! [`SymbolicEngine`]: invk_core::SymbolicEngine

mod compile;
mod degree;
mod diff;
mod error;
mod node;
mod sx;

pub use compile::Function;
pub use error::Error;
pub use invk_core::Shape;
pub use node::{Scalar, Symbol};
pub use sx::Sx;

use invk_core::SymbolicEngine;

use degree::Degrees;

/// The [`SymbolicEngine`] backed by [`Sx`] expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SxEngine;

impl SymbolicEngine for SxEngine {
    type Expr = Sx;
    type Function = Function;
    type Error = Error;

    fn symbol(&self, name: &str, shape: Shape) -> Sx {
        Sx::sym(name, shape.rows, shape.cols)
    }

    fn zeros(&self, shape: Shape) -> Sx {
        Sx::zeros(shape.rows, shape.cols)
    }

    fn sub(&self, lhs: &Sx, rhs: &Sx) -> Result<Sx, Error> {
        lhs.try_sub(rhs)
    }

    fn sum(&self, terms: &[&Sx]) -> Sx {
        Sx::vertcat(terms.iter().copied()).sum()
    }

    fn vertcat(&self, exprs: &[&Sx]) -> Sx {
        Sx::vertcat(exprs.iter().copied())
    }

    fn column(&self, expr: &Sx, col: usize) -> Result<Sx, Error> {
        expr.column(col)
    }

    fn is_affine(&self, expr: &Sx, vars: &Sx) -> bool {
        Degrees::new(vars).all_at_most(expr, 1)
    }

    fn is_quadratic(&self, expr: &Sx, vars: &Sx) -> bool {
        Degrees::new(vars).all_at_most(expr, 2)
    }

    fn jacobian(&self, expr: &Sx, vars: &Sx) -> Result<Sx, Error> {
        diff::jacobian(expr, vars)
    }

    fn compile(&self, name: &str, inputs: &[&Sx], output: &Sx) -> Result<Function, Error> {
        Function::compile(name, inputs, output)
    }
}
