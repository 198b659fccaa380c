use std::fmt::Debug;

use ndarray::Array2;

use crate::{Shape, Shaped};

/// The capability a symbolic computation engine provides to the builder.
///
/// The builder never inspects expressions itself. It creates symbols, combines
/// registered expressions, asks exact structural questions (is this affine or
/// quadratic in the decision vector?), differentiates, and compiles, all
/// through this trait.
///
/// Implementations must answer [`is_affine`](Self::is_affine) and
/// [`is_quadratic`](Self::is_quadratic) exactly, from the expression
/// structure, never by numeric sampling.
pub trait SymbolicEngine {
    /// A shaped symbolic expression.
    type Expr: Shaped + Clone + Debug;

    /// A compiled function produced by [`compile`](Self::compile).
    type Function: Function;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a named array of fresh symbols.
    fn symbol(&self, name: &str, shape: Shape) -> Self::Expr;

    /// Creates a constant array of zeros.
    fn zeros(&self, shape: Shape) -> Self::Expr;

    /// Returns `lhs - rhs`, element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the shapes are incompatible.
    fn sub(&self, lhs: &Self::Expr, rhs: &Self::Expr) -> Result<Self::Expr, Self::Error>;

    /// Returns the scalar sum of every element of every term.
    ///
    /// The sum of no terms is the constant zero.
    fn sum(&self, terms: &[&Self::Expr]) -> Self::Expr;

    /// Flattens each expression row-major and stacks the results into one
    /// column vector.
    ///
    /// Stacking no expressions yields an empty `(0, 1)` vector.
    fn vertcat(&self, exprs: &[&Self::Expr]) -> Self::Expr;

    /// Returns column `col` of an expression.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if `col` is out of range.
    fn column(&self, expr: &Self::Expr, col: usize) -> Result<Self::Expr, Self::Error>;

    /// Returns `true` if every element of `expr` is affine in `vars`.
    fn is_affine(&self, expr: &Self::Expr, vars: &Self::Expr) -> bool;

    /// Returns `true` if every element of `expr` is at most quadratic in `vars`.
    fn is_quadratic(&self, expr: &Self::Expr, vars: &Self::Expr) -> bool;

    /// Returns the jacobian of `expr` with respect to `vars`.
    ///
    /// Row `i` holds the derivatives of the `i`-th element of `expr` in
    /// row-major order, column `j` the derivative with respect to the `j`-th
    /// element of `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if `vars` is not purely symbolic.
    fn jacobian(&self, expr: &Self::Expr, vars: &Self::Expr) -> Result<Self::Expr, Self::Error>;

    /// Compiles `output` into a function of `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if an input is not purely symbolic or the
    /// output depends on symbols that no input provides.
    fn compile(
        &self,
        name: &str,
        inputs: &[&Self::Expr],
        output: &Self::Expr,
    ) -> Result<Self::Function, Self::Error>;
}

/// A compiled function evaluable at numeric inputs.
pub trait Function {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the name given at compilation.
    fn name(&self) -> &str;

    /// Returns the shape of the output.
    fn shape(&self) -> Shape;

    /// Evaluates the function, one flat slice per compiled input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the number or length of arguments does not
    /// match the compiled inputs.
    fn call(&self, args: &[&[f64]]) -> Result<Array2<f64>, Self::Error>;
}
