use invk_core::Shape;
use thiserror::Error;

/// Errors produced by the reference symbolic engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("cannot {op} shapes {lhs} and {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    #[error("index ({row}, {col}) is out of bounds for shape {shape}")]
    OutOfBounds { row: usize, col: usize, shape: Shape },

    #[error("expected a purely symbolic array")]
    NotSymbolic,

    #[error("'{function}' depends on symbol '{symbol}', which no input provides")]
    FreeSymbol { function: String, symbol: String },

    #[error("'{function}' takes {expected} arguments, got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {index} of '{function}' needs {expected} values, got {actual}")]
    ArgumentLength {
        function: String,
        index: usize,
        expected: usize,
        actual: usize,
    },
}
