use std::fmt;

/// The dimensions of a two-dimensional symbolic or numeric array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    /// The shape of a scalar.
    pub const SCALAR: Self = Self::new(1, 1);

    /// Creates a new shape.
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Creates the shape of a column vector with `len` elements.
    #[must_use]
    pub const fn column(len: usize) -> Self {
        Self::new(len, 1)
    }

    /// Returns the number of elements.
    #[must_use]
    pub const fn numel(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns `true` if this is the shape of a scalar.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

/// A value with a known two-dimensional shape.
pub trait Shaped {
    /// Returns the shape of the value.
    fn shape(&self) -> Shape;

    /// Returns the number of scalar elements.
    fn numel(&self) -> usize {
        self.shape().numel()
    }
}
