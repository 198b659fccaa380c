use std::ops::{Add, Div, Mul, Neg, Sub};

use invk_core::{Shape, Shaped};
use ndarray::Array2;

use crate::{
    Error,
    node::{BinaryOp, Scalar, Symbol, UnaryOp},
};

/// A dense matrix of symbolic scalar expressions, stored row-major.
///
/// Arithmetic operators work element-wise. A `1 × 1` operand broadcasts
/// against any shape; other mismatched shapes panic, as array operators do.
/// Use [`Sx::try_add`] and its siblings for fallible versions.
///
/// # Example
///
/// ```
/// use invk_symbolic::Sx;
///
/// let x = Sx::sym("x", 2, 1);
/// let f = x.dot(&x) + 1.0;
/// assert_eq!(f.shape().numel(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Sx {
    shape: Shape,
    elements: Vec<Scalar>,
}

impl Sx {
    pub(crate) fn from_elements(shape: Shape, elements: Vec<Scalar>) -> Self {
        debug_assert_eq!(shape.numel(), elements.len());
        Self { shape, elements }
    }

    /// Creates a `rows × cols` array of fresh symbols.
    ///
    /// A scalar symbol takes `name` as is; array elements are named
    /// `name[i,j]`.
    #[must_use]
    pub fn sym(name: &str, rows: usize, cols: usize) -> Self {
        let shape = Shape::new(rows, cols);
        let elements = if shape.is_scalar() {
            vec![Scalar::symbol(Symbol::fresh(name))]
        } else {
            (0..rows)
                .flat_map(|i| (0..cols).map(move |j| (i, j)))
                .map(|(i, j)| Scalar::symbol(Symbol::fresh(format!("{name}[{i},{j}]"))))
                .collect()
        };
        Self::from_elements(shape, elements)
    }

    /// Returns the dimensions of the array.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Creates a constant array filled with `value`.
    #[must_use]
    pub fn full(rows: usize, cols: usize, value: f64) -> Self {
        let shape = Shape::new(rows, cols);
        Self::from_elements(shape, vec![Scalar::constant(value); shape.numel()])
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::full(rows, cols, 0.0)
    }

    #[must_use]
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::full(rows, cols, 1.0)
    }

    /// Creates an `n × n` identity matrix.
    #[must_use]
    pub fn eye(n: usize) -> Self {
        Array2::<f64>::eye(n).into()
    }

    /// Creates a constant matrix from rows of values.
    #[must_use]
    pub fn from_rows<const C: usize>(rows: &[[f64; C]]) -> Self {
        let shape = Shape::new(rows.len(), C);
        let elements = rows.iter().flatten().map(|&v| Scalar::constant(v)).collect();
        Self::from_elements(shape, elements)
    }

    /// Creates a constant column vector.
    #[must_use]
    pub fn column_vector(values: &[f64]) -> Self {
        let elements = values.iter().map(|&v| Scalar::constant(v)).collect();
        Self::from_elements(Shape::column(values.len()), elements)
    }

    /// Stacks arrays into one column vector, each flattened row-major.
    #[must_use]
    pub fn vertcat<'a>(parts: impl IntoIterator<Item = &'a Sx>) -> Self {
        let elements: Vec<Scalar> = parts
            .into_iter()
            .flat_map(|part| part.elements.iter().cloned())
            .collect();
        Self::from_elements(Shape::column(elements.len()), elements)
    }

    /// Returns the element at row `i`, column `j` as a `1 × 1` array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the index is outside the array.
    pub fn get(&self, i: usize, j: usize) -> Result<Self, Error> {
        self.check_index(i, j)?;
        let element = self.elements[i * self.shape.cols + j].clone();
        Ok(Self::from_elements(Shape::SCALAR, vec![element]))
    }

    /// Returns column `j` as a column vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `j` is not a valid column.
    pub fn column(&self, j: usize) -> Result<Self, Error> {
        if j >= self.shape.cols {
            return Err(self.out_of_bounds(0, j));
        }
        let elements = (0..self.shape.rows)
            .map(|i| self.elements[i * self.shape.cols + j].clone())
            .collect();
        Ok(Self::from_elements(Shape::column(self.shape.rows), elements))
    }

    /// Returns row `i` as a row vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `i` is not a valid row.
    pub fn row(&self, i: usize) -> Result<Self, Error> {
        if i >= self.shape.rows {
            return Err(self.out_of_bounds(i, 0));
        }
        let start = i * self.shape.cols;
        let elements = self.elements[start..start + self.shape.cols].to_vec();
        Ok(Self::from_elements(Shape::new(1, self.shape.cols), elements))
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let Shape { rows, cols } = self.shape;
        let elements = (0..cols)
            .flat_map(|j| (0..rows).map(move |i| (i, j)))
            .map(|(i, j)| self.elements[i * cols + j].clone())
            .collect();
        Self::from_elements(Shape::new(cols, rows), elements)
    }

    /// Returns the elements as a column vector, row-major.
    #[must_use]
    pub fn vec(&self) -> Self {
        Self::from_elements(Shape::column(self.elements.len()), self.elements.clone())
    }

    /// Returns the sum of all elements as a `1 × 1` array.
    #[must_use]
    pub fn sum(&self) -> Self {
        Self::from_elements(Shape::SCALAR, vec![Scalar::sum(&self.elements)])
    }

    /// Returns the inner product of two arrays with the same number of
    /// elements.
    ///
    /// # Panics
    ///
    /// Panics if the element counts differ.
    #[must_use]
    pub fn dot(&self, other: &Self) -> Self {
        assert_eq!(
            self.elements.len(),
            other.elements.len(),
            "cannot dot shapes {} and {}",
            self.shape,
            other.shape
        );
        let products: Vec<Scalar> = self
            .elements
            .iter()
            .zip(&other.elements)
            .map(|(a, b)| a.mul(b))
            .collect();
        Self::from_elements(Shape::SCALAR, vec![Scalar::sum(&products)])
    }

    /// Returns the matrix product `self · other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the inner dimensions differ.
    pub fn matmul(&self, other: &Self) -> Result<Self, Error> {
        if self.shape.cols != other.shape.rows {
            return Err(Error::ShapeMismatch {
                op: "multiply",
                lhs: self.shape,
                rhs: other.shape,
            });
        }
        let (n, m, p) = (self.shape.rows, self.shape.cols, other.shape.cols);
        let elements = (0..n)
            .flat_map(|i| (0..p).map(move |j| (i, j)))
            .map(|(i, j)| {
                let products: Vec<Scalar> = (0..m)
                    .map(|k| self.elements[i * m + k].mul(&other.elements[k * p + j]))
                    .collect();
                Scalar::sum(&products)
            })
            .collect();
        Ok(Self::from_elements(Shape::new(n, p), elements))
    }

    #[must_use]
    pub fn sin(&self) -> Self {
        self.map(UnaryOp::Sin)
    }

    #[must_use]
    pub fn cos(&self) -> Self {
        self.map(UnaryOp::Cos)
    }

    #[must_use]
    pub fn tan(&self) -> Self {
        self.map(UnaryOp::Tan)
    }

    #[must_use]
    pub fn exp(&self) -> Self {
        self.map(UnaryOp::Exp)
    }

    #[must_use]
    pub fn ln(&self) -> Self {
        self.map(UnaryOp::Ln)
    }

    #[must_use]
    pub fn sqrt(&self) -> Self {
        self.map(UnaryOp::Sqrt)
    }

    /// Raises every element to an integer power.
    #[must_use]
    pub fn powi(&self, n: i32) -> Self {
        let elements = self.elements.iter().map(|e| Scalar::powi(e, n)).collect();
        Self::from_elements(self.shape, elements)
    }

    /// Adds element-wise, broadcasting `1 × 1` operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ and neither
    /// operand is a scalar.
    pub fn try_add(&self, other: &Self) -> Result<Self, Error> {
        self.try_zip(other, BinaryOp::Add)
    }

    /// Subtracts element-wise, broadcasting `1 × 1` operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ and neither
    /// operand is a scalar.
    pub fn try_sub(&self, other: &Self) -> Result<Self, Error> {
        self.try_zip(other, BinaryOp::Sub)
    }

    /// Multiplies element-wise, broadcasting `1 × 1` operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ and neither
    /// operand is a scalar.
    pub fn try_mul(&self, other: &Self) -> Result<Self, Error> {
        self.try_zip(other, BinaryOp::Mul)
    }

    /// Divides element-wise, broadcasting `1 × 1` operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ and neither
    /// operand is a scalar.
    pub fn try_div(&self, other: &Self) -> Result<Self, Error> {
        self.try_zip(other, BinaryOp::Div)
    }

    fn try_zip(&self, other: &Self, op: BinaryOp) -> Result<Self, Error> {
        let (shape, elements) = if self.shape == other.shape {
            let elements = self
                .elements
                .iter()
                .zip(&other.elements)
                .map(|(a, b)| Scalar::binary(op, a, b))
                .collect();
            (self.shape, elements)
        } else if other.shape.is_scalar() {
            let b = &other.elements[0];
            let elements = self.elements.iter().map(|a| Scalar::binary(op, a, b)).collect();
            (self.shape, elements)
        } else if self.shape.is_scalar() {
            let a = &self.elements[0];
            let elements = other.elements.iter().map(|b| Scalar::binary(op, a, b)).collect();
            (other.shape, elements)
        } else {
            return Err(Error::ShapeMismatch {
                op: op.verb(),
                lhs: self.shape,
                rhs: other.shape,
            });
        };
        Ok(Self::from_elements(shape, elements))
    }

    /// Returns `true` if every element is a bare symbol.
    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        self.elements.iter().all(|e| e.as_symbol().is_some())
    }

    /// Returns the numeric value if every element is a constant.
    #[must_use]
    pub fn to_array(&self) -> Option<Array2<f64>> {
        let values: Option<Vec<f64>> = self.elements.iter().map(Scalar::as_constant).collect();
        Array2::from_shape_vec((self.shape.rows, self.shape.cols), values?).ok()
    }

    /// Returns the scalar elements in row-major order.
    #[must_use]
    pub fn elements(&self) -> &[Scalar] {
        &self.elements
    }

    fn map(&self, op: UnaryOp) -> Self {
        let elements = self.elements.iter().map(|e| Scalar::unary(op, e)).collect();
        Self::from_elements(self.shape, elements)
    }

    fn check_index(&self, i: usize, j: usize) -> Result<(), Error> {
        if i < self.shape.rows && j < self.shape.cols {
            Ok(())
        } else {
            Err(self.out_of_bounds(i, j))
        }
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::OutOfBounds {
            row,
            col,
            shape: self.shape,
        }
    }

    fn zip_or_panic(&self, other: &Self, op: BinaryOp) -> Self {
        self.try_zip(other, op).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl BinaryOp {
    fn verb(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "subtract",
            Self::Mul => "multiply",
            Self::Div => "divide",
        }
    }
}

impl Shaped for Sx {
    fn shape(&self) -> Shape {
        self.shape
    }
}

impl From<f64> for Sx {
    fn from(value: f64) -> Self {
        Self::full(1, 1, value)
    }
}

impl From<Array2<f64>> for Sx {
    fn from(values: Array2<f64>) -> Self {
        let (rows, cols) = values.dim();
        let elements = values.iter().map(|&v| Scalar::constant(v)).collect();
        Self::from_elements(Shape::new(rows, cols), elements)
    }
}

impl Neg for &Sx {
    type Output = Sx;

    fn neg(self) -> Sx {
        self.map(UnaryOp::Neg)
    }
}

impl Neg for Sx {
    type Output = Sx;

    fn neg(self) -> Sx {
        -&self
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<&Sx> for &Sx {
            type Output = Sx;

            fn $method(self, rhs: &Sx) -> Sx {
                self.zip_or_panic(rhs, $op)
            }
        }

        impl $trait<Sx> for Sx {
            type Output = Sx;

            fn $method(self, rhs: Sx) -> Sx {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Sx> for Sx {
            type Output = Sx;

            fn $method(self, rhs: &Sx) -> Sx {
                (&self).$method(rhs)
            }
        }

        impl $trait<Sx> for &Sx {
            type Output = Sx;

            fn $method(self, rhs: Sx) -> Sx {
                self.$method(&rhs)
            }
        }

        impl $trait<f64> for Sx {
            type Output = Sx;

            fn $method(self, rhs: f64) -> Sx {
                (&self).$method(&Sx::from(rhs))
            }
        }

        impl $trait<f64> for &Sx {
            type Output = Sx;

            fn $method(self, rhs: f64) -> Sx {
                self.$method(&Sx::from(rhs))
            }
        }

        impl $trait<Sx> for f64 {
            type Output = Sx;

            fn $method(self, rhs: Sx) -> Sx {
                (&Sx::from(self)).$method(&rhs)
            }
        }

        impl $trait<&Sx> for f64 {
            type Output = Sx;

            fn $method(self, rhs: &Sx) -> Sx {
                (&Sx::from(self)).$method(rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);
