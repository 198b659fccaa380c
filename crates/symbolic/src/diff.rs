use std::collections::HashMap;

use invk_core::Shape;

use crate::{
    Error, Sx,
    node::{BinaryOp, Node, Scalar, Symbol, UnaryOp, post_order},
};

/// Returns the jacobian of `expr` with respect to the symbols in `vars`.
///
/// The result has one row per element of `expr` (row-major) and one column
/// per element of `vars` (row-major). Entries whose element does not depend
/// on the column's symbol are the shared zero and are never differentiated.
///
/// # Errors
///
/// Returns [`Error::NotSymbolic`] if any element of `vars` is not a bare
/// symbol.
pub(crate) fn jacobian(expr: &Sx, vars: &Sx) -> Result<Sx, Error> {
    let symbols: Vec<&Symbol> = vars
        .elements()
        .iter()
        .map(|e| e.as_symbol().ok_or(Error::NotSymbolic))
        .collect::<Result<_, _>>()?;

    let (m, n) = (expr.elements().len(), symbols.len());
    let mut deps = Dependencies::new(&symbols);
    for element in expr.elements() {
        deps.analyze(element);
    }

    let mut elements = vec![Scalar::zero(); m * n];
    for (j, symbol) in symbols.into_iter().enumerate() {
        let mut diff = Differentiator::new(symbol, j, &deps);
        for (i, element) in expr.elements().iter().enumerate() {
            if deps.contains(element, j) {
                elements[i * n + j] = diff.derivative(element);
            }
        }
    }

    Ok(Sx::from_elements(Shape::new(m, n), elements))
}

/// The jacobian columns each node depends on, as a bitset per node.
struct Dependencies {
    columns: HashMap<u64, Vec<usize>>,
    words: usize,
    memo: HashMap<usize, Vec<u64>>,
}

impl Dependencies {
    fn new(symbols: &[&Symbol]) -> Self {
        let mut columns: HashMap<u64, Vec<usize>> = HashMap::new();
        for (j, symbol) in symbols.iter().enumerate() {
            columns.entry(symbol.id()).or_default().push(j);
        }
        Self {
            columns,
            words: symbols.len().div_ceil(64),
            memo: HashMap::new(),
        }
    }

    fn analyze(&mut self, root: &Scalar) {
        for node in post_order(root, |n| self.memo.contains_key(&n.key())) {
            let mut bits = vec![0_u64; self.words];
            if let Node::Symbol(symbol) = node.node() {
                for &j in self.columns.get(&symbol.id()).into_iter().flatten() {
                    bits[j / 64] |= 1 << (j % 64);
                }
            }
            for operand in node.operands() {
                for (word, other) in bits.iter_mut().zip(&self.memo[&operand.key()]) {
                    *word |= other;
                }
            }
            self.memo.insert(node.key(), bits);
        }
    }

    /// Returns `true` if the analyzed `scalar` depends on column `j`.
    fn contains(&self, scalar: &Scalar, j: usize) -> bool {
        self.memo
            .get(&scalar.key())
            .is_some_and(|bits| bits[j / 64] & (1 << (j % 64)) != 0)
    }
}

/// Forward symbolic differentiation with respect to a single symbol.
///
/// Nodes that do not depend on the symbol are skipped and their derivative
/// is the shared zero.
struct Differentiator<'a> {
    wrt: &'a Symbol,
    column: usize,
    deps: &'a Dependencies,
    memo: HashMap<usize, Scalar>,
}

impl<'a> Differentiator<'a> {
    fn new(wrt: &'a Symbol, column: usize, deps: &'a Dependencies) -> Self {
        Self {
            wrt,
            column,
            deps,
            memo: HashMap::new(),
        }
    }

    fn derivative(&mut self, root: &Scalar) -> Scalar {
        let skip = |n: &Scalar| {
            self.memo.contains_key(&n.key()) || !self.deps.contains(n, self.column)
        };
        for node in post_order(root, skip) {
            let d = self.derivative_of_node(node);
            self.memo.insert(node.key(), d);
        }
        self.known(root)
    }

    fn known(&self, scalar: &Scalar) -> Scalar {
        self.memo.get(&scalar.key()).cloned().unwrap_or_else(Scalar::zero)
    }

    /// Derivative of `scalar` given the memoized derivatives of its operands.
    fn derivative_of_node(&self, scalar: &Scalar) -> Scalar {
        match scalar.node() {
            Node::Symbol(symbol) if symbol == self.wrt => Scalar::one(),
            Node::Const(_) | Node::Symbol(_) => Scalar::zero(),
            Node::Unary(op, a) => chain_unary(*op, a, &self.known(a)),
            Node::Binary(op, a, b) => {
                let (da, db) = (self.known(a), self.known(b));
                match op {
                    BinaryOp::Add => da.add(&db),
                    BinaryOp::Sub => da.sub(&db),
                    BinaryOp::Mul => da.mul(b).add(&a.mul(&db)),
                    BinaryOp::Div => da
                        .div(b)
                        .sub(&a.mul(&db).div(&Scalar::powi(b, 2))),
                }
            }
            Node::Powi(a, n) => power_rule(a, *n, &self.known(a)),
        }
    }
}

fn power_rule(a: &Scalar, n: i32, da: &Scalar) -> Scalar {
    let lowered = match n.checked_sub(1) {
        Some(m) => Scalar::powi(a, m),
        None => Scalar::powi(a, n).div(a),
    };
    Scalar::constant(f64::from(n)).mul(&lowered).mul(da)
}

fn chain_unary(op: UnaryOp, a: &Scalar, da: &Scalar) -> Scalar {
    if da.as_constant() == Some(0.0) {
        return Scalar::zero();
    }
    match op {
        UnaryOp::Neg => da.neg(),
        UnaryOp::Sin => Scalar::unary(UnaryOp::Cos, a).mul(da),
        UnaryOp::Cos => Scalar::unary(UnaryOp::Sin, a).neg().mul(da),
        UnaryOp::Tan => da.div(&Scalar::powi(&Scalar::unary(UnaryOp::Cos, a), 2)),
        UnaryOp::Exp => Scalar::unary(UnaryOp::Exp, a).mul(da),
        UnaryOp::Ln => da.div(a),
        UnaryOp::Sqrt => da.div(&Scalar::constant(2.0).mul(&Scalar::unary(UnaryOp::Sqrt, a))),
    }
}
