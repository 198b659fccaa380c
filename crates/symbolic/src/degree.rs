use std::collections::{HashMap, HashSet};

use crate::{
    Sx,
    node::{BinaryOp, Node, Scalar, UnaryOp, post_order},
};

/// Polynomial degree of expressions with respect to a set of symbols.
///
/// `None` means the expression is not a polynomial in those symbols, for
/// example `sin(x)` or `1 / x`. Functions of expressions that do not involve
/// the symbols are constants (degree zero).
pub(crate) struct Degrees {
    vars: HashSet<u64>,
    memo: HashMap<usize, Option<u32>>,
}

impl Degrees {
    /// Tracks the degree in every symbolic element of `vars`.
    ///
    /// Non-symbolic elements of `vars` are ignored.
    pub(crate) fn new(vars: &Sx) -> Self {
        let vars = vars
            .elements()
            .iter()
            .filter_map(Scalar::as_symbol)
            .map(|symbol| symbol.id())
            .collect();
        Self {
            vars,
            memo: HashMap::new(),
        }
    }

    /// Returns `true` if every element of `expr` has degree at most `max`.
    pub(crate) fn all_at_most(&mut self, expr: &Sx, max: u32) -> bool {
        expr.elements()
            .iter()
            .all(|e| self.degree(e).is_some_and(|d| d <= max))
    }

    pub(crate) fn degree(&mut self, scalar: &Scalar) -> Option<u32> {
        if let Some(&known) = self.memo.get(&scalar.key()) {
            return known;
        }
        for node in post_order(scalar, |n| self.memo.contains_key(&n.key())) {
            let degree = self.degree_of_node(node);
            self.memo.insert(node.key(), degree);
        }
        self.memo[&scalar.key()]
    }

    /// Degree of `scalar` given the memoized degrees of its operands.
    fn degree_of_node(&self, scalar: &Scalar) -> Option<u32> {
        let of = |operand: &Scalar| self.memo[&operand.key()];
        match scalar.node() {
            Node::Const(_) => Some(0),
            Node::Symbol(symbol) => Some(u32::from(self.vars.contains(&symbol.id()))),
            Node::Unary(UnaryOp::Neg, a) => of(a),
            Node::Unary(_, a) => constant_only(of(a)),
            Node::Binary(BinaryOp::Add | BinaryOp::Sub, a, b) => Some(of(a)?.max(of(b)?)),
            Node::Binary(BinaryOp::Mul, a, b) => Some(of(a)?.saturating_add(of(b)?)),
            Node::Binary(BinaryOp::Div, a, b) => match of(b) {
                Some(0) => of(a),
                _ => None,
            },
            Node::Powi(a, n) => match u32::try_from(*n) {
                Ok(n) => of(a).map(|d| d.saturating_mul(n)),
                Err(_) => constant_only(of(a)),
            },
        }
    }
}

/// Degree of a non-polynomial function of an operand: constant if it is.
fn constant_only(degree: Option<u32>) -> Option<u32> {
    degree.filter(|&d| d == 0)
}
