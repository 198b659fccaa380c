use std::{
    collections::HashSet,
    mem,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(0);

static ZERO: LazyLock<Scalar> = LazyLock::new(|| Scalar::wrap(Node::Const(0.0)));
static ONE: LazyLock<Scalar> = LazyLock::new(|| Scalar::wrap(Node::Const(1.0)));

/// A unique symbolic variable.
///
/// Two symbols are the same variable only if they come from the same call to
/// [`Symbol::fresh`], regardless of their names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u64,
    name: Arc<str>,
}

impl Symbol {
    pub(crate) fn fresh(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Returns the display name of the symbol.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl UnaryOp {
    pub(crate) fn apply(self, a: f64) -> f64 {
        match self {
            Self::Neg => -a,
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Sqrt => a.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Node {
    Const(f64),
    Symbol(Symbol),
    Unary(UnaryOp, Scalar),
    Binary(BinaryOp, Scalar, Scalar),
    Powi(Scalar, i32),
}

impl Node {
    /// Moves the operands out, leaving the shared zero in their place.
    fn take_operands(&mut self, out: &mut Vec<Scalar>) {
        match self {
            Self::Const(_) | Self::Symbol(_) => {}
            Self::Unary(_, a) | Self::Powi(a, _) => out.push(mem::replace(a, Scalar::zero())),
            Self::Binary(_, a, b) => {
                out.push(mem::replace(a, Scalar::zero()));
                out.push(mem::replace(b, Scalar::zero()));
            }
        }
    }
}

// Long chains such as `cost = cost + term` would otherwise drop recursively.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_operands(&mut pending);
        while let Some(scalar) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(scalar.0) {
                node.take_operands(&mut pending);
            }
        }
    }
}

/// A shared scalar expression node.
///
/// Scalars form a DAG: cloning is cheap and shares the subexpression.
/// Construction folds constants and drops additive zeros and multiplicative
/// ones, so derivatives of polynomials stay small.
#[derive(Debug, Clone)]
pub struct Scalar(Arc<Node>);

impl Scalar {
    fn wrap(node: Node) -> Self {
        Self(Arc::new(node))
    }

    pub(crate) fn node(&self) -> &Node {
        &self.0
    }

    /// Identity of the shared node, used to memoize DAG traversals.
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn constant(value: f64) -> Self {
        if value.to_bits() == 0 {
            Self::zero()
        } else if value == 1.0 {
            Self::one()
        } else {
            Self::wrap(Node::Const(value))
        }
    }

    pub(crate) fn symbol(symbol: Symbol) -> Self {
        Self::wrap(Node::Symbol(symbol))
    }

    /// Returns the shared `0` node.
    pub(crate) fn zero() -> Self {
        ZERO.clone()
    }

    /// Returns the shared `1` node.
    pub(crate) fn one() -> Self {
        ONE.clone()
    }

    /// Returns the operands of this node.
    pub(crate) fn operands(&self) -> impl Iterator<Item = &Scalar> {
        let (a, b) = match self.node() {
            Node::Const(_) | Node::Symbol(_) => (None, None),
            Node::Unary(_, a) | Node::Powi(a, _) => (Some(a), None),
            Node::Binary(_, a, b) => (Some(a), Some(b)),
        };
        a.into_iter().chain(b)
    }

    /// Returns the value if this node is a constant.
    #[must_use]
    pub fn as_constant(&self) -> Option<f64> {
        match self.node() {
            Node::Const(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the symbol if this node is a bare symbol.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.node() {
            Node::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    fn is(&self, value: f64) -> bool {
        self.as_constant() == Some(value)
    }

    pub(crate) fn unary(op: UnaryOp, a: &Self) -> Self {
        if let Some(value) = a.as_constant() {
            return Self::constant(op.apply(value));
        }
        if op == UnaryOp::Neg {
            if let Node::Unary(UnaryOp::Neg, inner) = a.node() {
                return inner.clone();
            }
        }
        Self::wrap(Node::Unary(op, a.clone()))
    }

    pub(crate) fn binary(op: BinaryOp, a: &Self, b: &Self) -> Self {
        if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
            return Self::constant(op.apply(x, y));
        }
        match op {
            BinaryOp::Add if a.is(0.0) => b.clone(),
            BinaryOp::Add | BinaryOp::Sub if b.is(0.0) => a.clone(),
            BinaryOp::Sub if a.is(0.0) => Self::unary(UnaryOp::Neg, b),
            BinaryOp::Mul if a.is(0.0) || b.is(0.0) => Self::zero(),
            BinaryOp::Mul if a.is(1.0) => b.clone(),
            BinaryOp::Mul | BinaryOp::Div if b.is(1.0) => a.clone(),
            BinaryOp::Div if a.is(0.0) => Self::zero(),
            _ => Self::wrap(Node::Binary(op, a.clone(), b.clone())),
        }
    }

    pub(crate) fn powi(a: &Self, n: i32) -> Self {
        match n {
            0 => Self::one(),
            1 => a.clone(),
            _ => match a.as_constant() {
                Some(value) => Self::constant(value.powi(n)),
                None => Self::wrap(Node::Powi(a.clone(), n)),
            },
        }
    }

    pub(crate) fn add(&self, other: &Self) -> Self {
        Self::binary(BinaryOp::Add, self, other)
    }

    pub(crate) fn sub(&self, other: &Self) -> Self {
        Self::binary(BinaryOp::Sub, self, other)
    }

    pub(crate) fn mul(&self, other: &Self) -> Self {
        Self::binary(BinaryOp::Mul, self, other)
    }

    pub(crate) fn div(&self, other: &Self) -> Self {
        Self::binary(BinaryOp::Div, self, other)
    }

    pub(crate) fn neg(&self) -> Self {
        Self::unary(UnaryOp::Neg, self)
    }

    /// Sums scalars pairwise, keeping the expression depth logarithmic.
    pub(crate) fn sum(terms: &[Self]) -> Self {
        match terms {
            [] => Self::zero(),
            [only] => only.clone(),
            _ => {
                let (left, right) = terms.split_at(terms.len() / 2);
                Self::sum(left).add(&Self::sum(right))
            }
        }
    }
}

/// Returns every node reachable from `root`, operands before the nodes that
/// use them, each once.
///
/// Nodes for which `known` returns `true` are left out along with everything
/// only reachable through them.
pub(crate) fn post_order<'a>(root: &'a Scalar, known: impl Fn(&Scalar) -> bool) -> Vec<&'a Scalar> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root, false)];
    while let Some((scalar, expanded)) = stack.pop() {
        if expanded {
            order.push(scalar);
        } else if !known(scalar) && visited.insert(scalar.key()) {
            stack.push((scalar, true));
            stack.extend(scalar.operands().map(|operand| (operand, false)));
        }
    }
    order
}
