use std::collections::HashMap;

use invk_core::Shape;
use ndarray::Array2;

use crate::{
    Error, Sx,
    node::{BinaryOp, Node, Scalar, UnaryOp, post_order},
};

#[derive(Debug, Clone, Copy)]
enum Instr {
    Input { arg: usize, index: usize },
    Const(f64),
    Unary(UnaryOp, usize),
    Binary(BinaryOp, usize, usize),
    Powi(usize, i32),
}

/// A compiled expression: a straight-line tape evaluated into registers.
///
/// Shared subexpressions are evaluated once per call.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    input_lens: Vec<usize>,
    tape: Vec<Instr>,
    outputs: Vec<usize>,
    shape: Shape,
}

impl Function {
    /// Compiles `output` into a function of the symbolic arrays `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSymbolic`] if an input is not purely symbolic, or
    /// [`Error::FreeSymbol`] if `output` uses a symbol no input provides.
    pub fn compile(name: &str, inputs: &[&Sx], output: &Sx) -> Result<Self, Error> {
        let mut bindings = HashMap::new();
        for (arg, input) in inputs.iter().enumerate() {
            for (index, element) in input.elements().iter().enumerate() {
                let symbol = element.as_symbol().ok_or(Error::NotSymbolic)?;
                bindings.entry(symbol.id()).or_insert((arg, index));
            }
        }

        let mut compiler = Compiler {
            function: name,
            bindings: &bindings,
            registers: HashMap::new(),
            tape: Vec::new(),
        };
        let outputs = output
            .elements()
            .iter()
            .map(|e| compiler.emit(e))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            name: name.to_owned(),
            input_lens: inputs.iter().map(|input| input.elements().len()).collect(),
            tape: compiler.tape,
            outputs,
            shape: output.shape(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of instructions evaluated per call.
    ///
    /// Each distinct node of the compiled expression is one instruction, so
    /// an output made only of the shared zero compiles to a single constant.
    #[must_use]
    pub fn instructions(&self) -> usize {
        self.tape.len()
    }

    /// Evaluates the function, one flat slice per compiled input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentCount`] or [`Error::ArgumentLength`] if the
    /// arguments do not match the compiled inputs.
    pub fn call(&self, args: &[&[f64]]) -> Result<Array2<f64>, Error> {
        if args.len() != self.input_lens.len() {
            return Err(Error::ArgumentCount {
                function: self.name.clone(),
                expected: self.input_lens.len(),
                actual: args.len(),
            });
        }
        for (index, (arg, &expected)) in args.iter().zip(&self.input_lens).enumerate() {
            if arg.len() != expected {
                return Err(Error::ArgumentLength {
                    function: self.name.clone(),
                    index,
                    expected,
                    actual: arg.len(),
                });
            }
        }

        let mut registers = Vec::with_capacity(self.tape.len());
        for instr in &self.tape {
            let value = match *instr {
                Instr::Input { arg, index } => args[arg][index],
                Instr::Const(value) => value,
                Instr::Unary(op, a) => op.apply(registers[a]),
                Instr::Binary(op, a, b) => op.apply(registers[a], registers[b]),
                Instr::Powi(a, n) => f64::powi(registers[a], n),
            };
            registers.push(value);
        }

        let Shape { rows, cols } = self.shape;
        Ok(Array2::from_shape_fn((rows, cols), |(i, j)| {
            registers[self.outputs[i * cols + j]]
        }))
    }
}

impl invk_core::Function for Function {
    type Error = Error;

    fn name(&self) -> &str {
        Function::name(self)
    }

    fn shape(&self) -> Shape {
        Function::shape(self)
    }

    fn call(&self, args: &[&[f64]]) -> Result<Array2<f64>, Error> {
        Function::call(self, args)
    }
}

struct Compiler<'a> {
    function: &'a str,
    bindings: &'a HashMap<u64, (usize, usize)>,
    registers: HashMap<usize, usize>,
    tape: Vec<Instr>,
}

impl Compiler<'_> {
    fn emit(&mut self, root: &Scalar) -> Result<usize, Error> {
        if let Some(&register) = self.registers.get(&root.key()) {
            return Ok(register);
        }

        for scalar in post_order(root, |n| self.registers.contains_key(&n.key())) {
            let instr = match scalar.node() {
                Node::Const(value) => Instr::Const(*value),
                Node::Symbol(symbol) => {
                    let &(arg, index) =
                        self.bindings
                            .get(&symbol.id())
                            .ok_or_else(|| Error::FreeSymbol {
                                function: self.function.to_owned(),
                                symbol: symbol.name().to_owned(),
                            })?;
                    Instr::Input { arg, index }
                }
                Node::Unary(op, a) => Instr::Unary(*op, self.register(a)),
                Node::Binary(op, a, b) => Instr::Binary(*op, self.register(a), self.register(b)),
                Node::Powi(a, n) => Instr::Powi(self.register(a), *n),
            };
            self.registers.insert(scalar.key(), self.tape.len());
            self.tape.push(instr);
        }

        Ok(self.register(root))
    }

    /// Register of an already emitted node.
    fn register(&self, scalar: &Scalar) -> usize {
        self.registers[&scalar.key()]
    }
}
