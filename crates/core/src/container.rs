use std::collections::HashMap;

use ndarray::Array2;
use thiserror::Error;

use crate::{Shape, Shaped, SymbolicEngine};

/// An insertion-ordered map of named symbolic blocks.
///
/// Iteration and [`flatten`](Self::flatten) follow the order in which names
/// were first inserted. Overwriting an existing name through
/// [`insert`](Self::insert) replaces the value but keeps its position.
#[derive(Debug, Clone)]
pub struct SymbolContainer<X> {
    entries: Vec<(String, X)>,
    index: HashMap<String, usize>,
}

/// Errors that can occur when accessing a [`SymbolContainer`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("no entry named '{0}'")]
    NameNotFound(String),

    #[error("an entry named '{0}' already exists")]
    DuplicateName(String),

    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// The position of one named block within a flattened container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub name: &'a str,

    /// Index of the block's first element in the flattened vector.
    pub offset: usize,

    pub shape: Shape,
}

impl<X> Default for SymbolContainer<X> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<X> SymbolContainer<X> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of named entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Inserts a value, overwriting any existing entry with the same name.
    ///
    /// Returns the previous value if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, value: X) -> Option<X> {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
        None
    }

    /// Inserts a value under a name that must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::DuplicateName`] if the name is taken, leaving
    /// the container unchanged.
    pub fn try_insert(&mut self, name: impl Into<String>, value: X) -> Result<(), ContainerError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ContainerError::DuplicateName(name));
        }
        self.insert(name, value);
        Ok(())
    }

    /// Returns the value stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::NameNotFound`] if there is no such entry.
    pub fn get(&self, name: &str) -> Result<&X, ContainerError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| ContainerError::NameNotFound(name.to_owned()))
    }

    /// Returns the names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &X)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<X: Shaped> SymbolContainer<X> {
    /// Returns the total number of scalar elements across all entries.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.entries.iter().map(|(_, value)| value.numel()).sum()
    }

    /// Stacks every entry, row-major, into one column vector.
    pub fn flatten<E>(&self, engine: &E) -> E::Expr
    where
        E: SymbolicEngine<Expr = X>,
    {
        let exprs: Vec<&X> = self.entries.iter().map(|(_, value)| value).collect();
        engine.vertcat(&exprs)
    }

    /// Returns where each entry lives within the flattened vector.
    #[must_use]
    pub fn layout(&self) -> Vec<Block<'_>> {
        let mut offset = 0;
        self.entries
            .iter()
            .map(|(name, value)| {
                let block = Block {
                    name: name.as_str(),
                    offset,
                    shape: value.shape(),
                };
                offset += block.shape.numel();
                block
            })
            .collect()
    }

    /// Splits a flat numeric vector into named, shaped blocks.
    ///
    /// This is the inverse of [`flatten`](Self::flatten) for numeric values,
    /// letting a solver map its iterate back onto the registered names.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::LengthMismatch`] if `values` does not have
    /// exactly [`numel`](Self::numel) elements.
    pub fn split<'a>(
        &'a self,
        values: &[f64],
    ) -> Result<Vec<(&'a str, Array2<f64>)>, ContainerError> {
        let expected = self.numel();
        if values.len() != expected {
            return Err(ContainerError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }

        Ok(self
            .layout()
            .into_iter()
            .map(|Block { name, offset, shape }| {
                let block = Array2::from_shape_fn((shape.rows, shape.cols), |(i, j)| {
                    values[offset + i * shape.cols + j]
                });
                (name, block)
            })
            .collect())
    }
}
