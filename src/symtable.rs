use std::collections::HashMap;

use crate::ast::Type;

/// A variable's storage class. Field and Static appear only at class
/// scope; Argument and Local only at subroutine scope (spec.md §3
/// invariant 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Local,
    Argument,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: Kind,
    pub index: u32,
}

#[derive(Debug)]
pub enum SymbolTableError {
    Redefined(String),
}

impl std::fmt::Display for SymbolTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolTableError::Redefined(name) => {
                write!(f, "symbol already declared in this scope: {}", name)
            }
        }
    }
}

/// A single scope's worth of declarations, with per-kind indices
/// allocated contiguously from zero in declaration order.
#[derive(Default)]
pub struct SymbolTable {
    table: HashMap<String, Symbol>,
    next_index: HashMap<Kind, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, ty: Type, kind: Kind) -> Result<(), SymbolTableError> {
        if self.table.contains_key(name) {
            return Err(SymbolTableError::Redefined(name.to_string()));
        }
        let index = *self.next_index.get(&kind).unwrap_or(&0);
        self.next_index.insert(kind, index + 1);
        self.table.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                ty,
                kind,
                index,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.table.get(name)
    }

    pub fn count(&self, kind: Kind) -> u32 {
        *self.next_index.get(&kind).unwrap_or(&0)
    }
}

/// A LIFO stack of scopes. At most two scopes are ever live: the outer
/// (class) scope holding Static/Field, and an inner (subroutine) scope
/// holding Argument/Local (spec.md §3).
#[derive(Default)]
pub struct SymbolTableStack {
    scopes: Vec<SymbolTable>,
}

impl SymbolTableStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(SymbolTable::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn add(&mut self, name: &str, ty: Type, kind: Kind) -> Result<(), SymbolTableError> {
        self.scopes
            .last_mut()
            .expect("no scope pushed")
            .add(name, ty, kind)
    }

    /// Look up `name`, walking from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|t| t.lookup(name))
    }

    pub fn count(&self, kind: Kind) -> u32 {
        self.scopes
            .last()
            .map(|t| t.count(kind))
            .unwrap_or(0)
    }

    /// Count of a kind across all live scopes (used to count class Fields
    /// while the subroutine scope is also pushed).
    pub fn count_in_outer(&self, kind: Kind) -> u32 {
        self.scopes
            .first()
            .map(|t| t.count(kind))
            .unwrap_or(0)
    }
}
