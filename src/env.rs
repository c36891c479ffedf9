use std::collections::HashMap;

use generational_arena::{Arena, Index};
use log::trace;

use crate::{
    error::{RuntimeError, RuntimeErrorKind, RuntimeResult},
    token::Token,
    value::Value,
};

/// The binding state of a declared variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Uninitialized,
    Initialized(Value),
}

#[derive(Debug, Default)]
struct Scope {
    enclosing: Option<Index>,
    values: HashMap<String, Slot>,
}

/// A chain of lexical scopes. Every scope lives in an arena and refers to
/// its enclosing scope by index, so a scope never owns its parent.
#[derive(Debug)]
pub struct Environment {
    scopes: Arena<Scope>,
    current: Index,
}

impl Default for Environment {
    fn default() -> Self {
        let mut scopes = Arena::new();
        let current = scopes.insert(Scope::default());
        Environment { scopes, current }
    }
}

impl Environment {
    /// Opens a new scope enclosed by the current one and makes it current.
    /// Returns the index of the scope that was current before, to be handed
    /// back to `restore`.
    pub fn enclose(&mut self) -> Index {
        let previous = self.current;
        self.current = self.scopes.insert(Scope {
            enclosing: Some(previous),
            ..Default::default()
        });
        trace!("entered scope {:?} (depth {})", self.current, self.depth());
        previous
    }

    /// Discards the current scope and every binding in it, making `previous`
    /// current again.
    pub fn restore(&mut self, previous: Index) {
        trace!("leaving scope {:?}", self.current);
        if self.current != previous {
            self.scopes.remove(self.current);
        }
        self.current = previous;
    }

    /// Number of scopes between the current one and the outermost one.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.scopes.get(self.current);
        while let Some(index) = scope.and_then(|s| s.enclosing) {
            depth += 1;
            scope = self.scopes.get(index);
        }
        depth
    }

    /// Binds `name` in the current scope, replacing any binding of the same
    /// name in this scope only. A missing value declares the variable
    /// without initializing it.
    pub fn define(&mut self, name: &str, value: Option<Value>) {
        let slot = match value {
            Some(value) => Slot::Initialized(value),
            None => Slot::Uninitialized,
        };
        if let Some(scope) = self.scopes.get_mut(self.current) {
            scope.values.insert(name.to_owned(), slot);
        }
    }

    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        match self.resolve(&name.lexeme).and_then(|idx| self.slot(idx, &name.lexeme)) {
            Some(Slot::Initialized(value)) => Ok(value.clone()),
            Some(Slot::Uninitialized) => Err(RuntimeError::new(
                RuntimeErrorKind::UninitializedVariable,
                name,
                format!("Use of uninitialized variable '{}'.", name.lexeme),
            )),
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }

    /// Overwrites the nearest existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        let slot = self
            .resolve(&name.lexeme)
            .and_then(|idx| self.scopes.get_mut(idx))
            .and_then(|scope| scope.values.get_mut(&name.lexeme))
            .ok_or_else(|| RuntimeError::undefined_variable(name))?;
        *slot = Slot::Initialized(value);
        Ok(())
    }

    /// Finds the innermost scope that binds `name`.
    fn resolve(&self, name: &str) -> Option<Index> {
        let mut index = Some(self.current);
        while let Some(idx) = index {
            let scope = self.scopes.get(idx)?;
            if scope.values.contains_key(name) {
                return Some(idx);
            }
            index = scope.enclosing;
        }
        None
    }

    fn slot(&self, index: Index, name: &str) -> Option<&Slot> {
        self.scopes.get(index)?.values.get(name)
    }
}
