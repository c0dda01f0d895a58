//! A table for symbols. The table maintains a chain of scopes and a
//! mapping of a key to data for each item in the scope.
//!
//! The typical way to use the symbol table is to `enter` a scope for each
//! syntax element that delineates a scope (a function body or a block),
//! `try_add` the names declared there and `exit` once the element has been
//! walked. Lookups with `find` search from the innermost scope outward.
use std::collections::HashMap;
use std::collections::LinkedList;
use std::hash::Hash;

use log::trace;

pub trait Key: Eq + Hash + Clone {}

impl<T: Eq + Hash + Clone> Key for T {}

struct Scope<K: Key, V> {
    table: HashMap<K, V>,
}

impl<K: Key, V> Scope<K, V> {
    fn new() -> Self {
        Scope {
            table: HashMap::new(),
        }
    }

    /// Tries to add the name into the scope with the specified value.
    ///
    /// If the scope does not have this name, adds the name with the value.
    ///
    /// If the scope does have this name, then value is not updated. The
    /// existing key and value are returned.
    fn try_add(&mut self, name: &K, value: V) -> Option<(&K, &V)> {
        // We want the map to be unmodified if the key already exists, so we
        // must first test if the key exists.
        if self.table.contains_key(name) {
            return self.table.get_key_value(name);
        }
        self.table.insert(name.clone(), value);
        None
    }

    fn find(&self, name: &K) -> Option<&V> {
        self.table.get(name)
    }
}

pub struct SymbolTable<K: Key, V> {
    stack: LinkedList<Scope<K, V>>,
}

impl<K: Key, V> SymbolTable<K, V> {
    /// Creates a `SymbolTable` with only the global scope.
    pub fn new() -> Self {
        let mut stack = LinkedList::new();
        stack.push_back(Scope::new());
        SymbolTable { stack }
    }

    /// Enters a new scope.
    ///
    /// This creates a new context that can hide declarations
    /// from outer scopes.
    pub fn enter(&mut self) {
        self.stack.push_front(Scope::new());
        trace!("Enter scope at depth {}", self.depth());
    }

    /// Exits the current scope.
    ///
    /// This removes the current scope and everything declared in it.
    pub fn exit(&mut self) {
        trace!("Exit scope at depth {}", self.depth());
        self.stack.pop_front();
    }

    /// Tries to add the key to the innermost scope with the specified value.
    ///
    /// If the innermost scope does not have this key, None is returned.
    ///
    /// If the innermost scope does have this key, the value is not
    /// updated. The existing key and value are returned. This matters
    /// particularly for `Id`s which can be equal even if not identical.
    pub fn try_add(&mut self, name: &K, value: V) -> Option<(&K, &V)> {
        match self.stack.front_mut() {
            None => None,
            Some(scope) => scope.try_add(name, value),
        }
    }

    /// Returns the value for the given name from the innermost scope that
    /// declares the name.
    pub fn find(&self, name: &K) -> Option<&V> {
        self.stack.iter().find_map(|scope| scope.find(name))
    }

    /// The number of scopes in the chain, including the global scope.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl<K: Key, V> Default for SymbolTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
