//! # Symbol Table
//!
//! Interns strings into small integer [`Token`]s. Every key of a record and
//! every field name and field type of a table is stored as a token, so equality
//! checks across a whole tree are integer comparisons.
//!
//! ## Sharing Model
//!
//! A single `SymbolTable` is shared by a [`Registry`](crate::registry::Registry)
//! and every [`Tree`](crate::tree::Tree) built through it, wrapped in an `Arc`.
//! The table is append-only: tokens are never invalidated, so a token obtained
//! from one tree remains meaningful in every other tree sharing the table.
//!
//! Interior mutability is provided by a `parking_lot::RwLock`. Lookups take the
//! read lock; interning a new string takes the write lock once.
//!
//! ## Null Token
//!
//! The empty string is pre-interned as [`Token::NULL`] (token 0).

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Token(u32);

impl Token {
    pub const NULL: Token = Token(0);

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Interned {
    by_name: HashMap<Arc<str>, Token>,
    names: Vec<Arc<str>>,
}

#[derive(Debug)]
pub struct SymbolTable {
    inner: RwLock<Interned>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let table = Self {
            inner: RwLock::new(Interned::default()),
        };
        let null = table.intern("");
        debug_assert_eq!(null, Token::NULL);
        table
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn intern(&self, name: &str) -> Token {
        if let Some(token) = self.get(name) {
            return token;
        }

        let mut inner = self.inner.write();
        if let Some(&token) = inner.by_name.get(name) {
            return token;
        }
        let token = Token(inner.names.len() as u32);
        let name: Arc<str> = Arc::from(name);
        inner.names.push(Arc::clone(&name));
        inner.by_name.insert(name, token);
        token
    }

    /// Returns the token of an already interned string without interning it.
    pub fn get(&self, name: &str) -> Option<Token> {
        self.inner.read().by_name.get(name).copied()
    }

    pub fn lookup(&self, token: Token) -> Option<Arc<str>> {
        self.inner.read().names.get(token.0 as usize).cloned()
    }

    /// Like [`lookup`](Self::lookup) but maps unknown tokens to the empty string.
    pub fn name(&self, token: Token) -> Arc<str> {
        self.lookup(token).unwrap_or_else(|| Arc::from(""))
    }

    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_null_token() {
        let table = SymbolTable::new();
        assert_eq!(table.intern(""), Token::NULL);
        assert!(Token::NULL.is_null());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn intern_is_idempotent() {
        let table = SymbolTable::new();
        let a = table.intern("dims");
        let b = table.intern("dims");
        let c = table.intern("fields");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn lookup_round_trips() {
        let table = SymbolTable::new();
        let token = table.intern("stride[0]");

        assert_eq!(table.lookup(token).as_deref(), Some("stride[0]"));
        assert_eq!(&*table.name(token), "stride[0]");
    }

    #[test]
    fn unknown_token_lookup_is_none() {
        let table = SymbolTable::new();
        assert!(table.lookup(Token(42)).is_none());
        assert_eq!(&*table.name(Token(42)), "");
    }

    #[test]
    fn get_does_not_intern() {
        let table = SymbolTable::new();
        assert!(table.get("missing").is_none());
        assert_eq!(table.len(), 1);
    }
}
