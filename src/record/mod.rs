//! # Records
//!
//! A record is the keyed attribute store carried by record and table nodes.
//! Keys are interned [`Token`]s; values are one of four scalar kinds.
//!
//! ## Stored and Exported Keys
//!
//! Stored keys physically live in the [`Record`]. Exported keys are computed
//! by the more derived level of the node through the [`Exports`] capability,
//! for example a table publishes `dims` and `size[0]`. Access through
//! [`RecordView`] and [`RecordViewMut`] resolves exported keys first, so a
//! key is never both stored and exported:
//!
//! ```text
//! view.get(key)
//!    │
//!    ├─ exports.is_export(key) ──> Item backed by Exports callbacks
//!    │
//!    └─ otherwise ──────────────> Item backed by the stored Value
//! ```
//!
//! ## Conversions
//!
//! Every item can be read as any kind. Conversions are lossy but
//! deterministic:
//!
//! | from \ to | int | real | token | string |
//! |-----------|-----|------|-------|--------|
//! | int | - | widen | decimal text | decimal text |
//! | real | truncate | - | shortest text | shortest text |
//! | token | parse, 0 on failure | parse, 0.0 on failure | - | name |
//! | string | parse, 0 on failure | parse, 0.0 on failure | intern | - |
//!
//! Writing switches the stored kind to the kind written.
//!
//! ## Block Format
//!
//! ```text
//! BlockHeader("SID", object tag)
//! u32 item count
//! per item: lump(name) lump(type name) lump(value bytes)
//! ```
//!
//! Type names are `int`, `real`, `token` and `string`. Unknown type names
//! load as strings.

mod exports;
mod io;
mod value;
mod view;

#[cfg(test)]
mod tests;

pub use exports::Exports;
pub use value::{Value, ValueKind};
pub use view::{Item, ItemMut, RecordView, RecordViewMut};

use std::sync::Arc;

use crate::symbols::{SymbolTable, Token};

#[derive(Debug, Clone)]
pub struct Record {
    symbols: Arc<SymbolTable>,
    items: Vec<(Token, Value)>,
}

impl Record {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            items: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Number of stored items. Exported keys are counted by the views.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: Token) -> bool {
        self.search(key).is_ok()
    }

    pub fn get(&self, key: Token) -> Option<&Value> {
        self.search(key).ok().map(|i| &self.items[i].1)
    }

    pub fn get_mut(&mut self, key: Token) -> Option<&mut Value> {
        match self.search(key) {
            Ok(i) => Some(&mut self.items[i].1),
            Err(_) => None,
        }
    }

    /// Returns the stored value of `key`, inserting `Int(0)` if absent.
    pub fn get_or_insert(&mut self, key: Token) -> &mut Value {
        let i = match self.search(key) {
            Ok(i) => i,
            Err(i) => {
                self.items.insert(i, (key, Value::Int(0)));
                i
            }
        };
        &mut self.items[i].1
    }

    pub fn set(&mut self, key: Token, value: Value) {
        *self.get_or_insert(key) = value;
    }

    pub fn remove(&mut self, key: Token) -> Option<Value> {
        let i = self.search(key).ok()?;
        Some(self.items.remove(i).1)
    }

    /// Drops stored keys that `exports` reserves. Returns how many were
    /// dropped.
    pub fn remove_reserved(&mut self, exports: &dyn Exports) -> usize {
        let before = self.items.len();
        self.items.retain(|(key, _)| !exports.is_reserved(*key));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Stored key at position `index`, in token order.
    pub fn key_at(&self, index: usize) -> Option<Token> {
        self.items.get(index).map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Token, &Value)> {
        self.items.iter().map(|(key, value)| (*key, value))
    }

    pub fn memory(&self) -> usize {
        self.items.capacity() * std::mem::size_of::<(Token, Value)>()
            + self
                .items
                .iter()
                .map(|(_, value)| value.heap_size())
                .sum::<usize>()
    }

    fn search(&self, key: Token) -> Result<usize, usize> {
        self.items.binary_search_by_key(&key, |(k, _)| *k)
    }
}
