//! Export-aware record access.

use std::borrow::Cow;

use crate::symbols::{SymbolTable, Token};

use super::{Exports, Record, Value, ValueKind};

#[derive(Clone, Copy)]
pub struct RecordView<'a> {
    store: &'a Record,
    exports: Option<&'a dyn Exports>,
}

impl<'a> RecordView<'a> {
    pub fn new(store: &'a Record, exports: Option<&'a dyn Exports>) -> Self {
        Self { store, exports }
    }

    pub fn record(&self) -> &'a Record {
        self.store
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.store.symbols()
    }

    pub fn export_count(&self) -> usize {
        self.exports.map_or(0, |e| e.export_count())
    }

    /// Exported plus stored keys.
    pub fn len(&self) -> usize {
        self.export_count() + self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_export(&self, key: Token) -> bool {
        self.exports.is_some_and(|e| e.is_export(key))
    }

    /// Key at position `index`: exported keys first, then stored keys.
    pub fn key(&self, index: usize) -> Option<Token> {
        let exported = self.export_count();
        match (index < exported, self.exports) {
            (true, Some(exports)) => exports.export_key(index),
            _ => self.store.key_at(index - exported),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = Token> + 'a {
        let view = *self;
        (0..view.len()).filter_map(move |i| view.key(i))
    }

    pub fn entry(&self, index: usize) -> Option<Item<'a>> {
        self.get(self.key(index)?)
    }

    pub fn get(&self, key: Token) -> Option<Item<'a>> {
        let source = match self.exports {
            Some(exports) if exports.is_export(key) => Source::Exported(exports),
            _ => Source::Stored(Some(self.store.get(key)?)),
        };
        Some(Item {
            key,
            symbols: self.store.symbols(),
            source,
        })
    }

    /// Looks `name` up without interning it. Exported keys are found even
    /// before their names have been interned.
    pub fn get_str(&self, name: &str) -> Option<Item<'a>> {
        self.get(self.find_key(name)?)
    }

    fn find_key(&self, name: &str) -> Option<Token> {
        if let Some(key) = self.symbols().get(name) {
            return Some(key);
        }
        let exports = self.exports?;
        let symbols = self.symbols();
        (0..exports.export_count())
            .filter_map(|i| exports.export_key(i))
            .find(|&key| *symbols.name(key) == *name)
    }
}

pub struct RecordViewMut<'a> {
    store: &'a mut Record,
    exports: Option<&'a mut dyn Exports>,
}

impl<'a> RecordViewMut<'a> {
    pub fn new(store: &'a mut Record, exports: Option<&'a mut dyn Exports>) -> Self {
        Self { store, exports }
    }

    pub fn as_view(&self) -> RecordView<'_> {
        let exports: Option<&dyn Exports> = match &self.exports {
            Some(exports) => Some(&**exports),
            None => None,
        };
        RecordView::new(self.store, exports)
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.store.symbols()
    }

    pub fn len(&self) -> usize {
        self.as_view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn export_count(&self) -> usize {
        self.as_view().export_count()
    }

    pub fn is_export(&self, key: Token) -> bool {
        self.as_view().is_export(key)
    }

    pub fn is_reserved(&self, key: Token) -> bool {
        self.exports.as_ref().is_some_and(|e| e.is_reserved(key))
    }

    /// Returns the item of `key`, creating a stored `Int(0)` if it is
    /// neither stored nor reserved for export. Writes to a reserved key
    /// that is not currently exported are refused.
    pub fn item(&mut self, key: Token) -> ItemMut<'_> {
        if !self.is_reserved(key) {
            self.store.get_or_insert(key);
        }
        self.item_unchecked(key)
    }

    /// Interns `name` and returns its item, creating it if needed.
    pub fn item_str(&mut self, name: &str) -> ItemMut<'_> {
        let key = self.store.symbols().intern(name);
        self.item(key)
    }

    pub fn get(&mut self, key: Token) -> Option<ItemMut<'_>> {
        if !self.is_export(key) && !self.store.contains(key) {
            return None;
        }
        Some(self.item_unchecked(key))
    }

    pub fn get_str(&mut self, name: &str) -> Option<ItemMut<'_>> {
        let key = self.as_view().find_key(name)?;
        self.get(key)
    }

    pub fn entry(&mut self, index: usize) -> Option<ItemMut<'_>> {
        let key = self.as_view().key(index)?;
        self.get(key)
    }

    /// Removes a stored key. Exported keys cannot be removed.
    pub fn remove(&mut self, key: Token) -> bool {
        if self.is_export(key) {
            return false;
        }
        self.store.remove(key).is_some()
    }

    fn item_unchecked(&mut self, key: Token) -> ItemMut<'_> {
        let exports: Option<&mut dyn Exports> = match &mut self.exports {
            Some(exports) => Some(&mut **exports),
            None => None,
        };
        ItemMut {
            key,
            store: &mut *self.store,
            exports,
        }
    }
}

#[derive(Clone, Copy)]
enum Source<'a> {
    Stored(Option<&'a Value>),
    Exported(&'a dyn Exports),
}

/// Read access to one key of a record.
#[derive(Clone, Copy)]
pub struct Item<'a> {
    key: Token,
    symbols: &'a SymbolTable,
    source: Source<'a>,
}

impl<'a> Item<'a> {
    pub fn key(&self) -> Token {
        self.key
    }

    pub fn is_export(&self) -> bool {
        matches!(self.source, Source::Exported(_))
    }

    /// Stored keys are always writable; exported keys ask their owner.
    pub fn can_set(&self) -> bool {
        match self.source {
            Source::Stored(_) => true,
            Source::Exported(exports) => exports.can_set(self.key),
        }
    }

    pub fn description(&self) -> &'a str {
        match self.source {
            Source::Stored(_) => "",
            Source::Exported(exports) => exports.description(self.key).unwrap_or(""),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self.source {
            Source::Stored(value) => value.map_or(ValueKind::Int, Value::kind),
            Source::Exported(exports) => exports.export_kind(self.key),
        }
    }

    /// The resolved value, or `None` for an exported key without a getter.
    pub fn value(&self) -> Option<Cow<'a, Value>> {
        match self.source {
            Source::Stored(value) => value.map(Cow::Borrowed),
            Source::Exported(exports) => exports.export_value(self.key).map(Cow::Owned),
        }
    }

    pub fn as_int(&self) -> i32 {
        self.value().map_or(0, |v| v.as_int(self.symbols))
    }

    pub fn as_real(&self) -> f32 {
        self.value().map_or(0.0, |v| v.as_real(self.symbols))
    }

    pub fn as_token(&self) -> Token {
        self.value().map_or(Token::NULL, |v| v.as_token(self.symbols))
    }

    pub fn as_string(&self) -> String {
        self.value()
            .map_or_else(String::new, |v| v.as_string(self.symbols))
    }
}

/// Read and write access to one key of a record.
pub struct ItemMut<'a> {
    key: Token,
    store: &'a mut Record,
    exports: Option<&'a mut dyn Exports>,
}

impl ItemMut<'_> {
    pub fn as_item(&self) -> Item<'_> {
        let source = match &self.exports {
            Some(exports) if exports.is_export(self.key) => Source::Exported(&**exports),
            _ => Source::Stored(self.store.get(self.key)),
        };
        Item {
            key: self.key,
            symbols: self.store.symbols(),
            source,
        }
    }

    pub fn key(&self) -> Token {
        self.key
    }

    pub fn is_export(&self) -> bool {
        self.as_item().is_export()
    }

    pub fn can_set(&self) -> bool {
        if self.reserved() && !self.as_item().is_export() {
            return false;
        }
        self.as_item().can_set()
    }

    pub fn description(&self) -> &str {
        self.as_item().description()
    }

    pub fn kind(&self) -> ValueKind {
        self.as_item().kind()
    }

    pub fn as_int(&self) -> i32 {
        self.as_item().as_int()
    }

    pub fn as_real(&self) -> f32 {
        self.as_item().as_real()
    }

    pub fn as_token(&self) -> Token {
        self.as_item().as_token()
    }

    pub fn as_string(&self) -> String {
        self.as_item().as_string()
    }

    pub fn set_int(&mut self, value: i32) -> bool {
        let key = self.key;
        match self.exported() {
            Some(exports) => exports.set_int(key, value),
            None => self.store_value(Value::Int(value)),
        }
    }

    pub fn set_real(&mut self, value: f32) -> bool {
        let key = self.key;
        match self.exported() {
            Some(exports) => exports.set_real(key, value),
            None => self.store_value(Value::Real(value)),
        }
    }

    pub fn set_token(&mut self, value: Token) -> bool {
        let key = self.key;
        match self.exported() {
            Some(exports) => exports.set_token(key, value),
            None => self.store_value(Value::Token(value)),
        }
    }

    pub fn set_string(&mut self, value: &str) -> bool {
        let key = self.key;
        match self.exported() {
            Some(exports) => exports.set_string(key, value),
            None => self.store_value(Value::Str(value.to_owned())),
        }
    }

    fn exported(&mut self) -> Option<&mut dyn Exports> {
        let key = self.key;
        match &mut self.exports {
            Some(exports) if exports.is_export(key) => Some(&mut **exports),
            _ => None,
        }
    }

    fn reserved(&self) -> bool {
        self.exports.as_ref().is_some_and(|e| e.is_reserved(self.key))
    }

    fn store_value(&mut self, value: Value) -> bool {
        if self.reserved() {
            return false;
        }
        self.store.set(self.key, value);
        true
    }
}
