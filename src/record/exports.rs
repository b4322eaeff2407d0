use crate::symbols::Token;

use super::{Value, ValueKind};

/// Computed keys a derived node level publishes through its record.
///
/// Exported keys are enumerated before stored keys and never occupy record
/// storage. A getter returning `None` or a setter returning `false` means the
/// operation is not supported for that key; nothing is mutated in that case.
pub trait Exports {
    fn export_count(&self) -> usize;

    fn export_key(&self, index: usize) -> Option<Token>;

    fn is_export(&self, key: Token) -> bool;

    /// Keys this level may export under any state, e.g. `size[3]` of a
    /// table that currently has two dimensions. Reserved keys are never
    /// stored.
    fn is_reserved(&self, key: Token) -> bool {
        self.is_export(key)
    }

    fn can_set(&self, _key: Token) -> bool {
        false
    }

    fn description(&self, _key: Token) -> Option<&str> {
        None
    }

    /// Native kind of an exported key, used to pick the getter on reads.
    fn export_kind(&self, _key: Token) -> ValueKind {
        ValueKind::Int
    }

    fn get_int(&self, _key: Token) -> Option<i32> {
        None
    }

    fn get_real(&self, _key: Token) -> Option<f32> {
        None
    }

    fn get_token(&self, _key: Token) -> Option<Token> {
        None
    }

    fn get_string(&self, _key: Token) -> Option<String> {
        None
    }

    fn set_int(&mut self, _key: Token, _value: i32) -> bool {
        false
    }

    fn set_real(&mut self, _key: Token, _value: f32) -> bool {
        false
    }

    fn set_token(&mut self, _key: Token, _value: Token) -> bool {
        false
    }

    fn set_string(&mut self, _key: Token, _value: &str) -> bool {
        false
    }

    /// Reads an exported key through the getter of its native kind.
    fn export_value(&self, key: Token) -> Option<Value> {
        match self.export_kind(key) {
            ValueKind::Int => self.get_int(key).map(Value::Int),
            ValueKind::Real => self.get_real(key).map(Value::Real),
            ValueKind::Token => self.get_token(key).map(Value::Token),
            ValueKind::String => self.get_string(key).map(Value::Str),
        }
    }
}
