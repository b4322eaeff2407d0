use std::fmt;

use crate::symbols::{SymbolTable, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Real,
    Token,
    String,
}

impl ValueKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Real => "real",
            ValueKind::Token => "token",
            ValueKind::String => "string",
        }
    }

    /// Maps a serialized type name to its kind. Unknown names are strings.
    pub fn from_type_name(name: &[u8]) -> Self {
        match name {
            b"int" => ValueKind::Int,
            b"real" => ValueKind::Real,
            b"token" => ValueKind::Token,
            _ => ValueKind::String,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Real(f32),
    Token(Token),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Token(_) => ValueKind::Token,
            Value::Str(_) => ValueKind::String,
        }
    }

    pub fn as_int(&self, symbols: &SymbolTable) -> i32 {
        match self {
            Value::Int(v) => *v,
            Value::Real(v) => *v as i32,
            Value::Token(t) => parse_int(&symbols.name(*t)),
            Value::Str(s) => parse_int(s),
        }
    }

    pub fn as_real(&self, symbols: &SymbolTable) -> f32 {
        match self {
            Value::Int(v) => *v as f32,
            Value::Real(v) => *v,
            Value::Token(t) => parse_real(&symbols.name(*t)),
            Value::Str(s) => parse_real(s),
        }
    }

    pub fn as_token(&self, symbols: &SymbolTable) -> Token {
        match self {
            Value::Token(t) => *t,
            Value::Str(s) => symbols.intern(s),
            Value::Int(_) | Value::Real(_) => symbols.intern(&self.as_string(symbols)),
        }
    }

    pub fn as_string(&self, symbols: &SymbolTable) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Real(v) => v.to_string(),
            Value::Token(t) => symbols.name(*t).to_string(),
            Value::Str(s) => s.clone(),
        }
    }

    /// Serialized value bytes: little-endian for numbers, UTF-8 text
    /// otherwise.
    pub(crate) fn encode(&self, symbols: &SymbolTable, buf: &mut Vec<u8>) {
        buf.clear();
        match self {
            Value::Int(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Real(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Token(t) => buf.extend_from_slice(symbols.name(*t).as_bytes()),
            Value::Str(s) => buf.extend_from_slice(s.as_bytes()),
        }
    }

    pub(crate) fn encoded_len(&self, symbols: &SymbolTable) -> usize {
        match self {
            Value::Int(_) | Value::Real(_) => 4,
            Value::Token(t) => symbols.name(*t).len(),
            Value::Str(s) => s.len(),
        }
    }

    /// Decodes value bytes of `kind`. Numbers with an unexpected width fall
    /// back to a string of the raw text.
    pub(crate) fn decode(kind: ValueKind, bytes: &[u8], symbols: &SymbolTable) -> Value {
        match (kind, bytes.len()) {
            (ValueKind::Int, 4) => Value::Int(i32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            (ValueKind::Real, 4) => Value::Real(f32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            (ValueKind::Token, _) => Value::Token(symbols.intern(&String::from_utf8_lossy(bytes))),
            _ => Value::Str(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub(crate) fn heap_size(&self) -> usize {
        match self {
            Value::Str(s) => s.capacity(),
            _ => 0,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(v)
    }
}

impl From<Token> for Value {
    fn from(v: Token) -> Self {
        Value::Token(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

fn parse_int(text: &str) -> i32 {
    let text = text.trim();
    text.parse::<i32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(|v| v as i32))
        .unwrap_or(0)
}

fn parse_real(text: &str) -> f32 {
    text.trim().parse::<f32>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_to_int_truncates() {
        let symbols = SymbolTable::new();
        assert_eq!(Value::Real(2.9).as_int(&symbols), 2);
        assert_eq!(Value::Real(-2.9).as_int(&symbols), -2);
    }

    #[test]
    fn text_parses_leniently() {
        let symbols = SymbolTable::new();
        let token = symbols.intern("2.5");

        assert_eq!(Value::Token(token).as_real(&symbols), 2.5);
        assert_eq!(Value::Token(token).as_int(&symbols), 2);
        assert_eq!(Value::from(" 17 ").as_int(&symbols), 17);
        assert_eq!(Value::from("abc").as_int(&symbols), 0);
        assert_eq!(Value::from("abc").as_real(&symbols), 0.0);
    }

    #[test]
    fn numbers_intern_decimal_text() {
        let symbols = SymbolTable::new();
        let token = Value::Int(42).as_token(&symbols);

        assert_eq!(&*symbols.name(token), "42");
        assert_eq!(Value::Int(42).as_string(&symbols), "42");
    }

    #[test]
    fn unknown_type_name_is_string() {
        assert_eq!(ValueKind::from_type_name(b"quaternion"), ValueKind::String);
        assert_eq!(ValueKind::from_type_name(b"real"), ValueKind::Real);
    }

    #[test]
    fn decode_mismatched_width_falls_back_to_string() {
        let symbols = SymbolTable::new();
        let value = Value::decode(ValueKind::Int, b"12", &symbols);

        assert_eq!(value, Value::Str("12".into()));
    }

    #[test]
    fn encode_matches_encoded_len() {
        let symbols = SymbolTable::new();
        let mut buf = Vec::new();
        for value in [
            Value::Int(-1),
            Value::Real(1.5),
            Value::Token(symbols.intern("alpha")),
            Value::from("hello"),
        ] {
            value.encode(&symbols, &mut buf);
            assert_eq!(buf.len(), value.encoded_len(&symbols));
        }
    }
}
