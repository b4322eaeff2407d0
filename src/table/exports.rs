//! Read-only metadata keys a table publishes through its record.
//!
//! ```text
//! dims                 int    number of dimensions
//! fields               int    number of committed fields
//! size[i]              int    extent of dimension i          (i < dims)
//! stride[i]            int    bytes per step of dimension i  (i <= dims)
//! field[i].name        token
//! field[i].type        token
//! field[i].size        int
//! field[i].default     string lowercase hex of the default bytes
//! ```

use std::fmt::{self, Write};

use crate::record::{Exports, ValueKind};
use crate::symbols::Token;

use super::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportKey {
    Dims,
    Fields,
    Size(usize),
    Stride(usize),
    FieldName(usize),
    FieldType(usize),
    FieldSize(usize),
    FieldDefault(usize),
}

impl ExportKey {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "dims" => return Some(ExportKey::Dims),
            "fields" => return Some(ExportKey::Fields),
            _ => {}
        }

        if let Some(rest) = name.strip_prefix("size[") {
            return index(rest.strip_suffix(']')?).map(ExportKey::Size);
        }
        if let Some(rest) = name.strip_prefix("stride[") {
            return index(rest.strip_suffix(']')?).map(ExportKey::Stride);
        }

        let rest = name.strip_prefix("field[")?;
        let (i, attr) = rest.split_once("].")?;
        let i = index(i)?;
        match attr {
            "name" => Some(ExportKey::FieldName(i)),
            "type" => Some(ExportKey::FieldType(i)),
            "size" => Some(ExportKey::FieldSize(i)),
            "default" => Some(ExportKey::FieldDefault(i)),
            _ => None,
        }
    }

    /// The key at enumeration position `index` for a table of the given
    /// dimension and field counts.
    fn at(index: usize, dims: usize, fields: usize) -> Option<Self> {
        let mut i = index;
        match i {
            0 => return Some(ExportKey::Dims),
            1 => return Some(ExportKey::Fields),
            _ => i -= 2,
        }
        if i < dims {
            return Some(ExportKey::Size(i));
        }
        i -= dims;
        if i <= dims {
            return Some(ExportKey::Stride(i));
        }
        i -= dims + 1;
        if i >= 4 * fields {
            return None;
        }
        let field = i / 4;
        Some(match i % 4 {
            0 => ExportKey::FieldName(field),
            1 => ExportKey::FieldType(field),
            2 => ExportKey::FieldSize(field),
            _ => ExportKey::FieldDefault(field),
        })
    }

    fn count(dims: usize, fields: usize) -> usize {
        2 + dims + (dims + 1) + 4 * fields
    }

    fn in_range(self, dims: usize, fields: usize) -> bool {
        match self {
            ExportKey::Dims | ExportKey::Fields => true,
            ExportKey::Size(i) => i < dims,
            ExportKey::Stride(i) => i <= dims,
            ExportKey::FieldName(i)
            | ExportKey::FieldType(i)
            | ExportKey::FieldSize(i)
            | ExportKey::FieldDefault(i) => i < fields,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ExportKey::Dims => "number of dimensions",
            ExportKey::Fields => "number of fields",
            ExportKey::Size(_) => "extent of a dimension",
            ExportKey::Stride(_) => "bytes per step along a dimension",
            ExportKey::FieldName(_) => "field name",
            ExportKey::FieldType(_) => "field type name",
            ExportKey::FieldSize(_) => "field size in bytes",
            ExportKey::FieldDefault(_) => "field default bytes as hex",
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            ExportKey::FieldName(_) | ExportKey::FieldType(_) => ValueKind::Token,
            ExportKey::FieldDefault(_) => ValueKind::String,
            _ => ValueKind::Int,
        }
    }
}

/// Strict decimal index: digits only, no sign or whitespace.
fn index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for ExportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKey::Dims => f.write_str("dims"),
            ExportKey::Fields => f.write_str("fields"),
            ExportKey::Size(i) => write!(f, "size[{i}]"),
            ExportKey::Stride(i) => write!(f, "stride[{i}]"),
            ExportKey::FieldName(i) => write!(f, "field[{i}].name"),
            ExportKey::FieldType(i) => write!(f, "field[{i}].type"),
            ExportKey::FieldSize(i) => write!(f, "field[{i}].size"),
            ExportKey::FieldDefault(i) => write!(f, "field[{i}].default"),
        }
    }
}

impl Table {
    fn export_of(&self, key: Token) -> Option<ExportKey> {
        let name = self.symbols.lookup(key)?;
        ExportKey::parse(&name).filter(|k| k.in_range(self.dims(), self.field_count()))
    }
}

fn to_int(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Exports for Table {
    fn export_count(&self) -> usize {
        ExportKey::count(self.dims(), self.field_count())
    }

    fn export_key(&self, index: usize) -> Option<Token> {
        let key = ExportKey::at(index, self.dims(), self.field_count())?;
        Some(self.symbols.intern(&key.to_string()))
    }

    fn is_export(&self, key: Token) -> bool {
        self.export_of(key).is_some()
    }

    fn is_reserved(&self, key: Token) -> bool {
        self.symbols
            .lookup(key)
            .is_some_and(|name| ExportKey::parse(&name).is_some())
    }

    fn description(&self, key: Token) -> Option<&str> {
        self.export_of(key).map(ExportKey::description)
    }

    fn export_kind(&self, key: Token) -> ValueKind {
        self.export_of(key).map_or(ValueKind::Int, ExportKey::kind)
    }

    fn get_int(&self, key: Token) -> Option<i32> {
        let value = match self.export_of(key)? {
            ExportKey::Dims => self.dims(),
            ExportKey::Fields => self.field_count(),
            ExportKey::Size(i) => self.size(i)?,
            ExportKey::Stride(i) => self.stride(i)?,
            ExportKey::FieldSize(i) => self.field_size(i)?,
            _ => return None,
        };
        Some(to_int(value))
    }

    fn get_token(&self, key: Token) -> Option<Token> {
        match self.export_of(key)? {
            ExportKey::FieldName(i) => self.field_name(i),
            ExportKey::FieldType(i) => self.field_type(i),
            _ => None,
        }
    }

    fn get_string(&self, key: Token) -> Option<String> {
        match self.export_of(key)? {
            ExportKey::FieldDefault(i) => {
                let bytes = self.field_default(i)?;
                let mut hex = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(hex, "{b:02x}");
                }
                Some(hex)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_names_only() {
        assert_eq!(ExportKey::parse("size[2]"), Some(ExportKey::Size(2)));
        assert_eq!(ExportKey::parse("field[10].type"), Some(ExportKey::FieldType(10)));
        assert_eq!(ExportKey::parse("size[-1]"), None);
        assert_eq!(ExportKey::parse("size[ 1]"), None);
        assert_eq!(ExportKey::parse("size[]"), None);
        assert_eq!(ExportKey::parse("field[0].colour"), None);
        assert_eq!(ExportKey::parse("dimensions"), None);
    }

    #[test]
    fn enumeration_matches_display_and_parse() {
        let (dims, fields) = (2, 3);
        let count = ExportKey::count(dims, fields);
        assert_eq!(count, 2 + 2 + 3 + 12);

        for i in 0..count {
            let key = ExportKey::at(i, dims, fields).unwrap();
            assert!(key.in_range(dims, fields));
            assert_eq!(ExportKey::parse(&key.to_string()), Some(key));
        }
        assert_eq!(ExportKey::at(count, dims, fields), None);
    }
}
