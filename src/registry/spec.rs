//! Named structural constraints on nodes.
//!
//! A [`TypeSpec`] is checked level by level: the minimum level first, then
//! (for tables) dimension and field requirements, then (for records and
//! tables) required keys.
//!
//! Dimension constraints combine as follows: if any `Fixed` constraint
//! matches, the node passes; otherwise any failed constraint rejects it.
//! A size constraint on a dimension the table does not have always rejects.

use crate::record::ValueKind;
use crate::symbols::Token;
use crate::tree::{Level, NodeId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Fixed(usize),
    Minimum(usize),
    Maximum(usize),
}

impl Bound {
    fn admits(self, value: usize) -> bool {
        match self {
            Bound::Fixed(v) => value == v,
            Bound::Minimum(v) => value >= v,
            Bound::Maximum(v) => value <= v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyReq {
    key: Token,
    kind: Option<ValueKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DimReq {
    /// `None` constrains the dimension count, `Some(d)` the size of `d`.
    dim: Option<usize>,
    bound: Bound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldReq {
    name: Token,
    layout: Option<(Token, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    level: Level,
    keys: Vec<KeyReq>,
    dims: Vec<DimReq>,
    fields: Vec<FieldReq>,
}

impl Default for TypeSpec {
    fn default() -> Self {
        Self {
            level: Level::Node,
            keys: Vec::new(),
            dims: Vec::new(),
            fields: Vec::new(),
        }
    }
}

impl TypeSpec {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn require_record(&mut self) -> &mut Self {
        self.level = self.level.max(Level::Record);
        self
    }

    pub fn require_table(&mut self) -> &mut Self {
        self.level = Level::Table;
        self
    }

    pub fn require_key(&mut self, key: Token) -> &mut Self {
        self.keys.push(KeyReq { key, kind: None });
        self.require_record()
    }

    pub fn require_key_kind(&mut self, key: Token, kind: ValueKind) -> &mut Self {
        self.keys.push(KeyReq {
            key,
            kind: Some(kind),
        });
        self.require_record()
    }

    pub fn constrain_dims(&mut self, bound: Bound) -> &mut Self {
        self.dims.push(DimReq { dim: None, bound });
        self.require_table()
    }

    /// Constrains the size of dimension `dim`, which must exist.
    pub fn constrain_size(&mut self, dim: usize, bound: Bound) -> &mut Self {
        self.dims.push(DimReq {
            dim: Some(dim),
            bound,
        });
        self.require_table()
    }

    pub fn require_field(&mut self, name: Token) -> &mut Self {
        self.fields.push(FieldReq { name, layout: None });
        self.require_table()
    }

    pub fn require_field_type(&mut self, name: Token, type_name: Token, size: usize) -> &mut Self {
        self.fields.push(FieldReq {
            name,
            layout: Some((type_name, size)),
        });
        self.require_table()
    }

    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(level) = tree.level(node) else {
            return false;
        };
        if level < self.level {
            return false;
        }

        if let Some(table) = tree.table(node) {
            let mut matched_fixed = false;
            let mut failed = false;
            for req in &self.dims {
                let value = match req.dim {
                    None => table.dims(),
                    Some(d) => match table.size(d) {
                        Some(size) => size,
                        None => return false,
                    },
                };
                let admitted = req.bound.admits(value);
                if matches!(req.bound, Bound::Fixed(_)) && admitted {
                    matched_fixed = true;
                }
                failed |= !admitted;
            }
            if failed && !matched_fixed {
                return false;
            }

            for req in &self.fields {
                let Some(index) = table.index_of_token(req.name) else {
                    return false;
                };
                if let Some((type_name, size)) = req.layout {
                    if table.field_type(index) != Some(type_name)
                        || table.field_size(index) != Some(size)
                    {
                        return false;
                    }
                }
            }
        }

        if let Some(record) = tree.record(node) {
            for req in &self.keys {
                let Some(item) = record.get(req.key) else {
                    return false;
                };
                if req.kind.is_some_and(|kind| item.kind() != kind) {
                    return false;
                }
            }
        }

        true
    }
}
