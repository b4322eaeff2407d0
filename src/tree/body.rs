//! Per-node payload. A node is one of three nested levels: a bare tree node,
//! a node carrying a keyed record, or a record carrying an n-dimensional
//! table. Each level extends the one before it, so a table is always also a
//! record and a node.

use std::sync::Arc;

use crate::encoding::Tag;
use crate::record::{Exports, Record, RecordView, RecordViewMut};
use crate::symbols::SymbolTable;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Node,
    Record,
    Table,
}

impl Level {
    pub fn tag(self) -> Tag {
        match self {
            Level::Node => Tag::NODE,
            Level::Record => Tag::RECORD,
            Level::Table => Tag::TABLE,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Level::Node => "svtree::Node",
            Level::Record => "svtree::Record",
            Level::Table => "svtree::Table",
        }
    }
}

#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Node,
    Record(Record),
    Table { record: Record, table: Table },
}

impl Body {
    pub fn level(&self) -> Level {
        match self {
            Body::Node => Level::Node,
            Body::Record(_) => Level::Record,
            Body::Table { .. } => Level::Table,
        }
    }

    pub fn tag(&self) -> Tag {
        self.level().tag()
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Body::Node => None,
            Body::Record(record) | Body::Table { record, .. } => Some(record),
        }
    }

    pub fn record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Body::Node => None,
            Body::Record(record) | Body::Table { record, .. } => Some(record),
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            Body::Table { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Body::Table { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Record access that also resolves keys published by the table level.
    pub fn record_view(&self) -> Option<RecordView<'_>> {
        match self {
            Body::Node => None,
            Body::Record(record) => Some(RecordView::new(record, None)),
            Body::Table { record, table } => {
                Some(RecordView::new(record, Some(table as &dyn Exports)))
            }
        }
    }

    pub fn record_view_mut(&mut self) -> Option<RecordViewMut<'_>> {
        match self {
            Body::Node => None,
            Body::Record(record) => Some(RecordViewMut::new(record, None)),
            Body::Table { record, table } => {
                Some(RecordViewMut::new(record, Some(table as &mut dyn Exports)))
            }
        }
    }

    /// Extends the body to `level`, preserving record items. Returns `false`
    /// for a request to move to a less derived level.
    pub fn upgrade(&mut self, level: Level, symbols: &Arc<SymbolTable>) -> bool {
        if level <= self.level() {
            return level == self.level();
        }

        let record = match std::mem::take(self) {
            Body::Record(record) => record,
            _ => Record::new(Arc::clone(symbols)),
        };

        *self = match level {
            Level::Record => Body::Record(record),
            Level::Table => Body::Table {
                record,
                table: Table::new(Arc::clone(symbols)),
            },
            Level::Node => Body::Node,
        };
        self.remove_reserved();
        true
    }

    /// Drops stored record keys that collide with keys the table level
    /// reserves for export.
    pub(crate) fn remove_reserved(&mut self) {
        if let Body::Table { record, table } = self {
            let dropped = record.remove_reserved(&*table);
            if dropped > 0 {
                tracing::warn!(dropped, "dropped stored keys reserved by the table");
            }
        }
    }

    pub fn memory(&self) -> usize {
        match self {
            Body::Node => 0,
            Body::Record(record) => record.memory(),
            Body::Table { record, table } => record.memory() + table.memory(),
        }
    }
}
