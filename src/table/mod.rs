//! # Tables
//!
//! A table is a dense n-dimensional grid of cells. Every cell holds the same
//! runtime-defined list of named, typed, fixed-size fields, packed back to
//! back. The whole grid lives in one contiguous byte buffer.
//!
//! ## Memory Layout
//!
//! ```text
//! shape  = [4, 3]                    fields = [a: f32, b: u8]
//! stride = [5, 20, 60]               (cell, row, whole grid)
//!
//! data:  | a b | a b | a b | a b | a b | ... |
//!          (0,0) (1,0) (2,0) (3,0) (0,1)
//! ```
//!
//! The first dimension varies fastest. `stride[0]` is the cell size and
//! `stride[i + 1] = stride[i] * shape[i]`, so `stride[dims]` is the buffer
//! length.
//!
//! ## Staging and Commit
//!
//! [`Table::setup`], [`Table::add`] and [`Table::rem`] only stage changes.
//! Queries, exported keys, typed views and serialization keep seeing the
//! committed layout until [`Table::commit`] applies the staged schema:
//!
//! ```text
//!              setup / add / rem            commit
//!  committed ─────────────────────> staged ────────> committed
//!                                      │
//!                                      ├─ new shape or never committed:
//!                                      │    full rebuild, defaults broadcast
//!                                      │
//!                                      └─ same shape:
//!                                           per-cell migration through a
//!                                           CopyPlan (keep / default / drop)
//! ```
//!
//! A field staged with `add` is invisible until commit. A field staged with
//! `rem` stays readable until commit. After commit, field indices are dense
//! and in declaration order.
//!
//! ## Exported Keys
//!
//! A table publishes read-only metadata through its record: `dims`, `fields`,
//! `size[i]`, `stride[i]`, `field[i].name`, `field[i].type`, `field[i].size`
//! and `field[i].default`.

mod commit;
mod exports;
mod field;
mod io;

#[cfg(test)]
mod tests;

pub use field::{Field, FieldMut, FieldType};

use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::{smallvec, SmallVec};
use zerocopy::IntoBytes;

use crate::symbols::{SymbolTable, Token};

use commit::CopyPlan;

pub type Shape = SmallVec<[usize; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Present in the committed buffer.
    Stored,
    /// Staged, not yet in the buffer.
    Added,
    /// Still in the buffer, dropped on the next commit.
    Deleted,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    name: Token,
    type_name: Token,
    size: usize,
    default: Box<[u8]>,
    offset: usize,
    state: FieldState,
}

impl FieldDef {
    pub fn name(&self) -> Token {
        self.name
    }

    pub fn type_name(&self) -> Token {
        self.type_name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn default_bytes(&self) -> &[u8] {
        &self.default
    }

    /// Byte offset inside a cell. Meaningless while the field is `Added`.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn state(&self) -> FieldState {
        self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// The next commit rebuilds the buffer from defaults.
    Fresh,
    /// The buffer matches the committed fields and shape.
    Committed,
}

#[derive(Debug, Clone)]
pub struct Table {
    symbols: Arc<SymbolTable>,
    layout: Layout,
    shape: Shape,
    pending_shape: Option<Shape>,
    strides: Shape,
    /// Committed fields (`Stored` or `Deleted`) followed by `Added` ones.
    fields: Vec<FieldDef>,
    committed: usize,
    by_name: HashMap<Token, usize>,
    data: Vec<u8>,
}

/// `start` times every extent of `shape`, or `None` if any partial product
/// overflows.
pub(crate) fn extent(start: usize, shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(start, |acc, &size| acc.checked_mul(size))
}

impl Table {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            layout: Layout::Fresh,
            shape: Shape::new(),
            pending_shape: None,
            strides: smallvec![0],
            fields: Vec::new(),
            committed: 0,
            by_name: HashMap::new(),
            data: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Stages a new shape. The buffer is rebuilt on the next commit.
    pub fn setup(&mut self, shape: &[usize]) {
        self.pending_shape = Some(Shape::from_slice(shape));
        self.layout = Layout::Fresh;
    }

    pub fn setup_1d(&mut self, x: usize) {
        self.setup(&[x]);
    }

    pub fn setup_2d(&mut self, x: usize, y: usize) {
        self.setup(&[x, y]);
    }

    pub fn setup_3d(&mut self, x: usize, y: usize, z: usize) {
        self.setup(&[x, y, z]);
    }

    pub fn setup_4d(&mut self, x: usize, y: usize, z: usize, w: usize) {
        self.setup(&[x, y, z, w]);
    }

    /// Stages a field. `default` is truncated or zero-padded to `size`. A
    /// live field with the same name is staged for removal.
    pub fn add(&mut self, name: &str, type_name: &str, size: usize, default: &[u8]) {
        let name = self.symbols.intern(name);
        let type_name = self.symbols.intern(type_name);
        self.rem_token(name);

        let mut bytes = vec![0u8; size];
        let n = default.len().min(size);
        bytes[..n].copy_from_slice(&default[..n]);

        self.fields.push(FieldDef {
            name,
            type_name,
            size,
            default: bytes.into_boxed_slice(),
            offset: 0,
            state: FieldState::Added,
        });
    }

    pub fn add_typed<T: FieldType>(&mut self, name: &str, default: T) {
        self.add(
            name,
            T::TYPE_NAME,
            std::mem::size_of::<T>(),
            default.as_bytes(),
        );
    }

    /// Stages removal of `name`. Returns `false` if no live field has it.
    pub fn rem(&mut self, name: &str) -> bool {
        match self.symbols.get(name) {
            Some(name) => self.rem_token(name),
            None => false,
        }
    }

    fn rem_token(&mut self, name: Token) -> bool {
        if let Some(i) = self.fields[self.committed..]
            .iter()
            .position(|f| f.name == name)
        {
            self.fields.remove(self.committed + i);
            return true;
        }

        match self.by_name.get(&name) {
            Some(&i) if self.fields[i].state == FieldState::Stored => {
                self.fields[i].state = FieldState::Deleted;
                true
            }
            _ => false,
        }
    }

    /// True if staged changes are waiting for a commit.
    pub fn is_dirty(&self) -> bool {
        self.layout == Layout::Fresh
            || self.fields.len() > self.committed
            || self.fields[..self.committed]
                .iter()
                .any(|f| f.state == FieldState::Deleted)
    }

    /// Applies staged shape and schema changes. With `use_defaults`, cells
    /// of new fields (or of every field on a rebuild) are filled with the
    /// field defaults; otherwise they are zeroed.
    ///
    /// Returns `false` without touching the table if the new cell count or
    /// buffer size does not fit in `usize`.
    pub fn commit(&mut self, use_defaults: bool) -> bool {
        let plan = CopyPlan::new(&self.fields);
        let shape = self.pending_shape.as_ref().unwrap_or(&self.shape);
        let (Some(cells), Some(_)) = (extent(1, shape), extent(plan.stride(), shape)) else {
            tracing::warn!(?shape, stride = plan.stride(), "table size overflows, commit refused");
            return false;
        };
        if let Some(shape) = self.pending_shape.take() {
            self.shape = shape;
        }

        let data = match self.layout {
            Layout::Fresh => plan.rebuild(&self.fields, cells, use_defaults),
            Layout::Committed => plan.migrate(&self.fields, &self.data, cells, use_defaults),
        };

        self.fields.retain(|f| f.state != FieldState::Deleted);
        for (field, offset) in self.fields.iter_mut().zip(plan.offsets()) {
            field.offset = offset;
            field.state = FieldState::Stored;
        }
        self.committed = self.fields.len();
        self.rebuild_strides(plan.stride());
        self.data = data;
        self.layout = Layout::Committed;
        self.rebuild_index();

        tracing::trace!(
            dims = self.shape.len(),
            fields = self.committed,
            bytes = self.data.len(),
            "table committed"
        );
        true
    }

    fn rebuild_strides(&mut self, cell_size: usize) {
        self.strides.clear();
        self.strides.push(cell_size);
        for (i, &size) in self.shape.iter().enumerate() {
            let next = self.strides[i] * size;
            self.strides.push(next);
        }
    }

    fn rebuild_index(&mut self) {
        self.by_name.clear();
        for (i, field) in self.fields[..self.committed].iter().enumerate() {
            self.by_name.insert(field.name, i);
        }
    }

    pub fn dims(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self, dim: usize) -> Option<usize> {
        self.shape.get(dim).copied()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.shape
    }

    /// `stride(0)` is the cell size, `stride(dims)` the buffer length.
    pub fn stride(&self, dim: usize) -> Option<usize> {
        self.strides.get(dim).copied()
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of cells in the committed shape.
    pub fn count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn field_count(&self) -> usize {
        self.committed
    }

    pub fn field_def(&self, index: usize) -> Option<&FieldDef> {
        self.fields[..self.committed].get(index)
    }

    pub fn field_defs(&self) -> &[FieldDef] {
        &self.fields[..self.committed]
    }

    pub fn field_name(&self, index: usize) -> Option<Token> {
        self.field_def(index).map(FieldDef::name)
    }

    pub fn field_type(&self, index: usize) -> Option<Token> {
        self.field_def(index).map(FieldDef::type_name)
    }

    pub fn field_size(&self, index: usize) -> Option<usize> {
        self.field_def(index).map(FieldDef::size)
    }

    pub fn field_default(&self, index: usize) -> Option<&[u8]> {
        self.field_def(index).map(FieldDef::default_bytes)
    }

    pub fn index_of_token(&self, name: Token) -> Option<usize> {
        self.by_name.get(&name).copied()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_of_token(self.symbols.get(name)?)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// True if `name` exists with type name `type_name`.
    pub fn exists_typed(&self, name: &str, type_name: &str) -> bool {
        self.index_of(name)
            .and_then(|i| self.field_type(i))
            .is_some_and(|t| self.symbols.get(type_name) == Some(t))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of the cell at `pos`. Missing trailing coordinates are
    /// zero; out-of-range coordinates give `None`.
    pub fn cell_offset(&self, pos: &[usize]) -> Option<usize> {
        if pos.len() > self.dims() {
            return None;
        }
        let mut offset = 0;
        for (i, &p) in pos.iter().enumerate() {
            if p >= self.shape[i] {
                return None;
            }
            offset += p * self.strides[i];
        }
        Some(offset)
    }

    pub fn cell(&self, pos: &[usize]) -> Option<&[u8]> {
        let start = self.cell_offset(pos)?;
        self.data.get(start..start + self.strides[0])
    }

    pub fn cell_mut(&mut self, pos: &[usize]) -> Option<&mut [u8]> {
        let start = self.cell_offset(pos)?;
        let end = start + self.strides[0];
        self.data.get_mut(start..end)
    }

    /// Gathers field `index` of every cell, in storage order, into `out`.
    pub fn get_raw(&self, index: usize, out: &mut Vec<u8>) -> bool {
        let Some(field) = self.field_def(index) else {
            return false;
        };
        out.clear();
        out.reserve(field.size * self.count());
        if field.size == 0 {
            return true;
        }
        for cell in self.data.chunks_exact(self.strides[0]) {
            out.extend_from_slice(&cell[field.offset..field.offset + field.size]);
        }
        true
    }

    /// Bytes field `index` occupies across the grid.
    pub fn field_memory(&self, index: usize) -> Option<usize> {
        Some(self.field_size(index)? * self.count())
    }

    pub fn memory(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.data.capacity()
            + self.fields.capacity() * std::mem::size_of::<FieldDef>()
            + self.fields.iter().map(|f| f.default.len()).sum::<usize>()
            + self.by_name.capacity() * std::mem::size_of::<(Token, usize)>()
    }
}
