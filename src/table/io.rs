use crate::config::{LUMP_SCRATCH_CAPACITY, TABLE_BLOCK_FIXED_SIZE};
use crate::encoding::{BlockHeader, Tag};
use crate::stream::{lump_size, InStream, InStreamExt, OutStream, OutStreamExt};

use super::{extent, FieldDef, FieldState, Layout, Shape, Table};

impl Table {
    /// Size of the table block for the committed layout.
    pub fn block_size(&self) -> usize {
        TABLE_BLOCK_FIXED_SIZE
            + 4 * self.dims()
            + self.fields[..self.committed]
                .iter()
                .map(|f| {
                    lump_size(self.symbols.name(f.name).len())
                        + lump_size(self.symbols.name(f.type_name).len())
                        + lump_size(f.size)
                })
                .sum::<usize>()
            + self.data.len()
    }

    /// Writes the committed layout and buffer. Staged changes are not
    /// serialized.
    pub fn write_block(&self, object_tag: Tag, object_size: usize, out: &mut dyn OutStream) -> usize {
        let block_size = self.block_size();
        let (Ok(block32), Ok(object32)) = (u32::try_from(block_size), u32::try_from(object_size))
        else {
            out.set_error(true);
            return 0;
        };

        let mut written = BlockHeader::new(Tag::TABLE, object_tag, block32, object32).write(out);
        written += out.write_u32(self.dims() as u32);
        for &size in &self.shape {
            let Ok(size) = u32::try_from(size) else {
                out.set_error(true);
                return written;
            };
            written += out.write_u32(size);
        }

        written += out.write_u32(self.committed as u32);
        for field in &self.fields[..self.committed] {
            written += out.write_lump(self.symbols.name(field.name).as_bytes());
            written += out.write_lump(self.symbols.name(field.type_name).as_bytes());
            written += out.write_lump(&field.default);
        }
        written += out.write(&self.data);

        if written != block_size {
            out.set_error(true);
        }
        written
    }

    /// Replaces the layout and buffer with a table block read from `input`.
    pub fn read_block(&mut self, input: &mut dyn InStream) -> bool {
        let start = input.position();
        let Some(header) = BlockHeader::expect(input, Tag::TABLE) else {
            return false;
        };
        let end = start + header.block_size() as u64;
        let remaining = |input: &dyn InStream| end.saturating_sub(input.position());

        let Some(dims) = input.read_u32() else {
            return false;
        };
        if 4 * dims as u64 > remaining(input) {
            input.set_error(true);
            return false;
        }
        let mut shape = Shape::new();
        for _ in 0..dims {
            let Some(size) = input.read_u32() else {
                return false;
            };
            shape.push(size as usize);
        }

        let Some(count) = input.read_u32() else {
            return false;
        };
        let mut fields = Vec::new();
        let mut name = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        let mut type_name = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        let mut default = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        let mut offset = 0;
        for _ in 0..count {
            if input.read_lump(&mut name).is_none()
                || input.read_lump(&mut type_name).is_none()
                || input.read_lump(&mut default).is_none()
            {
                return false;
            }
            fields.push(FieldDef {
                name: self.symbols.intern(&String::from_utf8_lossy(&name)),
                type_name: self.symbols.intern(&String::from_utf8_lossy(&type_name)),
                size: default.len(),
                default: default.as_slice().into(),
                offset,
                state: FieldState::Stored,
            });
            offset += default.len();
        }

        if input.position() > end {
            tracing::trace!(position = input.position(), end, "table fields overrun block");
            input.set_error(true);
            return false;
        }
        let (Some(_), Some(expected)) = (extent(1, &shape), extent(offset, &shape)) else {
            tracing::trace!(?shape, "table size overflows");
            input.set_error(true);
            return false;
        };
        if expected as u64 != remaining(input) {
            tracing::trace!(expected, remaining = remaining(input), "table data size mismatch");
            input.set_error(true);
            return false;
        }

        let mut data = vec![0u8; expected];
        if !input.read_exact_or_fail(&mut data) {
            return false;
        }

        self.shape = shape;
        self.pending_shape = None;
        self.fields = fields;
        self.committed = self.fields.len();
        self.data = data;
        self.layout = Layout::Committed;
        self.rebuild_strides(offset);
        self.rebuild_index();
        true
    }
}
