use crate::config::{LUMP_SCRATCH_CAPACITY, RECORD_BLOCK_FIXED_SIZE};
use crate::encoding::{BlockHeader, Tag};
use crate::stream::{lump_size, InStream, InStreamExt, OutStream, OutStreamExt};
use crate::symbols::Token;

use super::{Record, Value, ValueKind};

impl Record {
    pub fn block_size(&self) -> usize {
        RECORD_BLOCK_FIXED_SIZE
            + self
                .items
                .iter()
                .map(|(key, value)| self.item_size(*key, value))
                .sum::<usize>()
    }

    fn item_size(&self, key: Token, value: &Value) -> usize {
        lump_size(self.symbols.name(key).len())
            + lump_size(value.kind().type_name().len())
            + lump_size(value.encoded_len(&self.symbols))
    }

    /// Writes the record block. `object_size` is the byte count of the
    /// object still to be written, this block included.
    pub fn write_block(&self, object_tag: Tag, object_size: usize, out: &mut dyn OutStream) -> usize {
        let block_size = self.block_size();
        let (Ok(block32), Ok(object32)) = (u32::try_from(block_size), u32::try_from(object_size))
        else {
            out.set_error(true);
            return 0;
        };

        let mut written = BlockHeader::new(Tag::RECORD, object_tag, block32, object32).write(out);
        written += out.write_u32(self.items.len() as u32);

        let mut scratch = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        for (key, value) in &self.items {
            written += out.write_lump(self.symbols.name(*key).as_bytes());
            written += out.write_lump(value.kind().type_name().as_bytes());
            value.encode(&self.symbols, &mut scratch);
            written += out.write_lump(&scratch);
        }

        if written != block_size {
            out.set_error(true);
        }
        written
    }

    /// Reads a record block, merging its items into this record. Aborts the
    /// item loop on the first stream fault.
    pub fn read_block(&mut self, input: &mut dyn InStream) -> bool {
        let start = input.position();
        let Some(header) = BlockHeader::expect(input, Tag::RECORD) else {
            return false;
        };
        let Some(count) = input.read_u32() else {
            return false;
        };

        let mut name = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        let mut type_name = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        let mut bytes = Vec::with_capacity(LUMP_SCRATCH_CAPACITY);
        for _ in 0..count {
            if input.read_lump(&mut name).is_none()
                || input.read_lump(&mut type_name).is_none()
                || input.read_lump(&mut bytes).is_none()
            {
                return false;
            }

            let key = self.symbols.intern(&String::from_utf8_lossy(&name));
            let kind = ValueKind::from_type_name(&type_name);
            let value = Value::decode(kind, &bytes, &self.symbols);
            self.set(key, value);
        }

        let consumed = input.position() - start;
        if consumed != header.block_size() as u64 {
            tracing::trace!(consumed, block_size = header.block_size(), "record block size mismatch");
            input.set_error(true);
            return false;
        }
        true
    }
}
