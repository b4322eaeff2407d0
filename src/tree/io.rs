//! Node block serialization.
//!
//! An object is written as one block per level, base level first:
//!
//! ```text
//! [HON block: header | child count | child objects...]
//! [SID block: header | items...]            (records and tables)
//! [MID block: header | shape | fields | data] (tables only)
//! ```
//!
//! Every header carries the remaining byte count of the whole object, so a
//! reader that does not know a later block can skip straight past it.

use crate::config::NODE_BLOCK_FIXED_SIZE;
use crate::encoding::{BlockHeader, Tag};
use crate::registry::Loader;
use crate::stream::{InStreamExt, OutStream, OutStreamExt};

use super::{NodeId, Tree};

impl Tree {
    /// Size of the node block of `id`, children included.
    pub fn write_size(&self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        NODE_BLOCK_FIXED_SIZE
            + self
                .children(id)
                .map(|child| self.total_write_size(child))
                .sum::<usize>()
    }

    /// Size of every block of `id`, i.e. the serialized object size.
    pub fn total_write_size(&self, id: NodeId) -> usize {
        let Some(body) = self.body(id) else {
            return 0;
        };
        let mut size = self.write_size(id);
        if let Some(record) = body.record() {
            size += record.block_size();
        }
        if let Some(table) = body.table() {
            size += table.block_size();
        }
        size
    }

    /// Serializes `id` and its subtree. Any size mismatch flags `out`.
    pub fn write(&self, id: NodeId, out: &mut dyn OutStream) -> usize {
        let Some(body) = self.body(id) else {
            out.set_error(true);
            return 0;
        };

        let object_tag = body.tag();
        let total = self.total_write_size(id);
        let mut written = self.write_node_block(id, object_tag, total, out);

        if let Some(record) = body.record() {
            written += record.write_block(object_tag, total.saturating_sub(written), out);
        }
        if let Some(table) = body.table() {
            written += table.write_block(object_tag, total.saturating_sub(written), out);
        }

        if written != total {
            tracing::trace!(%object_tag, written, total, "object size mismatch");
            out.set_error(true);
        }
        written
    }

    fn write_node_block(
        &self,
        id: NodeId,
        object_tag: Tag,
        object_size: usize,
        out: &mut dyn OutStream,
    ) -> usize {
        let block_size = self.write_size(id);
        let (Ok(block32), Ok(object32)) = (u32::try_from(block_size), u32::try_from(object_size))
        else {
            out.set_error(true);
            return 0;
        };

        let mut written = BlockHeader::new(Tag::NODE, object_tag, block32, object32).write(out);
        written += out.write_u32(self.child_count(id) as u32);
        for child in self.children(id) {
            written += self.write(child, out);
        }

        if written != block_size {
            out.set_error(true);
        }
        written
    }

    /// Reads a node block into `id`, loading and appending each child in
    /// order. Stops at the first failure, leaving the stream flagged.
    pub(crate) fn read_node_block(&mut self, id: NodeId, loader: &mut Loader<'_>) -> bool {
        let start = loader.input().position();
        let Some(header) = BlockHeader::expect(loader.input(), Tag::NODE) else {
            return false;
        };
        let Some(count) = loader.input().read_u32() else {
            return false;
        };

        let block_size = header.block_size() as u64;
        if block_size < NODE_BLOCK_FIXED_SIZE as u64 {
            loader.input().set_error(true);
            return false;
        }

        for _ in 0..count {
            if loader.input().error() {
                return false;
            }
            let Some(child) = loader.load_object(self) else {
                loader.input().set_error(true);
                return false;
            };
            self.attach_parent(child, id);
        }

        let consumed = loader.input().position() - start;
        if consumed != block_size {
            tracing::trace!(consumed, block_size, "node block size mismatch");
            loader.input().set_error(true);
            return false;
        }
        !loader.input().error()
    }
}
