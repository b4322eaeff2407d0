use crate::config::BLOCK_HEADER_SIZE;
use crate::encoding::{BlockHeader, Tag};
use crate::stream::{InStream, InStreamExt};
use crate::tree::{NodeId, Tree};

use super::Registry;

/// Drives one polymorphic load, carrying the stream and the downgrade count
/// through nested object loads.
pub struct Loader<'a> {
    registry: &'a Registry,
    input: &'a mut (dyn InStream + 'a),
    downgraded: usize,
    skipped: u64,
}

impl<'a> Loader<'a> {
    pub fn new(registry: &'a Registry, input: &'a mut (dyn InStream + 'a)) -> Self {
        Self {
            registry,
            input,
            downgraded: 0,
            skipped: 0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn input(&mut self) -> &mut (dyn InStream + 'a) {
        &mut *self.input
    }

    pub fn downgraded(&self) -> usize {
        self.downgraded
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Loads the next object. Known object types go straight to their
    /// loader; unknown ones are rebuilt block by block as the most derived
    /// known ancestor, with the remaining blocks skipped.
    pub fn load_object(&mut self, tree: &mut Tree) -> Option<NodeId> {
        let registry = self.registry;
        let Some((block_tag, object_tag)) = BlockHeader::peek_tags(&mut *self.input) else {
            self.input.set_error(true);
            return None;
        };

        if let Some(entry) = registry.entry(object_tag) {
            let load = entry.load;
            return load(self, tree, None);
        }

        tracing::warn!(%object_tag, "unknown object type, loading as ancestor");
        let mut current: Option<NodeId> = None;
        let mut next_block = block_tag;

        while let Some(entry) = registry.entry(next_block) {
            let (create, load) = (entry.create, entry.load);
            if let Some(node) = current {
                if create(tree, Some(node)).is_none() {
                    break;
                }
            }
            match load(self, tree, current) {
                Some(node) => current = Some(node),
                None => return current,
            }
            if self.input.error() {
                return current;
            }

            match BlockHeader::peek_tags(&mut *self.input) {
                Some((tag, _)) => next_block = tag,
                None => {
                    self.input.set_error(true);
                    return current;
                }
            }
        }

        if !self.skip_object(object_tag) {
            return current;
        }
        if let Some(node) = current {
            self.downgraded += 1;
            tracing::warn!(
                %object_tag,
                loaded_as = tree.type_name(node).unwrap_or("?"),
                "object downgraded"
            );
        }
        current
    }

    /// Skips blocks of `object_tag` up to and including its terminal block.
    fn skip_object(&mut self, object_tag: Tag) -> bool {
        loop {
            let Some(header) = BlockHeader::read(&mut *self.input) else {
                return false;
            };
            let block_size = header.block_size() as usize;
            if header.object_tag() != object_tag
                || header.is_extended()
                || block_size < BLOCK_HEADER_SIZE
            {
                self.input.set_error(true);
                return false;
            }
            if !self.input.skip_or_fail(block_size - BLOCK_HEADER_SIZE) {
                return false;
            }

            tracing::warn!(block = %header.block_tag(), %object_tag, block_size, "skipped unknown block");
            self.skipped += block_size as u64;
            if header.is_terminal() {
                return true;
            }
        }
    }
}
