//! # Type Registry
//!
//! The registry maps a 3-byte type tag to the functions that construct and
//! load objects of that type, plus the tag of the type it extends. Loading is
//! polymorphic: the registry reads the tags of the next block and dispatches
//! to the right loader.
//!
//! ## Built-in Types
//!
//! ```text
//! HON  Node    (no parent)
//! SID  Record  extends HON
//! MID  Table   extends SID
//! ```
//!
//! ## Loading Unknown Types
//!
//! A file written by a newer program may hold an object whose type this
//! registry does not know. Its blocks still start with known base levels, so
//! the loader rebuilds the most derived level it understands and skips the
//! rest:
//!
//! ```text
//! [HON/XYZ] [SID/XYZ] [XYZ/XYZ]
//!     │         │         │
//!     │         │         └─ unknown block tag: skip by block size
//!     │         └─ create(SID) upgrades the node in place, load SID block
//!     └─ create(HON), load HON block (children included)
//!
//! result: a record node, stream positioned after the whole object
//! ```
//!
//! Every downgrade is counted on the [`Loader`] and logged with
//! `tracing::warn!`, so container loads can report "loaded but downgraded".
//!
//! ## Type Constraints
//!
//! Independently of tags, named [`TypeSpec`]s describe structural
//! requirements (level, keys, dimensions, fields) that a node can be tested
//! against with [`Registry::is_type`].

mod builtin;
mod loader;
mod spec;


pub use builtin::{create_node, create_record, create_table, load_node, load_record, load_table};
pub use loader::Loader;
pub use spec::{Bound, TypeSpec};

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::encoding::Tag;
use crate::stream::InStream;
use crate::symbols::{SymbolTable, Token};
use crate::tree::{NodeId, Tree};

/// Builds a new object (`None`) or upgrades an existing one in place
/// (`Some`). Returns `None` if the upgrade is impossible.
pub type CreateFn = fn(&mut Tree, Option<NodeId>) -> Option<NodeId>;

/// Loads one object, or the next block of a partially built one. Returns
/// the object even when the stream faulted part-way; callers check the
/// stream error flag.
pub type LoadFn = fn(&mut Loader<'_>, &mut Tree, Option<NodeId>) -> Option<NodeId>;

#[derive(Clone, Copy)]
pub struct TypeEntry {
    pub tag: Tag,
    pub parent: Option<Tag>,
    pub create: CreateFn,
    pub load: LoadFn,
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("tag", &self.tag)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

/// Result of one top-level object load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub node: Option<NodeId>,
    /// Objects rebuilt as an ancestor type.
    pub downgraded: usize,
    /// Bytes of unknown blocks skipped.
    pub skipped: u64,
}

pub struct Registry {
    symbols: Arc<SymbolTable>,
    types: HashMap<Tag, TypeEntry>,
    specs: HashMap<Token, TypeSpec>,
}

impl Registry {
    /// A registry with the node, record and table types registered.
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        let mut registry = Self::empty(symbols);
        registry.register(Tag::NODE, None, create_node, load_node);
        registry.register(Tag::RECORD, Some(Tag::NODE), create_record, load_record);
        registry.register(Tag::TABLE, Some(Tag::RECORD), create_table, load_table);
        registry
    }

    pub fn empty(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            types: HashMap::new(),
            specs: HashMap::new(),
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// A tree sharing this registry's symbol table.
    pub fn new_tree(&self) -> Tree {
        Tree::new(Arc::clone(&self.symbols))
    }

    /// Registers `tag`, replacing any earlier registration of it.
    pub fn register(&mut self, tag: Tag, parent: Option<Tag>, create: CreateFn, load: LoadFn) {
        self.types.insert(
            tag,
            TypeEntry {
                tag,
                parent,
                create,
                load,
            },
        );
    }

    pub fn unregister(&mut self, tag: Tag) -> Option<TypeEntry> {
        self.types.remove(&tag)
    }

    pub fn entry(&self, tag: Tag) -> Option<&TypeEntry> {
        self.types.get(&tag)
    }

    pub fn is_registered(&self, tag: Tag) -> bool {
        self.types.contains_key(&tag)
    }

    /// `tag` followed by its declared ancestors, most derived first. Stops at
    /// the first unregistered tag or on a cycle.
    pub fn ancestors(&self, tag: Tag) -> Vec<Tag> {
        let mut chain = Vec::new();
        let mut cursor = Some(tag);
        while let Some(current) = cursor {
            if chain.contains(&current) {
                break;
            }
            let Some(entry) = self.entry(current) else {
                break;
            };
            chain.push(current);
            cursor = entry.parent;
        }
        chain
    }

    /// Builds a new object of `tag` in `tree`.
    pub fn create(&self, tag: Tag, tree: &mut Tree) -> Option<NodeId> {
        (self.entry(tag)?.create)(tree, None)
    }

    /// Loads one object from `input` into `tree`.
    pub fn load_object(&self, tree: &mut Tree, input: &mut dyn InStream) -> LoadOutcome {
        let mut loader = Loader::new(self, input);
        let node = loader.load_object(tree);
        LoadOutcome {
            node,
            downgraded: loader.downgraded(),
            skipped: loader.skipped(),
        }
    }

    /// Returns the constraint set called `name`, creating an empty one.
    pub fn define_type(&mut self, name: &str) -> &mut TypeSpec {
        let name = self.symbols.intern(name);
        self.specs.entry(name).or_default()
    }

    pub fn type_spec(&self, name: &str) -> Option<&TypeSpec> {
        self.specs.get(&self.symbols.get(name)?)
    }

    /// True if `node` satisfies the constraint set `name`. Undefined names
    /// accept every node.
    pub fn is_type(&self, name: &str, tree: &Tree, node: NodeId) -> bool {
        match self.type_spec(name) {
            Some(spec) => spec.matches(tree, node),
            None => tree.contains(node),
        }
    }
}
