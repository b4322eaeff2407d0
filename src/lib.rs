//! # svtree - Self-Describing Hierarchical Data Store
//!
//! svtree stores algorithm inputs and outputs as a tree of typed nodes and
//! serializes that tree to a binary container that older and newer programs
//! can both read:
//!
//! - **Typed nodes**: plain nodes, keyed records, and n-dimensional tables
//!   with a runtime field schema
//! - **Staged schema changes**: fields are added and removed freely, then a
//!   single commit re-lays-out the table buffer
//! - **Forward compatibility**: objects of unknown types load as their most
//!   derived known ancestor, skipping the blocks that cannot be understood
//!
//! ## Quick Start
//!
//! ```ignore
//! use svtree::{container, Registry, SymbolTable};
//!
//! let registry = Registry::new(SymbolTable::shared());
//! let mut tree = registry.new_tree();
//!
//! let image = tree.new_table();
//! let table = tree.table_mut(image).unwrap();
//! table.setup_2d(640, 480);
//! table.add_typed::<f32>("depth", 0.0);
//! table.commit(true);
//!
//! tree.record_mut(image).unwrap().item_str("camera").set_string("left");
//!
//! container::save_file(&tree, image, "depth.svt", true)?;
//! let loaded = container::load_file(&registry, "depth.svt")?;
//! assert!(!loaded.warning);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   container (envelope, files)       │
//! ├─────────────────────────────────────┤
//! │   registry (tags, polymorphic load) │
//! ├──────────────┬──────────────────────┤
//! │   tree       │  record  │  table    │
//! │   (arena,    │  (items, │  (schema, │
//! │   rings)     │  exports)│  commit)  │
//! ├──────────────┴──────────────────────┤
//! │   encoding (tags, block headers)    │
//! ├─────────────────────────────────────┤
//! │   stream (in/out, sticky errors)    │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Type Chain
//!
//! | Tag | Type | Extends | Block payload |
//! |-----|------|---------|---------------|
//! | `HON` | Node | - | child count, children |
//! | `SID` | Record | `HON` | item count, items |
//! | `MID` | Table | `SID` | shape, fields, data |
//!
//! An object is written as one block per level of its chain. Each block
//! header names both its own level and the most derived type of the object,
//! which is what lets a reader stop at the last level it understands.
//!
//! ## Module Overview
//!
//! - [`stream`]: byte stream traits and in-memory / `std::io` adapters
//! - [`encoding`]: type tags and zerocopy block / envelope headers
//! - [`symbols`]: shared string interning for keys and names
//! - [`tree`]: node arena and sibling ring operations
//! - [`record`]: keyed scalar items and exported keys
//! - [`table`]: n-dimensional field storage and schema commit
//! - [`registry`]: type registration, fallback loading, type constraints
//! - [`container`]: envelope, stream and file entry points
//! - [`config`]: format constants

#[macro_use]
mod macros;

pub mod config;
pub mod container;
pub mod encoding;
pub mod record;
pub mod registry;
pub mod stream;
pub mod symbols;
pub mod table;
pub mod tree;

pub use container::{Container, Loaded};
pub use encoding::Tag;
pub use record::{Exports, Record, Value, ValueKind};
pub use registry::{Registry, TypeSpec};
pub use symbols::{SymbolTable, Token};
pub use table::{FieldType, Table};
pub use tree::{Body, Level, NodeId, Tree};
