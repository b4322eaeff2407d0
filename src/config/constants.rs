//! # svtree Format Constants
//!
//! This module centralizes every constant of the binary container format.
//! Values that depend on each other are co-located and the relationships are
//! enforced with compile-time assertions, so a change to one cannot silently
//! desynchronize the others.
//!
//! ## Dependency Graph
//!
//! ```text
//! TAG_LEN (3 bytes)
//!       │
//!       ├─> BLOCK_HEADER_SIZE (16 bytes, fixed)
//!       │     2 * TAG_LEN + 4 (block size) + 1 (reserved)
//!       │                 + 4 (object size) + 1 (reserved)
//!       │
//!       ├─> NODE_BLOCK_FIXED_SIZE   = BLOCK_HEADER_SIZE + 4 (child count)
//!       ├─> RECORD_BLOCK_FIXED_SIZE = BLOCK_HEADER_SIZE + 4 (item count)
//!       └─> TABLE_BLOCK_FIXED_SIZE  = BLOCK_HEADER_SIZE + 4 (dim count)
//!                                                       + 4 (field count)
//!
//! ENVELOPE_TAG (3 bytes, "TAV")
//!       │
//!       └─> ENVELOPE_FIXED_SIZE (28 bytes)
//!             2 * TAG_LEN + 2 * 4 (size copies) + 4 (kind)
//!             + 4 (revision) + 4 (extension) + 2 (producer length)
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `BLOCK_HEADER_SIZE == 16` (the wire format is fixed)
//! 2. `ENVELOPE_FIXED_SIZE == 28`
//! 3. `MAX_LUMP_LEN == u16::MAX` (lumps carry a 2-byte length prefix)
//!
//! ## Revision Policy
//!
//! `FORMAT_REVISION` changes only when no previous reader can open a file.
//! `FORMAT_EXTENSION` counts additive changes that older readers survive by
//! falling back to ancestor types. A reader accepts any file with the same
//! revision and an extension no greater than its own.

/// Length of every type tag in the block format.
pub const TAG_LEN: usize = 3;

/// Tag of the base tree node ("hierarchy of nodes").
pub const NODE_TAG: [u8; TAG_LEN] = *b"HON";

/// Tag of the key/value record ("single instance data").
pub const RECORD_TAG: [u8; TAG_LEN] = *b"SID";

/// Tag of the dense N-dimensional table ("multiple instance data").
pub const TABLE_TAG: [u8; TAG_LEN] = *b"MID";

/// Tag repeated twice at the very start of a container.
pub const ENVELOPE_TAG: [u8; TAG_LEN] = *b"TAV";

/// Container kind written after the envelope sizes.
pub const ENVELOPE_KIND: [u8; 4] = *b"JSVT";

pub const FORMAT_REVISION: u32 = 1;
pub const FORMAT_EXTENSION: u32 = 0;

pub const BLOCK_HEADER_SIZE: usize = 16;
pub const COUNT_SIZE: usize = 4;

pub const NODE_BLOCK_FIXED_SIZE: usize = BLOCK_HEADER_SIZE + COUNT_SIZE;
pub const RECORD_BLOCK_FIXED_SIZE: usize = BLOCK_HEADER_SIZE + COUNT_SIZE;
pub const TABLE_BLOCK_FIXED_SIZE: usize = BLOCK_HEADER_SIZE + 2 * COUNT_SIZE;

/// Every lump (name, type name, value) is prefixed with a u16 length.
pub const LUMP_PREFIX_SIZE: usize = 2;
pub const MAX_LUMP_LEN: usize = u16::MAX as usize;

pub const ENVELOPE_FIXED_SIZE: usize = 2 * TAG_LEN + 2 * 4 + 4 + 4 + 4 + LUMP_PREFIX_SIZE;

/// Producer string written into containers unless the caller overrides it.
pub const DEFAULT_PRODUCER: &str = concat!("svtree ", env!("CARGO_PKG_VERSION"));

/// Initial scratch capacity used when reading lumps.
pub const LUMP_SCRATCH_CAPACITY: usize = 128;

const _: () = assert!(BLOCK_HEADER_SIZE == 2 * TAG_LEN + 4 + 1 + 4 + 1);
const _: () = assert!(BLOCK_HEADER_SIZE == 16);
const _: () = assert!(ENVELOPE_FIXED_SIZE == 28);
const _: () = assert!(MAX_LUMP_LEN == u16::MAX as usize);
const _: () = assert!(DEFAULT_PRODUCER.len() <= MAX_LUMP_LEN);
