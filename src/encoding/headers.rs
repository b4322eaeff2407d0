//! # Header Definitions
//!
//! Type-safe, zerocopy-based header structs for the container format.
//!
//! ## Block Header (16 bytes)
//!
//! Every object is serialized as one block per level of its type chain. Each
//! block starts with:
//!
//! ```text
//! Offset  Size  Description
//! 0       3     Block tag (the level this block carries)
//! 3       3     Object tag (the most derived type of the object)
//! 6       4     Block size, header included (u32 little-endian)
//! 10      1     Reserved, must be 0 (high byte of a 5-byte size)
//! 11      4     Remaining object size from this header (u32 little-endian)
//! 15      1     Reserved, must be 0
//! ```
//!
//! The last block of an object has `block tag == object tag`.
//!
//! ## Envelope Header (28 bytes)
//!
//! ```text
//! Offset  Size  Description
//! 0       3     "TAV"
//! 3       3     "TAV"
//! 6       4     Envelope size (u32 little-endian)
//! 10      4     Envelope size, repeated
//! 14      4     Container kind: "JSVT"
//! 18      4     Revision (u32 little-endian)
//! 22      4     Extension (u32 little-endian)
//! 26      2     Producer string length (u16 little-endian)
//! ```
//!
//! The producer string bytes and then the root object follow.
//!
//! ## Zerocopy Safety
//!
//! Both structs are `Unaligned`, so they can be read from any offset of a
//! stream buffer or memory map.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::Tag;
use crate::config::{
    BLOCK_HEADER_SIZE, ENVELOPE_FIXED_SIZE, ENVELOPE_KIND, ENVELOPE_TAG, FORMAT_EXTENSION,
    FORMAT_REVISION, TAG_LEN,
};
use crate::stream::{InStream, InStreamExt, OutStream};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BlockHeader {
    block_tag: [u8; TAG_LEN],
    object_tag: [u8; TAG_LEN],
    block_size: U32,
    block_ext: u8,
    object_size: U32,
    object_ext: u8,
}

const _: () = assert!(std::mem::size_of::<BlockHeader>() == BLOCK_HEADER_SIZE);

impl BlockHeader {
    pub fn new(block_tag: Tag, object_tag: Tag, block_size: u32, object_size: u32) -> Self {
        Self {
            block_tag: block_tag.0,
            object_tag: object_tag.0,
            block_size: U32::new(block_size),
            block_ext: 0,
            object_size: U32::new(object_size),
            object_ext: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= BLOCK_HEADER_SIZE,
            "buffer too small for BlockHeader: {} < {}",
            bytes.len(),
            BLOCK_HEADER_SIZE
        );

        Self::ref_from_bytes(&bytes[..BLOCK_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse BlockHeader: {:?}", e))
    }

    zerocopy_getters! {
        block_size: u32,
        object_size: u32,
    }

    pub fn block_tag(&self) -> Tag {
        Tag(self.block_tag)
    }

    pub fn object_tag(&self) -> Tag {
        Tag(self.object_tag)
    }

    /// True for the final block of an object.
    pub fn is_terminal(&self) -> bool {
        self.block_tag == self.object_tag
    }

    /// True if either reserved byte is set, i.e. a size beyond 4 GiB.
    pub fn is_extended(&self) -> bool {
        self.block_ext != 0 || self.object_ext != 0
    }

    /// Consumes one header, flagging the stream on a short read.
    pub fn read(input: &mut dyn InStream) -> Option<Self> {
        let mut raw = [0u8; BLOCK_HEADER_SIZE];
        if !input.read_exact_or_fail(&mut raw) {
            return None;
        }
        Self::read_from_bytes(&raw).ok()
    }

    /// Consumes one header and checks that it carries `tag` with no size
    /// extension. Any mismatch flags the stream.
    pub fn expect(input: &mut dyn InStream, tag: Tag) -> Option<Self> {
        let header = Self::read(input)?;
        if header.block_tag() != tag || header.is_extended() {
            tracing::trace!(
                expected = %tag,
                found = %header.block_tag(),
                "unexpected block header"
            );
            input.set_error(true);
            return None;
        }
        Some(header)
    }

    /// Returns the (block tag, object tag) pair of the next header without
    /// consuming it.
    pub fn peek_tags(input: &mut dyn InStream) -> Option<(Tag, Tag)> {
        let mut raw = [0u8; 2 * TAG_LEN];
        if input.peek(&mut raw) != raw.len() {
            return None;
        }
        let mut block = [0u8; TAG_LEN];
        let mut object = [0u8; TAG_LEN];
        block.copy_from_slice(&raw[..TAG_LEN]);
        object.copy_from_slice(&raw[TAG_LEN..]);
        Some((Tag(block), Tag(object)))
    }

    pub fn write(&self, out: &mut dyn OutStream) -> usize {
        out.write(self.as_bytes())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct EnvelopeHeader {
    tag: [u8; TAG_LEN],
    tag_copy: [u8; TAG_LEN],
    size: U32,
    size_copy: U32,
    kind: [u8; 4],
    revision: U32,
    extension: U32,
    producer_len: U16,
}

const _: () = assert!(std::mem::size_of::<EnvelopeHeader>() == ENVELOPE_FIXED_SIZE);

impl EnvelopeHeader {
    pub fn new(size: u32, producer_len: u16) -> Self {
        Self {
            tag: ENVELOPE_TAG,
            tag_copy: ENVELOPE_TAG,
            size: U32::new(size),
            size_copy: U32::new(size),
            kind: ENVELOPE_KIND,
            revision: U32::new(FORMAT_REVISION),
            extension: U32::new(FORMAT_EXTENSION),
            producer_len: U16::new(producer_len),
        }
    }

    /// Parses the fixed envelope prefix. Fails on a bad tag or on size copies
    /// that disagree; the kind, revision and extension are left for
    /// [`Container::check`](crate::container::Container::check).
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= ENVELOPE_FIXED_SIZE,
            "buffer too small for EnvelopeHeader: {} < {}",
            bytes.len(),
            ENVELOPE_FIXED_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..ENVELOPE_FIXED_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse EnvelopeHeader: {:?}", e))?;

        ensure!(
            header.tag == ENVELOPE_TAG && header.tag_copy == ENVELOPE_TAG,
            "invalid envelope tag"
        );
        ensure!(
            header.size.get() == header.size_copy.get(),
            "envelope size copies disagree: {} != {}",
            header.size.get(),
            header.size_copy.get()
        );

        Ok(header)
    }

    zerocopy_accessors! {
        size: u32,
        revision: u32,
        extension: u32,
        producer_len: u16,
    }

    pub fn kind(&self) -> [u8; 4] {
        self.kind
    }

    pub fn set_kind(&mut self, kind: [u8; 4]) {
        self.kind = kind;
    }

    /// Writes the header with both size copies set to `size()`.
    pub fn write(&self, out: &mut dyn OutStream) -> usize {
        let mut header = *self;
        header.size_copy = header.size;
        out.write(header.as_bytes())
    }
}
