//! # Container Files
//!
//! A container wraps exactly one root object in a small envelope that
//! identifies the format and the program that wrote it:
//!
//! ```text
//! +----------------------------+
//! | EnvelopeHeader (28 bytes)  |  "TAV" "TAV" size size "JSVT" rev ext len
//! +----------------------------+
//! | producer string (len)      |  e.g. "svtree 0.1.0"
//! +----------------------------+
//! | root object                |  HON / SID / MID blocks, children nested
//! +----------------------------+
//! ```
//!
//! ## Failure Model
//!
//! Inside the object tree, faults only set the stream error flag. This
//! module is the boundary where they become `eyre` errors:
//!
//! | Situation | Result |
//! |-----------|--------|
//! | bad envelope tag, size copies disagree, short envelope | `Err` |
//! | no object level could be rebuilt | `Err` |
//! | object downgraded to an ancestor type | `Ok`, `warning = true` |
//! | stream fault after the root was built | `Ok`, `warning = true` |
//! | unexpected kind, revision or extension | `Ok`, `warning = true` |
//!
//! ## Files
//!
//! [`load_file`] memory-maps the file read-only and parses it in place.
//! [`save_file`] streams through a `BufWriter` and refuses to replace an
//! existing file unless asked to.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

use eyre::{bail, ensure, Result, WrapErr};
use memmap2::Mmap;

use crate::config::{
    DEFAULT_PRODUCER, ENVELOPE_FIXED_SIZE, ENVELOPE_KIND, FORMAT_EXTENSION, FORMAT_REVISION,
    MAX_LUMP_LEN,
};
use crate::encoding::EnvelopeHeader;
use crate::registry::Registry;
use crate::stream::{InStream, InStreamExt, IoWriter, OutStream, SliceReader, VecWriter};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    kind: [u8; 4],
    revision: u32,
    extension: u32,
    producer: String,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            kind: ENVELOPE_KIND,
            revision: FORMAT_REVISION,
            extension: FORMAT_EXTENSION,
            producer: DEFAULT_PRODUCER.to_owned(),
        }
    }
}

/// A root object read from a container.
#[derive(Debug)]
pub struct Loaded {
    pub tree: Tree,
    pub root: NodeId,
    /// Envelope as read from the input.
    pub container: Container,
    /// Set when the data was downgraded, partially read or written by an
    /// unsupported format revision.
    pub warning: bool,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    pub fn kind(&self) -> [u8; 4] {
        self.kind
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn extension(&self) -> u32 {
        self.extension
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// True if the envelope describes a format this crate fully supports.
    pub fn check(&self) -> bool {
        self.kind == ENVELOPE_KIND
            && self.revision == FORMAT_REVISION
            && self.extension == FORMAT_EXTENSION
    }

    /// Writes the envelope and the object rooted at `root`. Returns the total
    /// bytes written.
    pub fn save(&self, tree: &Tree, root: NodeId, out: &mut dyn OutStream) -> Result<usize> {
        ensure!(tree.contains(root), "root node {:?} is not in the tree", root);
        ensure!(
            self.producer.len() <= MAX_LUMP_LEN,
            "producer string too long: {} bytes",
            self.producer.len()
        );

        let object_size = tree.total_write_size(root);
        let total = ENVELOPE_FIXED_SIZE + self.producer.len() + object_size;
        let Ok(total32) = u32::try_from(total) else {
            bail!("container of {} bytes exceeds the 4 GiB format limit", total);
        };

        let mut header = EnvelopeHeader::new(total32, self.producer.len() as u16);
        header.set_kind(self.kind);
        header.set_revision(self.revision);
        header.set_extension(self.extension);

        let mut written = header.write(out);
        written += out.write(self.producer.as_bytes());
        written += tree.write(root, out);

        ensure!(!out.error(), "stream error while writing container");
        ensure!(
            written == total,
            "container size mismatch: wrote {} of {} bytes",
            written,
            total
        );

        tracing::debug!(bytes = written, nodes = tree.len(), "container saved");
        Ok(written)
    }

    /// Reads an envelope and its root object.
    pub fn load(registry: &Registry, input: &mut dyn InStream) -> Result<Loaded> {
        let mut raw = [0u8; ENVELOPE_FIXED_SIZE];
        ensure!(
            input.read_exact_or_fail(&mut raw),
            "input too short for a container envelope"
        );
        let header = EnvelopeHeader::from_bytes(&raw).wrap_err("invalid container envelope")?;

        let mut producer = vec![0u8; header.producer_len() as usize];
        ensure!(
            input.read_exact_or_fail(&mut producer),
            "input too short for the producer string"
        );

        let container = Container {
            kind: header.kind(),
            revision: header.revision(),
            extension: header.extension(),
            producer: String::from_utf8_lossy(&producer).into_owned(),
        };
        if !container.check() {
            tracing::warn!(
                revision = container.revision,
                extension = container.extension,
                producer = %container.producer,
                "unsupported container revision"
            );
        }

        let mut tree = registry.new_tree();
        let outcome = registry.load_object(&mut tree, input);
        let Some(root) = outcome.node else {
            bail!("container holds no loadable root object");
        };

        let warning = outcome.downgraded > 0 || input.error() || !container.check();
        tracing::debug!(
            bytes = input.position(),
            nodes = tree.len(),
            downgraded = outcome.downgraded,
            warning,
            "container loaded"
        );

        Ok(Loaded {
            tree,
            root,
            container,
            warning,
        })
    }
}

pub fn save(tree: &Tree, root: NodeId, out: &mut dyn OutStream) -> Result<usize> {
    Container::default().save(tree, root, out)
}

pub fn load(registry: &Registry, input: &mut dyn InStream) -> Result<Loaded> {
    Container::load(registry, input)
}

pub fn save_to_vec(tree: &Tree, root: NodeId) -> Result<Vec<u8>> {
    let mut out = VecWriter::with_capacity(tree.total_write_size(root) + ENVELOPE_FIXED_SIZE);
    save(tree, root, &mut out)?;
    Ok(out.into_inner())
}

pub fn load_from_slice(registry: &Registry, bytes: &[u8]) -> Result<Loaded> {
    load(registry, &mut SliceReader::new(bytes))
}

/// Saves to `path`. Fails if the file exists and `overwrite` is false.
pub fn save_file<P: AsRef<Path>>(tree: &Tree, root: NodeId, path: P, overwrite: bool) -> Result<()> {
    let path = path.as_ref();

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options
        .open(path)
        .wrap_err_with(|| format!("failed to create container file '{}'", path.display()))?;

    let mut out = IoWriter::new(BufWriter::new(file));
    save(tree, root, &mut out)
        .wrap_err_with(|| format!("failed to write container file '{}'", path.display()))?;
    ensure!(out.flush(), "failed to flush container file '{}'", path.display());

    let file = out
        .into_inner()
        .into_inner()
        .map_err(|e| eyre::eyre!("failed to flush container file '{}': {}", path.display(), e))?;
    file.sync_all()
        .wrap_err_with(|| format!("failed to sync container file '{}'", path.display()))
}

pub fn load_file<P: AsRef<Path>>(registry: &Registry, path: P) -> Result<Loaded> {
    let path = path.as_ref();

    let file = File::open(path)
        .wrap_err_with(|| format!("failed to open container file '{}'", path.display()))?;
    let file_size = file
        .metadata()
        .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
        .len();
    ensure!(
        file_size >= ENVELOPE_FIXED_SIZE as u64,
        "container file '{}' is too small ({} bytes)",
        path.display(),
        file_size
    );

    // SAFETY: Mmap::map is unsafe because the file may be changed by another
    // process while mapped. The map is read-only, lives only for this call,
    // and every byte is copied into the tree before it is dropped.
    let mmap = unsafe {
        Mmap::map(&file).wrap_err_with(|| format!("failed to memory-map '{}'", path.display()))?
    };

    load_from_slice(registry, &mmap)
        .wrap_err_with(|| format!("failed to load container file '{}'", path.display()))
}
