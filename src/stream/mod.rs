//! # Byte Streams
//!
//! The container format is read and written through two small traits,
//! [`InStream`] and [`OutStream`]. They mirror a classic binary stream API:
//! byte counts are returned from every call, and failures are recorded in a
//! sticky error flag instead of being raised.
//!
//! ## Error Model
//!
//! ```text
//! short read / short write / bad tag / size mismatch
//!        │
//!        └─> stream.set_error(true)   (sticky until the stream is dropped)
//!                │
//!                └─> every layer checks stream.error() after each load/save
//! ```
//!
//! Layers never clear the flag. The public container API converts a set flag
//! into an `eyre::Report` at the boundary.
//!
//! ## Implementations
//!
//! | Type | Direction | Backing |
//! |------|-----------|---------|
//! | [`SliceReader`] | in | borrowed `&[u8]` (also used over mmap) |
//! | [`VecWriter`] | out | owned `Vec<u8>` |
//! | [`IoReader`] | in | any `std::io::Read`, with a lookahead buffer for `peek` |
//! | [`IoWriter`] | out | any `std::io::Write` |
//!
//! ## Little-Endian Helpers
//!
//! [`InStreamExt`] and [`OutStreamExt`] add fixed-width little-endian integer
//! and length-prefixed lump helpers on top of the raw traits. A lump is a u16
//! length followed by that many bytes.

mod io;
mod memory;

pub use io::{IoReader, IoWriter};
pub use memory::{SliceReader, VecWriter};

use crate::config::{LUMP_PREFIX_SIZE, MAX_LUMP_LEN};

pub trait InStream {
    /// Reads up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Copies up to `buf.len()` upcoming bytes without consuming them.
    fn peek(&mut self, buf: &mut [u8]) -> usize;

    /// Discards up to `n` bytes, returning how many were skipped.
    fn skip(&mut self, n: usize) -> usize;

    fn error(&self) -> bool;

    fn set_error(&mut self, error: bool);

    /// Number of bytes consumed so far.
    fn position(&self) -> u64;
}

pub trait OutStream {
    /// Writes `buf`, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> usize;

    fn error(&self) -> bool;

    fn set_error(&mut self, error: bool);

    /// Number of bytes written so far.
    fn position(&self) -> u64;

    /// Writes `n` zero bytes.
    fn pad(&mut self, n: usize) -> usize {
        const ZEROS: [u8; 64] = [0u8; 64];
        let mut written = 0;
        while written < n {
            let chunk = (n - written).min(ZEROS.len());
            let w = self.write(&ZEROS[..chunk]);
            written += w;
            if w < chunk {
                break;
            }
        }
        written
    }
}

pub trait InStreamExt: InStream {
    /// Reads exactly `buf.len()` bytes, flagging the stream on a short read.
    fn read_exact_or_fail(&mut self, buf: &mut [u8]) -> bool {
        let n = self.read(buf);
        if n != buf.len() {
            self.set_error(true);
            return false;
        }
        true
    }

    fn read_u8(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_or_fail(&mut buf).then_some(buf[0])
    }

    fn read_u16(&mut self) -> Option<u16> {
        let mut buf = [0u8; 2];
        self.read_exact_or_fail(&mut buf)
            .then(|| u16::from_le_bytes(buf))
    }

    fn read_u32(&mut self) -> Option<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_or_fail(&mut buf)
            .then(|| u32::from_le_bytes(buf))
    }

    /// Reads one length-prefixed lump into `scratch`, replacing its contents.
    /// Returns the total bytes consumed (prefix included).
    fn read_lump(&mut self, scratch: &mut Vec<u8>) -> Option<usize> {
        let len = self.read_u16()? as usize;
        scratch.clear();
        scratch.resize(len, 0);
        self.read_exact_or_fail(scratch)
            .then_some(LUMP_PREFIX_SIZE + len)
    }

    /// Skips exactly `n` bytes, flagging the stream if it ends early.
    fn skip_or_fail(&mut self, n: usize) -> bool {
        if self.skip(n) != n {
            self.set_error(true);
            return false;
        }
        true
    }
}

impl<T: InStream + ?Sized> InStreamExt for T {}

pub trait OutStreamExt: OutStream {
    fn write_u8(&mut self, value: u8) -> usize {
        self.write(&[value])
    }

    fn write_u16(&mut self, value: u16) -> usize {
        self.write(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> usize {
        self.write(&value.to_le_bytes())
    }

    /// Writes a u16 length prefix followed by `bytes`. Lumps longer than
    /// `u16::MAX` cannot be represented; the stream is flagged and nothing is
    /// written.
    fn write_lump(&mut self, bytes: &[u8]) -> usize {
        if bytes.len() > MAX_LUMP_LEN {
            self.set_error(true);
            return 0;
        }
        self.write_u16(bytes.len() as u16) + self.write(bytes)
    }
}

impl<T: OutStream + ?Sized> OutStreamExt for T {}

/// Serialized size of a lump holding `len` bytes.
pub fn lump_size(len: usize) -> usize {
    LUMP_PREFIX_SIZE + len
}
