//! In-memory stream implementations.

use super::{InStream, OutStream};

/// Reads from a borrowed byte slice. Used for in-memory containers and for
/// files mapped with `memmap2`.
#[derive(Debug)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
    error: bool,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            error: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }
}

impl InStream for SliceReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = self.peek(buf);
        self.pos += n;
        n
    }

    fn peek(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        n
    }

    fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.remaining());
        self.pos += n;
        n
    }

    fn error(&self) -> bool {
        self.error
    }

    fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }
}

/// Appends to an owned buffer.
#[derive(Debug, Default)]
pub struct VecWriter {
    data: Vec<u8>,
    error: bool,
}

impl VecWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            error: false,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl OutStream for VecWriter {
    fn write(&mut self, buf: &[u8]) -> usize {
        self.data.extend_from_slice(buf);
        buf.len()
    }

    fn error(&self) -> bool {
        self.error
    }

    fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    fn position(&self) -> u64 {
        self.data.len() as u64
    }
}
