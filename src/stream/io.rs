//! Adapters from `std::io` readers and writers to the stream traits.
//!
//! `std::io::Read` has no peek, so [`IoReader`] keeps a small lookahead
//! buffer. Bytes peeked are served from the buffer by subsequent reads and
//! skips before touching the underlying reader again.

use std::io::{ErrorKind, Read, Write};

use super::{InStream, OutStream};

#[derive(Debug)]
pub struct IoReader<R> {
    inner: R,
    lookahead: Vec<u8>,
    pos: u64,
    error: bool,
}

impl<R: Read> IoReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            lookahead: Vec::new(),
            pos: 0,
            error: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill_from_inner(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "stream read failed");
                    self.error = true;
                    break;
                }
            }
        }
        filled
    }
}

impl<R: Read> InStream for IoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let from_lookahead = buf.len().min(self.lookahead.len());
        buf[..from_lookahead].copy_from_slice(&self.lookahead[..from_lookahead]);
        self.lookahead.drain(..from_lookahead);

        let n = from_lookahead + self.fill_from_inner(&mut buf[from_lookahead..]);
        self.pos += n as u64;
        n
    }

    fn peek(&mut self, buf: &mut [u8]) -> usize {
        if self.lookahead.len() < buf.len() {
            let have = self.lookahead.len();
            let mut extra = vec![0u8; buf.len() - have];
            let got = self.fill_from_inner(&mut extra);
            self.lookahead.extend_from_slice(&extra[..got]);
        }
        let n = buf.len().min(self.lookahead.len());
        buf[..n].copy_from_slice(&self.lookahead[..n]);
        n
    }

    fn skip(&mut self, n: usize) -> usize {
        let from_lookahead = n.min(self.lookahead.len());
        self.lookahead.drain(..from_lookahead);

        let rest = (n - from_lookahead) as u64;
        let skipped = match std::io::copy(&mut (&mut self.inner).take(rest), &mut std::io::sink()) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "stream skip failed");
                self.error = true;
                0
            }
        };

        let total = from_lookahead + skipped as usize;
        self.pos += total as u64;
        total
    }

    fn error(&self) -> bool {
        self.error
    }

    fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

#[derive(Debug)]
pub struct IoWriter<W: Write> {
    inner: W,
    pos: u64,
    error: bool,
}

impl<W: Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pos: 0,
            error: false,
        }
    }

    /// Flushes the underlying writer, flagging the stream on failure.
    pub fn flush(&mut self) -> bool {
        if let Err(e) = self.inner.flush() {
            tracing::warn!(error = %e, "stream flush failed");
            self.error = true;
        }
        !self.error
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutStream for IoWriter<W> {
    fn write(&mut self, buf: &[u8]) -> usize {
        match self.inner.write_all(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                buf.len()
            }
            Err(e) => {
                tracing::warn!(error = %e, "stream write failed");
                self.error = true;
                0
            }
        }
    }

    fn error(&self) -> bool {
        self.error
    }

    fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
