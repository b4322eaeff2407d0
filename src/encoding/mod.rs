//! # Encoding Module
//!
//! This module provides the fixed binary layouts of the container format:
//!
//! - **Tags**: 3-byte type identifiers naming one level of an object
//! - **Block headers**: the 16-byte prefix of every serialized block
//! - **Envelope header**: the fixed 28-byte prefix of a whole container

pub mod headers;
pub mod tag;

pub use headers::{BlockHeader, EnvelopeHeader};
pub use tag::Tag;
