//! # svtree Configuration Module
//!
//! Centralizes the constants of the container format. Constants are grouped
//! by functional area and their interdependencies are enforced through
//! compile-time assertions.
//!
//! ## Module Organization
//!
//! - [`constants`]: Tags, header sizes, revision numbers and lump limits

pub mod constants;
pub use constants::*;
