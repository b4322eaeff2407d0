//! # Internal Macros
//!
//! This module provides internal macros for reducing boilerplate in svtree.
//!
//! ## zerocopy_getters!
//!
//! Generates read-only accessor methods for zerocopy struct fields that use
//! little-endian wrapper types (U16, U32).
//!
//! ### Usage
//!
//! ```ignore
//! use zerocopy::little_endian::{U16, U32};
//!
//! #[repr(C)]
//! struct BlockHeader {
//!     block_size: U32,
//!     object_size: U32,
//! }
//!
//! impl BlockHeader {
//!     zerocopy_getters! {
//!         block_size: u32,
//!         object_size: u32,
//!     }
//! }
//!
//! // Generates:
//! // pub fn block_size(&self) -> u32 { self.block_size.get() }
//! // pub fn object_size(&self) -> u32 { self.object_size.get() }
//! ```
//!
//! ## zerocopy_accessors!
//!
//! Same as `zerocopy_getters!` but also generates `set_<field>` methods.

/// Generates getter and setter methods for zerocopy little-endian fields.
#[macro_export]
macro_rules! zerocopy_accessors {
    (@impl $field:ident, u16) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> u16 {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: u16) {
                self.$field = ::zerocopy::little_endian::U16::new(val);
            }
        }
    };
    (@impl $field:ident, u32) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> u32 {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: u32) {
                self.$field = ::zerocopy::little_endian::U32::new(val);
            }
        }
    };
    ($($field:ident : $ty:tt),* $(,)?) => {
        $(
            $crate::zerocopy_accessors!(@impl $field, $ty);
        )*
    };
}

/// Generates only getter methods for zerocopy little-endian fields (read-only).
#[macro_export]
macro_rules! zerocopy_getters {
    ($($field:ident : $native_ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $field(&self) -> $native_ty {
                self.$field.get()
            }
        )*
    };
}
