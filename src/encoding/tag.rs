//! # Type Tags
//!
//! Every serializable type is identified by a 3-byte ASCII tag. Tags live in a
//! single namespace shared by block tags and terminal (object) tags.
//!
//! | Tag | Type | Parent |
//! |-----|------|--------|
//! | `HON` | Node | none |
//! | `SID` | Record | `HON` |
//! | `MID` | Table | `SID` |

use std::fmt;

use crate::config::{NODE_TAG, RECORD_TAG, TABLE_TAG, TAG_LEN};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; TAG_LEN]);

impl Tag {
    pub const NODE: Tag = Tag(NODE_TAG);
    pub const RECORD: Tag = Tag(RECORD_TAG);
    pub const TABLE: Tag = Tag(TABLE_TAG);

    pub const fn new(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }
}

impl From<[u8; TAG_LEN]> for Tag {
    fn from(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags_display_as_ascii() {
        assert_eq!(Tag::NODE.to_string(), "HON");
        assert_eq!(Tag::RECORD.to_string(), "SID");
        assert_eq!(Tag::TABLE.to_string(), "MID");
    }

    #[test]
    fn non_printable_bytes_are_escaped() {
        assert_eq!(Tag::new([b'A', 0, b'B']).to_string(), "A\\x00B");
    }
}
