use alloc::vec::Vec;

use crate::util::{
    primitives::LiteralID,
    search::{GroupMask, ALL_GROUPS},
};

/// A literal given to the literal matcher builder.
///
/// A literal is a non-empty byte string matched verbatim, either case
/// sensitively or with ASCII case folding. Each literal carries the id that
/// is reported when it matches and the groups it belongs to.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Literal {
    id: LiteralID,
    bytes: Vec<u8>,
    nocase: bool,
    groups: GroupMask,
}

impl Literal {
    /// Create a new case sensitive literal belonging to every group.
    pub fn new<B: AsRef<[u8]>>(id: LiteralID, bytes: B) -> Literal {
        Literal {
            id,
            bytes: bytes.as_ref().to_vec(),
            nocase: false,
            groups: ALL_GROUPS,
        }
    }

    /// Set whether this literal matches with ASCII case folding.
    pub fn nocase(mut self, yes: bool) -> Literal {
        self.nocase = yes;
        self
    }

    /// Set the groups this literal belongs to.
    pub fn groups(mut self, groups: GroupMask) -> Literal {
        self.groups = groups;
        self
    }

    /// The id reported when this literal matches.
    pub fn id(&self) -> LiteralID {
        self.id
    }

    /// The bytes of this literal.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The length of this literal in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if and only if this literal has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if this literal matches with ASCII case folding.
    pub fn is_nocase(&self) -> bool {
        self.nocase
    }

    /// The groups this literal belongs to.
    pub fn group_mask(&self) -> GroupMask {
        self.groups
    }

    /// Returns true if and only if this literal matches `haystack` exactly.
    pub fn matches(&self, haystack: &[u8]) -> bool {
        if self.nocase {
            self.bytes.eq_ignore_ascii_case(haystack)
        } else {
            self.bytes == haystack
        }
    }

    /// Returns true if and only if every byte of this literal matches the
    /// given byte, which makes it match inside any long enough run of that
    /// byte.
    pub fn is_run_of(&self, byte: u8) -> bool {
        !self.bytes.is_empty()
            && self.bytes.iter().all(|&b| {
                if self.nocase {
                    b.eq_ignore_ascii_case(&byte)
                } else {
                    b == byte
                }
            })
    }

    /// Returns every byte that may appear at position `i` of a match of this
    /// literal: one byte, or both cases of an ASCII letter when caseless.
    pub(crate) fn variants_at(&self, i: usize) -> Variants {
        byte_variants(self.bytes[i], self.nocase)
    }
}

/// The bytes matching one literal byte: at most two of them.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Variants {
    bytes: [u8; 2],
    len: usize,
}

impl Variants {
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

pub(crate) fn byte_variants(b: u8, nocase: bool) -> Variants {
    if nocase && b.is_ascii_alphabetic() {
        Variants {
            bytes: [b.to_ascii_lowercase(), b.to_ascii_uppercase()],
            len: 2,
        }
    } else {
        Variants { bytes: [b, 0], len: 1 }
    }
}
