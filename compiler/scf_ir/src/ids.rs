//! Arena ID newtypes.
//!
//! Every entity in a [`Graph`](crate::Graph) lives in one of three arenas
//! and is addressed by a `u32` index. IDs are allocated sequentially and
//! never reused: destroying an entity leaves a tombstone behind, so a stale
//! ID can be detected instead of silently aliasing a newer entity.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into arena `Vec`s).
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Build the ID for the next slot of an arena of length `len`.
            pub(crate) fn from_len(len: usize) -> Self {
                Self(
                    u32::try_from(len)
                        .unwrap_or_else(|_| panic!(concat!($prefix, " count exceeds u32::MAX"))),
                )
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// A value: one definition site (node output or block parameter).
    ValueId,
    "%"
);

arena_id!(
    /// A node (instruction) in the graph.
    NodeId,
    "node"
);

arena_id!(
    /// A block: ordered nodes plus parameter and output lists.
    BlockId,
    "block"
);
