//! Node and edge identifiers.
//!
//! `NodeId` and `EdgeId` are dense indices into one particular
//! `RoadNetwork`'s arrays; they are **not** stable across networks.  A
//! restricted copy of a graph renumbers its nodes, so anything that must
//! compare nodes between graphs (paths, training rows) uses [`NodeKey`],
//! the identifier assigned by the map source.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed index wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Placeholder for "unset"; the integer maximum.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Position in the owning network's arrays.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// `INVALID`.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a road-network node inside one `RoadNetwork`.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed road-network edge inside one `RoadNetwork`.
    pub struct EdgeId(u32);
}

/// Stable node identifier taken from the source map data (the OSM node id).
///
/// Survives persistence and graph restriction, so it is the identifier used
/// in paths, routes and training examples.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub i64);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

impl From<i64> for NodeKey {
    #[inline]
    fn from(raw: i64) -> Self {
        NodeKey(raw)
    }
}
