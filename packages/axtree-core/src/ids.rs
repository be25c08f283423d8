use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a node within one tree.
///
/// Ids coming from a tree source are positive. Negative ids other than
/// [`NodeId::INVALID`] are minted by a [`Tree`](crate::Tree) for synthetic
/// nodes and never collide with source ids.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub i32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(-1);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Whether this id was minted by a tree rather than supplied by a source.
    pub fn is_synthetic(self) -> bool {
        self.0 < Self::INVALID.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for NodeId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Counter handing out synthetic ids: -2, -3, -4, ...
#[derive(Clone, Debug)]
pub(crate) struct SyntheticIds {
    next: i32,
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self { next: -2 }
    }
}

impl SyntheticIds {
    pub(crate) fn mint(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.saturating_sub(1);
        id
    }
}

pub(crate) fn join_ids(ids: &[NodeId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
