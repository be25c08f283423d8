use std::fmt;

use crate::ids::NodeId;
use crate::node_data::NodeData;
use crate::tree_data::TreeData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A batch of node changes; the only format in which a [`Tree`](crate::Tree)
/// is mutated.
///
/// `nodes` is order-significant and must not contain an id twice. When
/// `node_id_to_clear` names an existing node, that node's descendants are
/// destroyed before the rest of the update is applied, and the update must
/// carry that node's data with its new child list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeUpdate {
    pub root_id: NodeId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub node_id_to_clear: Option<NodeId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub nodes: Vec<NodeData>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tree_data: Option<TreeData>,
}

impl Default for TreeUpdate {
    fn default() -> Self {
        Self {
            root_id: NodeId::INVALID,
            node_id_to_clear: None,
            nodes: Vec::new(),
            tree_data: None,
        }
    }
}

impl TreeUpdate {
    pub fn new(root_id: impl Into<NodeId>, nodes: Vec<NodeData>) -> Self {
        Self {
            root_id: root_id.into(),
            nodes,
            ..Self::default()
        }
    }

    pub fn has_tree_data(&self) -> bool {
        self.tree_data.is_some()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for TreeUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TreeUpdate: root id {}", self.root_id)?;
        if let Some(clear) = self.node_id_to_clear {
            writeln!(f, "  node_id_to_clear={clear}")?;
        }
        if let Some(data) = &self.tree_data {
            writeln!(f, "  tree_data title={:?} focus_id={}", data.title, data.focus_id)?;
        }
        for node in &self.nodes {
            writeln!(f, "  {node}")?;
        }
        Ok(())
    }
}
