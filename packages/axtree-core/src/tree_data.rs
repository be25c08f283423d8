use crate::ids::NodeId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tree-wide metadata: document properties, focus and selection.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeData {
    pub tree_id: Option<String>,
    pub parent_tree_id: Option<String>,
    pub title: String,
    pub url: String,
    pub doctype: String,
    pub mimetype: String,
    pub loaded: bool,
    pub loading_progress: f32,
    pub focus_id: NodeId,
    pub sel_is_backward: bool,
    pub sel_anchor_object_id: NodeId,
    pub sel_anchor_offset: i32,
    pub sel_focus_object_id: NodeId,
    pub sel_focus_offset: i32,
}

impl Default for TreeData {
    fn default() -> Self {
        Self {
            tree_id: None,
            parent_tree_id: None,
            title: String::new(),
            url: String::new(),
            doctype: String::new(),
            mimetype: String::new(),
            loaded: false,
            loading_progress: 0.0,
            focus_id: NodeId::INVALID,
            sel_is_backward: false,
            sel_anchor_object_id: NodeId::INVALID,
            sel_anchor_offset: -1,
            sel_focus_object_id: NodeId::INVALID,
            sel_focus_offset: -1,
        }
    }
}
