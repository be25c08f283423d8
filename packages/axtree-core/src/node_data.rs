use std::collections::BTreeMap;
use std::fmt;

use crate::attributes::{
    BoolAttribute, FloatAttribute, IntAttribute, IntListAttribute, StringAttribute,
    StringListAttribute,
};
use crate::ids::NodeId;
use crate::role::{Role, State};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in the coordinate space of the offset container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Row-major 4x4 matrix applied to a node's bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform(pub [f32; 16]);

impl Transform {
    pub const IDENTITY: Transform = Transform([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelativeBounds {
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset_container_id: Option<NodeId>,
    pub bounds: Rect,
    #[cfg_attr(feature = "serde", serde(default))]
    pub transform: Option<Transform>,
}

/// Semantic description of a single node as carried by a [`TreeUpdate`](crate::TreeUpdate).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeData {
    pub id: NodeId,
    pub role: Role,
    /// Bit set of [`State`] values.
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bool_attributes: BTreeMap<BoolAttribute, bool>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub int_attributes: BTreeMap<IntAttribute, i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub float_attributes: BTreeMap<FloatAttribute, f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub string_attributes: BTreeMap<StringAttribute, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub int_list_attributes: BTreeMap<IntListAttribute, Vec<i32>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub string_list_attributes: BTreeMap<StringListAttribute, Vec<String>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub relative_bounds: RelativeBounds,
    #[cfg_attr(feature = "serde", serde(default))]
    pub child_ids: Vec<NodeId>,
}

impl NodeData {
    pub fn new(id: impl Into<NodeId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            ..Self::default()
        }
    }

    /// Builder-style helper for fixtures: sets the child list.
    pub fn with_children(mut self, children: impl IntoIterator<Item = i32>) -> Self {
        self.child_ids = children.into_iter().map(NodeId).collect();
        self
    }

    pub fn has_state(&self, state: State) -> bool {
        self.state & state.bit() != 0
    }

    pub fn add_state(&mut self, state: State) {
        self.state |= state.bit();
    }

    pub fn remove_state(&mut self, state: State) {
        self.state &= !state.bit();
    }

    pub fn is_ignored(&self) -> bool {
        self.has_state(State::Ignored)
    }

    pub fn has_bool_attribute(&self, attr: BoolAttribute) -> bool {
        self.bool_attributes.contains_key(&attr)
    }

    pub fn bool_attribute(&self, attr: BoolAttribute) -> bool {
        self.bool_attributes.get(&attr).copied().unwrap_or(false)
    }

    pub fn set_bool_attribute(&mut self, attr: BoolAttribute, value: bool) {
        self.bool_attributes.insert(attr, value);
    }

    pub fn has_int_attribute(&self, attr: IntAttribute) -> bool {
        self.int_attributes.contains_key(&attr)
    }

    pub fn int_attribute(&self, attr: IntAttribute) -> Option<i32> {
        self.int_attributes.get(&attr).copied()
    }

    pub fn set_int_attribute(&mut self, attr: IntAttribute, value: i32) {
        self.int_attributes.insert(attr, value);
    }

    pub fn remove_int_attribute(&mut self, attr: IntAttribute) {
        self.int_attributes.remove(&attr);
    }

    pub fn float_attribute(&self, attr: FloatAttribute) -> Option<f32> {
        self.float_attributes.get(&attr).copied()
    }

    pub fn set_float_attribute(&mut self, attr: FloatAttribute, value: f32) {
        self.float_attributes.insert(attr, value);
    }

    pub fn string_attribute(&self, attr: StringAttribute) -> Option<&str> {
        self.string_attributes.get(&attr).map(String::as_str)
    }

    pub fn set_string_attribute(&mut self, attr: StringAttribute, value: impl Into<String>) {
        self.string_attributes.insert(attr, value.into());
    }

    pub fn name(&self) -> &str {
        self.string_attribute(StringAttribute::Name).unwrap_or("")
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set_string_attribute(StringAttribute::Name, name);
    }

    pub fn int_list_attribute(&self, attr: IntListAttribute) -> &[i32] {
        self.int_list_attributes
            .get(&attr)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_int_list_attribute(&mut self, attr: IntListAttribute, value: Vec<i32>) {
        self.int_list_attributes.insert(attr, value);
    }

    pub fn string_list_attribute(&self, attr: StringListAttribute) -> &[String] {
        self.string_list_attributes
            .get(&attr)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_string_list_attribute(&mut self, attr: StringListAttribute, value: Vec<String>) {
        self.string_list_attributes.insert(attr, value);
    }

    /// First id appearing twice in `child_ids`, if any.
    pub(crate) fn duplicate_child(&self) -> Option<NodeId> {
        let mut seen = std::collections::HashSet::with_capacity(self.child_ids.len());
        self.child_ids.iter().copied().find(|id| !seen.insert(*id))
    }

    pub(crate) fn node_id_attributes(&self) -> impl Iterator<Item = (IntAttribute, NodeId)> + '_ {
        self.int_attributes
            .iter()
            .filter(|(attr, _)| attr.is_node_id())
            .map(|(attr, value)| (*attr, NodeId(*value)))
    }

    pub(crate) fn node_id_list_attributes(
        &self,
    ) -> impl Iterator<Item = (IntListAttribute, &[i32])> + '_ {
        self.int_list_attributes
            .iter()
            .filter(|(attr, _)| attr.is_node_id_list())
            .map(|(attr, values)| (*attr, values.as_slice()))
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id={} {:?}", self.id, self.role)?;
        for state in State::ALL {
            if self.has_state(state) {
                write!(f, " {}", format!("{state:?}").to_uppercase())?;
            }
        }
        for (attr, value) in &self.string_attributes {
            write!(f, " {attr:?}={value}")?;
        }
        for (attr, value) in &self.int_attributes {
            write!(f, " {attr:?}={value}")?;
        }
        for (attr, value) in &self.bool_attributes {
            write!(f, " {attr:?}={value}")?;
        }
        for (attr, value) in &self.float_attributes {
            write!(f, " {attr:?}={value}")?;
        }
        for (attr, values) in &self.int_list_attributes {
            let joined: Vec<String> = values.iter().map(i32::to_string).collect();
            write!(f, " {attr:?}={}", joined.join(","))?;
        }
        for (attr, values) in &self.string_list_attributes {
            write!(f, " {attr:?}={}", values.join(","))?;
        }
        if !self.child_ids.is_empty() {
            let joined: Vec<String> = self.child_ids.iter().map(NodeId::to_string).collect();
            write!(f, " child_ids={}", joined.join(","))?;
        }
        Ok(())
    }
}
