//! Text content and line breaks derived from unignored leaf names.

use std::rc::Rc;

use crate::attributes::IntAttribute;
use crate::ids::NodeId;
use crate::node::NodeRef;
use crate::tree::Tree;

impl Tree {
    pub(crate) fn line_start_offsets(&self, id: NodeId) -> Rc<[usize]> {
        if !self.cache_readable() {
            return Rc::from(Vec::new());
        }
        if let Some(cached) = self.line_cache.borrow().get(&id) {
            return cached.clone();
        }
        let Some(node) = self.node(id) else {
            return Rc::from(Vec::new());
        };
        let leaves = text_leaves(node);
        let total: usize = leaves.iter().map(|leaf| leaf.name().chars().count()).sum();
        let mut offsets = Vec::new();
        let mut offset = 0;
        for leaf in &leaves {
            offset += leaf.name().chars().count();
            let ends_line = leaf.int_attribute(IntAttribute::NextOnLineId).is_none();
            if ends_line && offset < total && offsets.last() != Some(&offset) {
                offsets.push(offset);
            }
        }
        let offsets: Rc<[usize]> = Rc::from(offsets);
        self.line_cache.borrow_mut().insert(id, offsets.clone());
        offsets
    }
}

impl<'a> NodeRef<'a> {
    /// Names of the unignored leaves below this node, joined in tree order.
    pub fn text_content(&self) -> String {
        text_leaves(*self).iter().map(|leaf| leaf.name()).collect()
    }
}

fn text_leaves(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut leaves = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        let children = current.unignored_children();
        if children.is_empty() {
            if !current.is_ignored() {
                leaves.push(current);
            }
            continue;
        }
        stack.extend(children.into_iter().rev());
    }
    leaves
}
