use axtree_core::{IntAttribute, NodeData, NodeId, Role, TreeUpdate};
use axtree_test_support::{ignored, node, node_with_role, tree_of};

fn text(id: i32, name: &str, next_on_line: Option<i32>) -> NodeData {
    let mut data = NodeData::new(id, Role::InlineTextBox);
    data.set_name(name);
    if let Some(next) = next_on_line {
        data.set_int_attribute(IntAttribute::NextOnLineId, next);
    }
    data
}

#[test]
fn line_starts_follow_next_on_line_links() {
    let tree = tree_of(vec![
        node_with_role(1, Role::StaticText, &[2, 3, 4]),
        text(2, "Hello ", Some(3)),
        text(3, "world ", None),
        text(4, "again", None),
    ]);
    let paragraph = tree.root().unwrap();
    assert_eq!(paragraph.text_content(), "Hello world again");
    assert_eq!(&*paragraph.line_start_offsets(), &[12]);
    assert!(tree.node(NodeId(4)).unwrap().line_start_offsets().is_empty());
}

#[test]
fn line_starts_are_recomputed_after_an_update() {
    let mut tree = tree_of(vec![
        node_with_role(1, Role::StaticText, &[2, 3]),
        text(2, "one", None),
        text(3, "two", None),
    ]);
    assert_eq!(&*tree.root().unwrap().line_start_offsets(), &[3]);

    tree.unserialize(&TreeUpdate::new(1, vec![text(2, "one", Some(3))]))
        .unwrap();
    assert!(tree.root().unwrap().line_start_offsets().is_empty());
}

#[test]
fn ignored_leaves_do_not_contribute_text() {
    let tree = tree_of(vec![
        node(1, &[2, 3]),
        text(2, "visible", None),
        ignored(text(3, "hidden", None)),
    ]);
    assert_eq!(tree.root().unwrap().text_content(), "visible");
}

#[test]
fn hierarchical_level_is_authored_or_nested() {
    let mut authored = node_with_role(5, Role::Heading, &[]);
    authored.set_int_attribute(IntAttribute::HierarchicalLevel, 2);
    let tree = tree_of(vec![
        node_with_role(1, Role::Tree, &[2, 5]),
        node_with_role(2, Role::TreeItem, &[3]),
        node_with_role(3, Role::Group, &[4]),
        node_with_role(4, Role::TreeItem, &[]),
        authored,
    ]);
    assert_eq!(tree.node(NodeId(2)).unwrap().hierarchical_level(), Some(1));
    assert_eq!(tree.node(NodeId(4)).unwrap().hierarchical_level(), Some(2));
    assert_eq!(tree.node(NodeId(5)).unwrap().hierarchical_level(), Some(2));
    assert_eq!(tree.node(NodeId(3)).unwrap().hierarchical_level(), None);
}
