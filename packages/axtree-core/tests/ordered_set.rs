use axtree_core::{IntAttribute, IntListAttribute, NodeData, NodeId, Role, StringAttribute, Tree, TreeUpdate};
use axtree_test_support::{ignored, node, node_with_role, tree_of};

fn item(id: i32) -> NodeData {
    node_with_role(id, Role::ListItem, &[])
}

fn with_int(mut data: NodeData, attr: IntAttribute, value: i32) -> NodeData {
    data.set_int_attribute(attr, value);
    data
}

fn radio(id: i32, name: Option<&str>) -> NodeData {
    let mut data = node_with_role(id, Role::RadioButton, &[]);
    if let Some(name) = name {
        data.set_string_attribute(StringAttribute::InputName, name);
    }
    data
}

fn pos_and_size(tree: &Tree, id: i32) -> (Option<i32>, Option<i32>) {
    let node = tree.node(NodeId(id)).unwrap();
    (node.pos_in_set(), node.set_size())
}

#[test]
fn plain_list_items_are_numbered_in_order() {
    let tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 3, 4]),
        item(2),
        item(3),
        item(4),
    ]);
    assert_eq!(pos_and_size(&tree, 2), (Some(1), Some(3)));
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(3)));
    assert_eq!(pos_and_size(&tree, 4), (Some(3), Some(3)));
    assert_eq!(pos_and_size(&tree, 1), (None, Some(3)));
}

#[test]
fn deleting_an_item_renumbers_later_items() {
    let mut tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 3, 4]),
        item(2),
        item(3),
        item(4),
    ]);
    assert_eq!(pos_and_size(&tree, 4), (Some(3), Some(3)));

    tree.unserialize(&TreeUpdate::new(1, vec![node_with_role(1, Role::List, &[2, 4])]))
        .unwrap();
    assert_eq!(pos_and_size(&tree, 4), (Some(2), Some(2)));
    assert_eq!(pos_and_size(&tree, 1), (None, Some(2)));
}

#[test]
fn authored_positions_rebaseline_later_items() {
    let tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 3, 4]),
        item(2),
        with_int(item(3), IntAttribute::PosInSet, 5),
        item(4),
    ]);
    assert_eq!(pos_and_size(&tree, 2), (Some(1), Some(6)));
    assert_eq!(pos_and_size(&tree, 3), (Some(5), Some(6)));
    assert_eq!(pos_and_size(&tree, 4), (Some(6), Some(6)));
}

#[test]
fn authored_sizes_win_over_inferred_ones() {
    let tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 3]),
        with_int(item(2), IntAttribute::SetSize, 7),
        item(3),
    ]);
    assert_eq!(pos_and_size(&tree, 2), (Some(1), Some(7)));
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(7)));

    let tree = tree_of(vec![
        with_int(node_with_role(1, Role::List, &[2, 3]), IntAttribute::SetSize, 10),
        item(2),
        item(3),
    ]);
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(10)));
    assert_eq!(pos_and_size(&tree, 1), (None, Some(10)));
}

#[test]
fn menu_item_roles_share_one_sequence() {
    let tree = tree_of(vec![
        node_with_role(1, Role::Menu, &[2, 3, 4]),
        node_with_role(2, Role::MenuItem, &[]),
        node_with_role(3, Role::MenuItemCheckBox, &[]),
        node_with_role(4, Role::MenuItemRadio, &[]),
    ]);
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(3)));
    assert_eq!(pos_and_size(&tree, 4), (Some(3), Some(3)));
}

#[test]
fn items_are_found_through_generic_and_ignored_wrappers() {
    let tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 5, 6]),
        node(2, &[3, 4]),
        item(3),
        item(4),
        ignored(node(5, &[7])),
        item(6),
        item(7),
    ]);
    assert_eq!(pos_and_size(&tree, 3), (Some(1), Some(4)));
    assert_eq!(pos_and_size(&tree, 4), (Some(2), Some(4)));
    assert_eq!(pos_and_size(&tree, 7), (Some(3), Some(4)));
    assert_eq!(pos_and_size(&tree, 6), (Some(4), Some(4)));
}

#[test]
fn nested_sets_are_numbered_independently() {
    let tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 6]),
        node_with_role(2, Role::ListItem, &[3]),
        node_with_role(3, Role::List, &[4, 5]),
        item(4),
        item(5),
        item(6),
    ]);
    assert_eq!(pos_and_size(&tree, 2), (Some(1), Some(2)));
    assert_eq!(pos_and_size(&tree, 6), (Some(2), Some(2)));
    assert_eq!(pos_and_size(&tree, 5), (Some(2), Some(2)));
}

#[test]
fn ignored_items_are_skipped() {
    let tree = tree_of(vec![
        node_with_role(1, Role::List, &[2, 3, 4]),
        item(2),
        ignored(item(3)),
        item(4),
    ]);
    assert_eq!(pos_and_size(&tree, 4), (Some(2), Some(2)));
    assert_eq!(pos_and_size(&tree, 3), (None, None));
}

#[test]
fn hierarchical_levels_split_flat_lists() {
    let tree_item = |id: i32, level: i32| {
        with_int(
            node_with_role(id, Role::TreeItem, &[]),
            IntAttribute::HierarchicalLevel,
            level,
        )
    };
    let tree = tree_of(vec![
        node_with_role(1, Role::Tree, &[2, 3, 4, 5, 6]),
        tree_item(2, 1),
        tree_item(3, 2),
        tree_item(4, 2),
        tree_item(5, 1),
        tree_item(6, 2),
    ]);
    assert_eq!(pos_and_size(&tree, 3), (Some(1), Some(2)));
    assert_eq!(pos_and_size(&tree, 4), (Some(2), Some(2)));
    assert_eq!(pos_and_size(&tree, 6), (Some(1), Some(1)));
    assert_eq!(pos_and_size(&tree, 2), (Some(1), Some(2)));
    assert_eq!(pos_and_size(&tree, 5), (Some(2), Some(2)));
}

#[test]
fn radio_buttons_in_a_radio_group() {
    let tree = tree_of(vec![
        node_with_role(1, Role::RadioGroup, &[2, 3]),
        radio(2, None),
        radio(3, None),
    ]);
    assert_eq!(pos_and_size(&tree, 2), (Some(1), Some(2)));
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(2)));
}

#[test]
fn loose_radio_buttons_group_by_name() {
    let tree = tree_of(vec![
        node(1, &[2, 3, 4, 5]),
        radio(2, Some("size")),
        radio(3, Some("size")),
        radio(4, Some("color")),
        radio(5, Some("size")),
    ]);
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(3)));
    assert_eq!(pos_and_size(&tree, 5), (Some(3), Some(3)));
    assert_eq!(pos_and_size(&tree, 4), (Some(1), Some(1)));
}

#[test]
fn unnamed_radio_buttons_group_with_adjacent_ones() {
    let tree = tree_of(vec![
        node(1, &[2, 3, 4, 5]),
        radio(2, None),
        radio(3, None),
        node_with_role(4, Role::Button, &[]),
        radio(5, None),
    ]);
    assert_eq!(pos_and_size(&tree, 3), (Some(2), Some(2)));
    assert_eq!(pos_and_size(&tree, 5), (Some(1), Some(1)));
}

#[test]
fn explicit_radio_group_ids_define_the_set() {
    let mut first = radio(2, None);
    first.set_int_list_attribute(IntListAttribute::RadioGroupIds, vec![4, 2]);
    let mut second = radio(4, None);
    second.set_int_list_attribute(IntListAttribute::RadioGroupIds, vec![4, 2]);
    let tree = tree_of(vec![
        node(1, &[2, 3, 4]),
        first,
        node_with_role(3, Role::Button, &[]),
        second,
    ]);
    assert_eq!(pos_and_size(&tree, 4), (Some(1), Some(2)));
    assert_eq!(pos_and_size(&tree, 2), (Some(2), Some(2)));
}

#[test]
fn non_items_have_no_position() {
    let tree = tree_of(vec![node(1, &[2]), node_with_role(2, Role::Button, &[])]);
    assert_eq!(pos_and_size(&tree, 2), (None, None));
}
