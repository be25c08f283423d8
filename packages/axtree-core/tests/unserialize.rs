use axtree_core::{
    Change, ChangeType, Error, IntAttribute, IntListAttribute, NodeId, Tree, TreeData, TreeUpdate,
};
use axtree_test_support::{node, tree_of, tree_to_string, update_of, Event, RecordingObserver};

fn observed(tree: &mut Tree) -> std::rc::Rc<std::cell::RefCell<RecordingObserver>> {
    let observer = RecordingObserver::shared();
    tree.add_observer(observer.clone());
    observer
}

#[test]
fn builds_tree_from_initial_update() {
    let tree = tree_of(vec![node(1, &[2, 3]), node(2, &[4]), node(3, &[]), node(4, &[])]);
    assert_eq!(tree.size(), 4);
    assert_eq!(tree.root_id(), Some(NodeId(1)));
    assert_eq!(tree_to_string(&tree), "(1 (2 (4) 3))");
    assert_eq!(tree.node(NodeId(4)).unwrap().parent().unwrap().id(), NodeId(2));
    assert_eq!(tree.node(NodeId(3)).unwrap().index_in_parent(), 1);
    tree.validate_invariants().unwrap();
}

#[test]
fn empty_tree_requires_root_data() {
    let mut tree = Tree::new();
    let err = tree.unserialize(&TreeUpdate::new(1, Vec::new())).unwrap_err();
    assert_eq!(err, Error::MissingRoot(NodeId(1)));
    assert!(tree.is_empty());
}

#[test]
fn mentioning_a_node_without_children_deletes_them() {
    let mut tree = tree_of(vec![node(1, &[2, 3]), node(2, &[]), node(3, &[])]);
    let observer = observed(&mut tree);

    tree.unserialize(&update_of(vec![node(1, &[])])).unwrap();

    assert_eq!(tree.size(), 1);
    assert!(tree.node(NodeId(2)).is_none());
    assert!(tree.node(NodeId(3)).is_none());
    assert_eq!(tree.root().unwrap().child_count(), 0);
    assert_eq!(
        observer.borrow_mut().take(),
        vec![
            Event::SubtreeWillBeDeleted(NodeId(2)),
            Event::NodeWillBeDeleted(NodeId(2)),
            Event::SubtreeWillBeDeleted(NodeId(3)),
            Event::NodeWillBeDeleted(NodeId(3)),
            Event::NodeDataWillChange(NodeId(1)),
            Event::NodeChanged(NodeId(1)),
            Event::NodeDeleted(NodeId(2)),
            Event::NodeDeleted(NodeId(3)),
            Event::AtomicUpdateFinished {
                root_changed: false,
                changes: vec![Change {
                    node: NodeId(1),
                    kind: ChangeType::NodeChanged,
                }],
            },
        ]
    );
}

#[test]
fn absent_nodes_are_left_alone() {
    let mut tree = tree_of(vec![node(1, &[2, 3]), node(2, &[4]), node(3, &[]), node(4, &[])]);
    let mut renamed = node(3, &[]);
    renamed.set_name("three");
    tree.unserialize(&TreeUpdate::new(1, vec![renamed])).unwrap();
    assert_eq!(tree_to_string(&tree), "(1 (2 (4) 3))");
    assert_eq!(tree.node(NodeId(3)).unwrap().name(), "three");
}

#[test]
fn applying_the_same_update_twice_is_silent() {
    let mut tree = tree_of(vec![node(1, &[2]), node(2, &[])]);
    let update = update_of(vec![node(1, &[2, 3]), node(3, &[])]);
    tree.unserialize(&update).unwrap();
    let after_first = tree.to_string();

    let observer = observed(&mut tree);
    tree.unserialize(&update).unwrap();
    assert_eq!(tree.to_string(), after_first);
    assert!(observer.borrow().events.is_empty());
}

#[test]
fn disowned_child_moves_with_its_subtree() {
    let mut tree = tree_of(vec![
        node(1, &[2, 3]),
        node(2, &[4]),
        node(3, &[]),
        node(4, &[5]),
        node(5, &[]),
    ]);
    let observer = observed(&mut tree);

    tree.unserialize(&TreeUpdate::new(1, vec![node(2, &[]), node(3, &[4])]))
        .unwrap();

    assert_eq!(tree_to_string(&tree), "(1 (2 3 (4 (5))))");
    tree.validate_invariants().unwrap();
    let events = observer.borrow_mut().take();
    assert!(!events.contains(&Event::NodeDeleted(NodeId(4))));
    assert!(!events.contains(&Event::NodeCreated(NodeId(4))));
    assert!(events.contains(&Event::SubtreeReparented(NodeId(4))));
}

#[test]
fn moved_node_with_new_children_is_node_reparented() {
    let mut tree = tree_of(vec![node(1, &[2, 3]), node(2, &[4]), node(3, &[]), node(4, &[])]);
    let observer = observed(&mut tree);

    tree.unserialize(&TreeUpdate::new(
        1,
        vec![node(2, &[]), node(3, &[4]), node(4, &[6]), node(6, &[])],
    ))
    .unwrap();

    assert_eq!(tree_to_string(&tree), "(1 (2 3 (4 (6))))");
    let events = observer.borrow_mut().take();
    assert!(events.contains(&Event::NodeReparented(NodeId(4))));
    assert!(!events.contains(&Event::SubtreeReparented(NodeId(4))));
}

#[test]
fn reparenting_without_disowning_is_rejected() {
    let mut tree = tree_of(vec![node(1, &[2, 3]), node(2, &[4]), node(3, &[]), node(4, &[])]);
    let before = tree.to_string();

    let err = tree
        .unserialize(&TreeUpdate::new(1, vec![node(3, &[4])]))
        .unwrap_err();

    assert_eq!(
        err,
        Error::NotMarkedForDestruction {
            node: NodeId(4),
            new_parent: NodeId(3),
        }
    );
    assert_eq!(
        tree.error(),
        "Node 4 is not marked for destruction, would be reparented to 3"
    );
    assert_eq!(tree.to_string(), before);
}

#[test]
fn node_id_to_clear_allows_rebuilding_a_subtree() {
    let mut tree = tree_of(vec![node(1, &[2]), node(2, &[3]), node(3, &[4]), node(4, &[])]);
    let mut update = TreeUpdate::new(1, vec![node(2, &[4, 3]), node(3, &[]), node(4, &[])]);
    update.node_id_to_clear = Some(NodeId(2));

    tree.unserialize(&update).unwrap();

    assert_eq!(tree_to_string(&tree), "(1 (2 (4 3)))");
    tree.validate_invariants().unwrap();
}

#[test]
fn clearing_a_node_requires_its_new_data() {
    let mut tree = tree_of(vec![node(1, &[2]), node(2, &[3]), node(3, &[])]);
    let before = tree.to_string();
    let mut update = TreeUpdate::new(1, Vec::new());
    update.node_id_to_clear = Some(NodeId(2));

    let err = tree.unserialize(&update).unwrap_err();

    assert_eq!(err, Error::PendingNodes(vec![NodeId(2)]));
    assert_eq!(tree.error(), "Nodes left pending by the update: 2");
    assert_eq!(tree.to_string(), before);
    assert_eq!(tree.size(), 3);
    tree.validate_invariants().unwrap();
}

#[test]
fn duplicate_child_is_rejected() {
    let mut tree = tree_of(vec![node(1, &[2]), node(2, &[])]);
    let err = tree.unserialize(&update_of(vec![node(1, &[2, 2])])).unwrap_err();
    assert_eq!(err.to_string(), "Node 1 has duplicate child id 2");
    assert_eq!(tree.error(), "Node 1 has duplicate child id 2");
}

#[test]
fn duplicate_node_in_update_is_rejected() {
    let mut tree = tree_of(vec![node(1, &[])]);
    let err = tree
        .unserialize(&update_of(vec![node(1, &[]), node(1, &[])]))
        .unwrap_err();
    assert_eq!(err, Error::DuplicateNodeInUpdate(NodeId(1)));
}

#[test]
fn unreachable_node_data_is_pending() {
    let mut tree = tree_of(vec![node(1, &[2]), node(2, &[])]);
    let update = TreeUpdate::new(1, vec![node(5, &[])]);
    let err = tree.unserialize(&update).unwrap_err();
    assert_eq!(err.to_string(), "Nodes left pending by the update: 5");
    assert_eq!(tree.size(), 2);
}

#[test]
fn a_child_with_two_parents_is_rejected() {
    let mut tree = tree_of(vec![node(1, &[2, 3]), node(2, &[]), node(3, &[])]);
    let err = tree
        .unserialize(&TreeUpdate::new(
            1,
            vec![node(2, &[4]), node(3, &[4]), node(4, &[])],
        ))
        .unwrap_err();
    assert_eq!(
        err,
        Error::MultipleParents {
            child: NodeId(4),
            first: NodeId(2),
            second: NodeId(3),
        }
    );
}

#[test]
fn new_root_replaces_the_whole_tree() {
    let mut tree = tree_of(vec![node(1, &[2]), node(2, &[])]);
    let observer = observed(&mut tree);

    tree.unserialize(&update_of(vec![node(3, &[2]), node(2, &[])]))
        .unwrap();

    assert_eq!(tree.root_id(), Some(NodeId(3)));
    assert!(!tree.contains(NodeId(1)));
    assert_eq!(tree_to_string(&tree), "(3 (2))");
    assert_eq!(
        observer.borrow_mut().take(),
        vec![
            Event::SubtreeWillBeDeleted(NodeId(1)),
            Event::NodeWillBeDeleted(NodeId(2)),
            Event::NodeWillBeDeleted(NodeId(1)),
            Event::NodeCreated(NodeId(3)),
            Event::NodeCreated(NodeId(2)),
            Event::NodeDeleted(NodeId(2)),
            Event::NodeDeleted(NodeId(1)),
            Event::AtomicUpdateFinished {
                root_changed: true,
                changes: vec![
                    Change {
                        node: NodeId(3),
                        kind: ChangeType::SubtreeCreated,
                    },
                    Change {
                        node: NodeId(2),
                        kind: ChangeType::NodeCreated,
                    },
                ],
            },
        ]
    );
}

#[test]
fn tree_data_changes_are_reported_once() {
    let mut tree = tree_of(vec![node(1, &[])]);
    let observer = observed(&mut tree);
    let mut update = TreeUpdate::new(1, Vec::new());
    update.tree_data = Some(TreeData {
        title: "Inbox".into(),
        ..TreeData::default()
    });

    tree.unserialize(&update).unwrap();
    tree.unserialize(&update).unwrap();

    assert_eq!(tree.data().title, "Inbox");
    assert_eq!(
        observer.borrow_mut().take(),
        vec![
            Event::TreeDataChanged,
            Event::AtomicUpdateFinished {
                root_changed: false,
                changes: Vec::new(),
            },
        ]
    );
}

#[test]
fn reverse_relations_follow_updates() {
    let mut label = node(2, &[]);
    label.set_int_list_attribute(IntListAttribute::LabelledbyIds, vec![3]);
    label.set_int_attribute(IntAttribute::ActivedescendantId, 3);
    let mut tree = tree_of(vec![node(1, &[2, 3]), label, node(3, &[])]);

    assert_eq!(
        tree.reverse_list_relations(IntListAttribute::LabelledbyIds, NodeId(3)),
        [NodeId(2)].into_iter().collect()
    );
    assert_eq!(
        tree.reverse_relations(IntAttribute::ActivedescendantId, NodeId(3)),
        [NodeId(2)].into_iter().collect()
    );

    tree.unserialize(&TreeUpdate::new(1, vec![node(2, &[])])).unwrap();
    assert!(tree
        .reverse_list_relations(IntListAttribute::LabelledbyIds, NodeId(3))
        .is_empty());
    assert!(tree
        .reverse_relations(IntAttribute::ActivedescendantId, NodeId(3))
        .is_empty());
}

#[test]
fn deleted_sources_leave_the_relation_index() {
    let mut pointer = node(3, &[]);
    pointer.set_int_attribute(IntAttribute::MemberOfId, 2);
    let mut tree = tree_of(vec![node(1, &[2, 3]), node(2, &[]), pointer]);
    tree.unserialize(&update_of(vec![node(1, &[2])])).unwrap();
    assert!(tree
        .reverse_relations(IntAttribute::MemberOfId, NodeId(2))
        .is_empty());
}

#[test]
fn lowest_common_ancestor_and_descendants() {
    let tree = tree_of(vec![
        node(1, &[2, 3]),
        node(2, &[4, 5]),
        node(3, &[]),
        node(4, &[]),
        node(5, &[]),
    ]);
    assert_eq!(tree.lowest_common_ancestor(NodeId(4), NodeId(5)), Some(NodeId(2)));
    assert_eq!(tree.lowest_common_ancestor(NodeId(4), NodeId(3)), Some(NodeId(1)));
    assert_eq!(tree.lowest_common_ancestor(NodeId(2), NodeId(4)), Some(NodeId(2)));
    assert_eq!(tree.lowest_common_ancestor(NodeId(2), NodeId(9)), None);
    assert!(tree.node(NodeId(5)).unwrap().is_descendant_of(NodeId(1)));
    assert!(!tree.node(NodeId(3)).unwrap().is_descendant_of(NodeId(2)));
}

#[test]
fn display_dumps_one_node_per_line() {
    let mut child = node(2, &[]);
    child.set_name("OK");
    let tree = tree_of(vec![node(1, &[2]), child]);
    let dump = tree.to_string();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("id=1 "));
    assert!(lines[1].starts_with("  id=2 "));
    assert!(lines[1].contains("Name=OK"));
}

#[test]
fn removed_observers_hear_nothing() {
    let mut tree = tree_of(vec![node(1, &[])]);
    let observer = RecordingObserver::shared();
    let handle: std::rc::Rc<std::cell::RefCell<dyn axtree_core::TreeObserver>> = observer.clone();
    tree.add_observer(handle.clone());
    tree.remove_observer(&handle);

    tree.unserialize(&TreeUpdate::new(1, vec![node(1, &[2]), node(2, &[])]))
        .unwrap();
    assert!(observer.borrow_mut().take().is_empty());
}
