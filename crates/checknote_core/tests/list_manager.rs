use checknote_core::{
    HistoryState, ListError, ListEvent, ListItem, ListManager, ListManagerConfig, NestedList,
    ParentDeleteMode, SortPolicy,
};
use std::cell::RefCell;
use std::rc::Rc;

/// `Groceries[Milk, Bread], Laundry, Call mom` as a flat list.
fn sample() -> Vec<ListItem> {
    vec![
        ListItem::new(1, "Groceries")
            .with_children(vec![ListItem::child(2, "Milk"), ListItem::child(3, "Bread")]),
        ListItem::child(2, "Milk"),
        ListItem::child(3, "Bread"),
        ListItem::new(4, "Laundry"),
        ListItem::new(5, "Call mom"),
    ]
}

fn manager_with(config: ListManagerConfig) -> ListManager {
    ListManager::with_items(sample(), config).unwrap()
}

fn manager() -> ListManager {
    manager_with(ListManagerConfig::default())
}

/// `(body, is_child)` per row, for compact assertions.
fn rows(manager: &ListManager) -> Vec<(String, bool)> {
    manager
        .items()
        .into_iter()
        .map(|item| (item.body, item.is_child))
        .collect()
}

fn row(body: &str, is_child: bool) -> (String, bool) {
    (body.to_string(), is_child)
}

fn assert_structure(manager: &ListManager) {
    let list = NestedList::from_items(manager.items()).unwrap();
    list.check_invariants().unwrap();
}

#[test]
fn add_appends_and_undo_redo_replays_it() {
    let mut manager = ListManager::default();
    let first = manager.create_item("first").unwrap();
    let second = manager.create_item("second").unwrap();

    assert_eq!(manager.add(0, Some(first)).unwrap(), 0);
    assert_eq!(manager.add(1, Some(second)).unwrap(), 1);
    assert_eq!(manager.display_body(), "[ ] first\n[ ] second");

    assert!(manager.undo().unwrap());
    assert_eq!(rows(&manager), vec![row("first", false)]);
    assert!(manager.redo().unwrap());
    assert_eq!(rows(&manager), vec![row("first", false), row("second", false)]);
}

#[test]
fn new_item_takes_child_role_after_a_child_run() {
    let mut manager = manager();

    manager.add(3, None).unwrap();
    let added = manager.get(3).unwrap();
    assert!(added.is_child);
    assert_eq!(added.body, "");
    assert_eq!(added.id, 6);

    manager.add(5, None).unwrap();
    assert!(!manager.get(5).unwrap().is_child);
    assert_structure(&manager);
}

#[test]
fn every_step_undoes_and_redoes_exactly() {
    let mut manager = manager();
    let mut snapshots = vec![manager.items()];

    manager.add(3, None).unwrap();
    snapshots.push(manager.items());
    manager.change_body(3, "Eggs").unwrap();
    snapshots.push(manager.items());
    manager.change_is_child(1, false).unwrap();
    snapshots.push(manager.items());
    manager.change_checked(4, true).unwrap();
    snapshots.push(manager.items());
    assert_eq!(manager.move_item(5, 0).unwrap(), 0);
    snapshots.push(manager.items());
    manager.delete(2, true).unwrap();
    snapshots.push(manager.items());

    assert_eq!(
        rows(&manager),
        vec![
            row("Call mom", false),
            row("Groceries", false),
            row("Laundry", false),
        ]
    );

    for expected in snapshots.iter().rev().skip(1) {
        assert!(manager.undo().unwrap());
        assert_eq!(&manager.items(), expected);
        assert_structure(&manager);
    }
    assert!(!manager.can_undo());

    for expected in snapshots.iter().skip(1) {
        assert!(manager.redo().unwrap());
        assert_eq!(&manager.items(), expected);
        assert_structure(&manager);
    }
    assert!(!manager.can_redo());
}

#[test]
fn new_edit_after_undo_drops_redo_tail() {
    let mut manager = manager();
    manager.change_body(3, "Laundry (darks)").unwrap();
    manager.change_checked(4, true).unwrap();

    manager.undo().unwrap();
    assert!(manager.can_redo());

    manager.change_checked(0, true).unwrap();
    assert!(!manager.can_redo());
    assert!(!manager.redo().unwrap());
    assert!(!manager.get(4).unwrap().checked);
}

#[test]
fn empty_history_reports_false_instead_of_error() {
    let mut manager = ListManager::default();
    assert!(!manager.undo().unwrap());
    assert!(!manager.redo().unwrap());
}

#[test]
fn promoting_middle_child_inherits_later_siblings_and_reverts() {
    let mut manager = manager();
    let before = manager.items();

    manager.change_is_child(1, false).unwrap();
    let milk = manager.get(1).unwrap();
    assert!(!milk.is_child);
    assert_eq!(milk.children, vec![ListItem::child(3, "Bread")]);
    assert!(manager.get(0).unwrap().children.is_empty());

    manager.undo().unwrap();
    assert_eq!(manager.items(), before);
}

#[test]
fn promoting_last_child_inherits_nothing() {
    let mut manager = manager();

    manager.change_is_child(2, false).unwrap();

    assert!(manager.get(2).unwrap().children.is_empty());
    assert_eq!(
        manager.get(0).unwrap().children,
        vec![ListItem::child(2, "Milk")]
    );
    assert_structure(&manager);
}

#[test]
fn demoting_parent_hands_its_children_to_the_previous_parent() {
    let mut manager = manager();
    manager.change_is_child(1, false).unwrap();

    manager.change_is_child(1, true).unwrap();
    assert_eq!(manager.items(), sample());

    manager.change_is_child(3, true).unwrap();
    assert_eq!(
        rows(&manager),
        vec![
            row("Groceries", false),
            row("Milk", true),
            row("Bread", true),
            row("Laundry", true),
            row("Call mom", false),
        ]
    );
    assert_eq!(manager.get(0).unwrap().children.len(), 3);
    assert_structure(&manager);
}

#[test]
fn first_item_cannot_be_indented() {
    let mut manager = manager();
    let err = manager.change_is_child(0, true).unwrap_err();
    assert!(matches!(err, ListError::StructuralInvariantViolation(_)));
    assert_eq!(manager.items(), sample());
    assert!(!manager.can_undo());
}

#[test]
fn checked_first_sorts_groups_stably_on_install() {
    let items = vec![
        ListItem::new(1, "A").with_children(vec![ListItem::child(2, "B")]),
        ListItem::child(2, "B"),
        ListItem::new(3, "C").with_checked(true),
        ListItem::new(4, "D"),
    ];
    let manager = ListManager::with_items(
        items,
        ListManagerConfig {
            sort_policy: SortPolicy::CheckedFirst,
            ..ListManagerConfig::default()
        },
    )
    .unwrap();

    let bodies = manager
        .items()
        .into_iter()
        .map(|item| item.body)
        .collect::<Vec<_>>();
    assert_eq!(bodies, vec!["A", "B", "D", "C"]);
}

#[test]
fn checking_under_checked_first_moves_group_and_undo_restores_order() {
    let mut manager = manager_with(ListManagerConfig {
        sort_policy: SortPolicy::CheckedFirst,
        ..ListManagerConfig::default()
    });
    let before = manager.items();

    let moved_to = manager.change_checked(0, true).unwrap();
    assert_eq!(moved_to, 2);
    assert_eq!(
        rows(&manager),
        vec![
            row("Laundry", false),
            row("Call mom", false),
            row("Groceries", false),
            row("Milk", true),
            row("Bread", true),
        ]
    );

    manager.undo().unwrap();
    assert_eq!(manager.items(), before);
    manager.redo().unwrap();
    assert_eq!(manager.position_of(1), Some(2));
}

#[test]
fn checking_a_child_does_not_resort() {
    let mut manager = manager_with(ListManagerConfig {
        sort_policy: SortPolicy::CheckedFirst,
        ..ListManagerConfig::default()
    });
    assert_eq!(manager.change_checked(1, true).unwrap(), 1);
    assert_eq!(manager.position_of(1), Some(0));
}

fn checked_first() -> ListManagerConfig {
    ListManagerConfig {
        sort_policy: SortPolicy::CheckedFirst,
        ..ListManagerConfig::default()
    }
}

fn ids(manager: &ListManager) -> Vec<u64> {
    manager.items().into_iter().map(|item| item.id).collect()
}

#[test]
fn item_added_below_checked_group_sorts_above_it() {
    let mut manager = ListManager::with_items(
        vec![
            ListItem::new(1, "open"),
            ListItem::new(2, "done").with_checked(true),
        ],
        checked_first(),
    )
    .unwrap();

    assert_eq!(manager.add(2, None).unwrap(), 1);
    assert_eq!(ids(&manager), vec![1, 3, 2]);

    assert!(manager.undo().unwrap());
    assert_eq!(ids(&manager), vec![1, 2]);
    assert!(manager.redo().unwrap());
    assert_eq!(ids(&manager), vec![1, 3, 2]);
}

#[test]
fn moving_checked_parent_above_unchecked_records_nothing() {
    let mut manager = ListManager::with_items(
        vec![
            ListItem::new(1, "open"),
            ListItem::new(2, "done").with_checked(true),
        ],
        checked_first(),
    )
    .unwrap();

    assert_eq!(manager.move_item(1, 0).unwrap(), 1);
    assert_eq!(ids(&manager), vec![1, 2]);
    assert!(!manager.can_undo());
}

#[test]
fn promoting_under_checked_first_resorts_and_undo_restores() {
    let items = vec![
        ListItem::new(1, "A")
            .with_checked(true)
            .with_children(vec![ListItem::child(2, "B"), ListItem::child(3, "C")]),
        ListItem::child(2, "B"),
        ListItem::child(3, "C"),
        ListItem::new(4, "D"),
    ];
    let mut manager = ListManager::with_items(items, checked_first()).unwrap();
    assert_eq!(ids(&manager), vec![4, 1, 2, 3]);
    let before = manager.items();

    manager.change_is_child(3, false).unwrap();
    assert_eq!(
        rows(&manager),
        vec![
            row("D", false),
            row("C", false),
            row("A", false),
            row("B", true),
        ]
    );
    assert_structure(&manager);

    manager.undo().unwrap();
    assert_eq!(manager.items(), before);
    manager.redo().unwrap();
    assert_eq!(ids(&manager), vec![4, 3, 1, 2]);
}

#[test]
fn dissolving_under_checked_first_resorts_released_children() {
    let items = vec![
        ListItem::new(1, "A").with_checked(true).with_children(vec![
            ListItem::child(2, "B").with_checked(true),
            ListItem::child(3, "C"),
        ]),
        ListItem::child(2, "B").with_checked(true),
        ListItem::child(3, "C"),
        ListItem::new(4, "D"),
    ];
    let mut manager = ListManager::with_items(
        items,
        ListManagerConfig {
            sort_policy: SortPolicy::CheckedFirst,
            parent_delete_mode: ParentDeleteMode::Dissolve,
        },
    )
    .unwrap();
    let before = manager.items();

    manager.delete(1, true).unwrap();
    assert_eq!(ids(&manager), vec![4, 3, 2]);

    manager.undo().unwrap();
    assert_eq!(manager.items(), before);
    manager.redo().unwrap();
    assert_eq!(ids(&manager), vec![4, 3, 2]);
}

#[test]
fn setting_same_checked_state_records_nothing() {
    let mut manager = manager();
    manager.change_checked(3, false).unwrap();
    assert!(!manager.can_undo());
}

#[test]
fn switching_to_checked_first_resorts_without_recording() {
    let mut manager = manager();
    manager.change_checked(0, true).unwrap();
    manager.undo().unwrap();
    manager.change_checked(0, true).unwrap();
    assert_eq!(manager.position_of(1), Some(0));

    manager.set_sort_policy(SortPolicy::CheckedFirst);
    assert_eq!(manager.position_of(1), Some(2));
    assert_eq!(manager.config().sort_policy, SortPolicy::CheckedFirst);
    assert_eq!(manager.history().len(), 1);
}

#[test]
fn delete_parent_with_delete_all_removes_subtree_and_undo_restores() {
    let mut manager = manager();

    let removed = manager.delete(0, true).unwrap().unwrap();
    assert_eq!(removed.children.len(), 2);
    assert_eq!(
        rows(&manager),
        vec![row("Laundry", false), row("Call mom", false)]
    );
    assert_eq!(manager.history().len(), 1);

    manager.undo().unwrap();
    assert_eq!(manager.items(), sample());
}

#[test]
fn delete_parent_with_dissolve_keeps_children_and_undo_restores() {
    let mut manager = manager_with(ListManagerConfig {
        parent_delete_mode: ParentDeleteMode::Dissolve,
        ..ListManagerConfig::default()
    });

    manager.delete(0, true).unwrap();
    assert_eq!(
        rows(&manager),
        vec![
            row("Milk", false),
            row("Bread", false),
            row("Laundry", false),
            row("Call mom", false),
        ]
    );
    assert_eq!(manager.history().len(), 1);
    assert_structure(&manager);

    manager.undo().unwrap();
    assert_eq!(manager.items(), sample());
    manager.redo().unwrap();
    assert_eq!(manager.len(), 4);
}

#[test]
fn deleting_a_child_reinserts_it_in_place_on_undo() {
    let mut manager = manager();
    manager.delete(1, false).unwrap();
    assert_eq!(
        manager.get(0).unwrap().children,
        vec![ListItem::child(3, "Bread")]
    );
    manager.undo().unwrap();
    assert_eq!(manager.items(), sample());
}

#[test]
fn delete_without_force_keeps_first_item() {
    let mut manager = manager();
    assert_eq!(manager.delete(0, false).unwrap(), None);
    assert_eq!(manager.items(), sample());
    assert!(!manager.can_undo());
}

#[test]
fn delete_by_stale_id_is_a_noop() {
    let mut manager = manager();
    assert_eq!(manager.delete_by_id(42).unwrap(), None);
    assert!(!manager.can_undo());

    let removed = manager.delete_by_id(4).unwrap().unwrap();
    assert_eq!(removed.body, "Laundry");
    assert_eq!(manager.position_of(4), None);
}

#[test]
fn consecutive_body_edits_coalesce() {
    let mut manager = manager();
    manager.change_body(3, "L").unwrap();
    manager.change_body(3, "La").unwrap();
    manager.change_body(3, "Lau").unwrap();
    assert_eq!(manager.history().len(), 1);

    manager.change_body(4, "Call dad").unwrap();
    assert_eq!(manager.history().len(), 2);

    manager.undo().unwrap();
    manager.undo().unwrap();
    assert_eq!(manager.get(3).unwrap().body, "Laundry");
    assert!(!manager.can_undo());

    manager.redo().unwrap();
    assert_eq!(manager.get(3).unwrap().body, "Lau");
}

#[test]
fn body_edit_after_undo_starts_a_new_change() {
    let mut manager = manager();
    manager.change_body(3, "first").unwrap();
    manager.change_body(4, "second").unwrap();
    manager.undo().unwrap();

    manager.change_body(3, "third").unwrap();
    assert_eq!(manager.history().len(), 2);
    manager.undo().unwrap();
    assert_eq!(manager.get(3).unwrap().body, "first");
}

#[test]
fn parent_inserted_into_child_run_adopts_and_undo_merges_back() {
    let mut manager = manager();
    let snacks = manager.create_item("Snacks").unwrap();

    assert_eq!(manager.add(2, Some(snacks)).unwrap(), 2);
    assert_eq!(
        manager.get(2).unwrap().children,
        vec![ListItem::child(3, "Bread")]
    );
    assert_structure(&manager);

    manager.undo().unwrap();
    assert_eq!(manager.items(), sample());
}

#[test]
fn moving_a_parent_carries_children() {
    let mut manager = manager();

    assert_eq!(manager.move_item(0, 2).unwrap(), 2);
    assert_eq!(
        rows(&manager),
        vec![
            row("Laundry", false),
            row("Call mom", false),
            row("Groceries", false),
            row("Milk", true),
            row("Bread", true),
        ]
    );

    manager.undo().unwrap();
    assert_eq!(manager.items(), sample());
}

#[test]
fn moving_child_to_top_is_rejected_without_recording() {
    let mut manager = manager();
    let err = manager.move_item(1, 0).unwrap_err();
    assert!(matches!(err, ListError::StructuralInvariantViolation(_)));
    assert_eq!(manager.items(), sample());
    assert!(!manager.can_undo());
}

#[test]
fn out_of_range_index_is_reported() {
    let mut manager = manager();
    assert_eq!(
        manager.change_checked(99, true),
        Err(ListError::IndexOutOfBounds { index: 99, len: 5 })
    );
    assert!(matches!(
        manager.add(9, None),
        Err(ListError::IndexOutOfBounds { index: 9, .. })
    ));
}

#[test]
fn install_rejects_invalid_snapshot_and_resets_history() {
    assert!(ListManager::with_items(
        vec![ListItem::child(1, "orphan")],
        ListManagerConfig::default()
    )
    .is_err());

    let mut manager = manager();
    manager.change_body(3, "edited").unwrap();
    manager
        .install(vec![ListItem::new(10, "other note")])
        .unwrap();
    assert!(!manager.can_undo());
    assert_eq!(manager.create_item("next").unwrap().id, 11);
}

#[test]
fn listener_receives_index_ranges() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let mut manager = manager();
    manager.set_listener(move |event| sink.borrow_mut().push(*event));

    manager.add(5, None).unwrap();
    manager.delete(0, true).unwrap();
    manager.move_item(0, 2).unwrap();

    assert_eq!(
        events.borrow().as_slice(),
        &[
            ListEvent::Inserted { start: 5, count: 1 },
            ListEvent::Removed { start: 0, count: 3 },
            ListEvent::Moved {
                from: 0,
                to: 2,
                count: 1
            },
        ]
    );
}

#[test]
fn history_listener_tracks_availability() {
    let states = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&states);
    let mut manager = manager();
    manager.set_history_listener(move |state| sink.borrow_mut().push(state));

    manager.change_checked(3, true).unwrap();
    manager.undo().unwrap();

    assert_eq!(
        states.borrow().as_slice(),
        &[
            HistoryState::default(),
            HistoryState {
                can_undo: true,
                can_redo: false
            },
            HistoryState {
                can_undo: false,
                can_redo: true
            },
        ]
    );
}
