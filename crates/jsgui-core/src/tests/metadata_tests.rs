use super::*;

fn root_id() -> RootId {
    let mut roots: SlotMap<RootId, ()> = SlotMap::with_key();
    roots.insert(())
}

fn key(text: &str) -> Rc<str> {
    Rc::from(text)
}

#[test]
fn same_key_under_same_parent_is_the_same_record() {
    let mut store = MetadataStore::new();
    let root = store.insert_root(root_id());
    let first = store.child_or_insert(root, &key("a")).unwrap();
    let again = store.child_or_insert(root, &key("a")).unwrap();
    let other = store.child_or_insert(root, &key("b")).unwrap();
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(store.len(), 3);
}

#[test]
fn children_inherit_root_and_flag() {
    let mut store = MetadataStore::new();
    let root_handle = root_id();
    let root = store.insert_root(root_handle);
    store.get_mut(root).unwrap().gc_flag = true;
    let child = store.child_or_insert(root, &key("a")).unwrap();
    let meta = store.get(child).unwrap();
    assert_eq!(meta.root, root_handle);
    assert!(meta.gc_flag);
    assert_eq!(meta.parent, Some(root));
}

#[test]
fn removed_record_is_unlinked_and_recreated_fresh() {
    let mut store = MetadataStore::new();
    let root = store.insert_root(root_id());
    let child = store.child_or_insert(root, &key("a")).unwrap();
    store.get_mut(child).unwrap().indexed_child_count = Some(4);

    assert!(store.remove(child).is_some());
    assert!(!store.contains(child));
    assert!(store.get(root).unwrap().children.is_empty());

    let fresh = store.child_or_insert(root, &key("a")).unwrap();
    assert_ne!(fresh, child);
    assert_eq!(store.get(fresh).unwrap().indexed_child_count, None);
}

#[test]
fn subtree_lists_parents_before_children() {
    let mut store = MetadataStore::new();
    let root = store.insert_root(root_id());
    let a = store.child_or_insert(root, &key("a")).unwrap();
    let a1 = store.child_or_insert(a, &key("1")).unwrap();
    let b = store.child_or_insert(root, &key("b")).unwrap();

    let subtree = store.subtree(root);
    assert_eq!(subtree.len(), 4);
    assert_eq!(subtree[0], root);
    let pos = |id| subtree.iter().position(|x| *x == id).unwrap();
    assert!(pos(a) < pos(a1));
    assert!(subtree.contains(&b));
    assert_eq!(store.subtree(a), vec![a, a1]);
}

#[test]
fn reachability_breaks_when_an_ancestor_is_removed() {
    let mut store = MetadataStore::new();
    let root = store.insert_root(root_id());
    let a = store.child_or_insert(root, &key("a")).unwrap();
    let a1 = store.child_or_insert(a, &key("1")).unwrap();
    assert!(store.is_reachable(a1, root));

    store.remove(a);
    assert!(!store.is_reachable(a1, root));
}

#[test]
fn stale_parent_is_an_error() {
    let mut store = MetadataStore::new();
    let root = store.insert_root(root_id());
    let a = store.child_or_insert(root, &key("a")).unwrap();
    store.remove(a);
    assert!(matches!(
        store.child_or_insert(a, &key("x")),
        Err(RenderError::StaleMetadata(id)) if id == a
    ));
}

#[test]
fn subscriptions_are_deduplicated_and_baselines_reset() {
    let mut store = MetadataStore::new();
    let root = store.insert_root(root_id());
    let meta = store.get_mut(root).unwrap();
    meta.subscribe(DispatchKey::Storage);
    meta.subscribe(DispatchKey::Storage);
    meta.subscribe(DispatchKey::Location);
    assert_eq!(meta.subscriptions.len(), 2);

    meta.applied.class_name.push("row".into());
    meta.listeners
        .insert("click".into(), Listener::new(|_| {}));
    meta.reset_baselines();
    assert!(meta.applied.is_empty());
    assert!(meta.listeners.is_empty());
}
