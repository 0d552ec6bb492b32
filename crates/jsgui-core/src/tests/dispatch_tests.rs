use super::*;
use slotmap::SlotMap;

fn ids(count: usize) -> (Vec<MetadataId>, RootId, RootId) {
    let mut metas: SlotMap<MetadataId, ()> = SlotMap::with_key();
    let mut roots: SlotMap<RootId, ()> = SlotMap::with_key();
    let metas = (0..count).map(|_| metas.insert(())).collect();
    (metas, roots.insert(()), roots.insert(()))
}

#[test]
fn target_is_created_once_and_keeps_its_first_snapshot() {
    let (metas, root, _) = ids(2);
    let mut targets = DispatchTargets::default();
    let key = DispatchKey::Media("(max-width: 600px)".into());

    let first = targets.subscribe(&key, || Snapshot::Matches(true), metas[0], root);
    let second = targets.subscribe(&key, || Snapshot::Matches(false), metas[1], root);
    assert_eq!(first, Snapshot::Matches(true));
    assert_eq!(second, Snapshot::Matches(true));
    assert_eq!(targets.len(), 1);
    assert_eq!(targets.get(&key).unwrap().subscriber_count(), 2);
}

#[test]
fn unsubscribe_keeps_the_target() {
    let (metas, root, _) = ids(1);
    let mut targets = DispatchTargets::default();
    targets.subscribe(&DispatchKey::Storage, || Snapshot::None, metas[0], root);
    targets.unsubscribe(metas[0], &[DispatchKey::Storage, DispatchKey::Location]);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets.get(&DispatchKey::Storage).unwrap().subscriber_count(), 0);
    assert!(targets.roots_for(&DispatchKey::Storage).is_empty());
}

#[test]
fn snapshot_update_reports_change() {
    let (metas, root, _) = ids(1);
    let mut targets = DispatchTargets::default();
    let key = DispatchKey::WindowResize;
    let size = WindowSize::new(800.0, 600.0);
    targets.subscribe(&key, || Snapshot::Size(size), metas[0], root);

    assert!(!targets.update_snapshot(&key, Snapshot::Size(size)));
    assert!(targets.update_snapshot(&key, Snapshot::Size(WindowSize::new(400.0, 600.0))));
    assert!(!targets.update_snapshot(&DispatchKey::Location, Snapshot::None));
}

#[test]
fn roots_are_deduplicated_in_subscription_order() {
    let (metas, first, second) = ids(3);
    let mut targets = DispatchTargets::default();
    let key = DispatchKey::Location;
    targets.subscribe(&key, || Snapshot::None, metas[0], second);
    targets.subscribe(&key, || Snapshot::None, metas[1], first);
    targets.subscribe(&key, || Snapshot::None, metas[2], second);
    assert_eq!(targets.roots_for(&key), vec![second, first]);
}

#[test]
fn media_queries_lists_only_media_targets() {
    let (metas, root, _) = ids(2);
    let mut targets = DispatchTargets::default();
    targets.subscribe(&DispatchKey::Storage, || Snapshot::None, metas[0], root);
    targets.subscribe(
        &DispatchKey::Media("(orientation: portrait)".into()),
        || Snapshot::Matches(false),
        metas[1],
        root,
    );
    assert_eq!(targets.media_queries(), vec!["(orientation: portrait)".to_string()]);
}

#[test]
fn media_query_canonical_form() {
    let query = MediaQuery::new()
        .feature("maxWidth", 600)
        .feature("orientation", "landscape");
    assert_eq!(
        query.canonical(),
        "(max-width: 600px) and (orientation: landscape)"
    );
}
