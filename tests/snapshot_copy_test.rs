use std::sync::Arc;

use tessera::composite::{CompositeView, CompositeViewConfig};
use tessera::decorator::SegmentDecorator;
use tessera::mapper::PositionTable;
use tessera::store::memory::{MemorySegment, MemorySegmentStore};
use tessera::store::traits::PhysicalSegment;

type View = CompositeView<Arc<dyn PhysicalSegment>>;

fn setup() -> (Arc<MemorySegmentStore>, Arc<View>) {
    let store = Arc::new(MemorySegmentStore::with_segments(vec![
        MemorySegment::with_values("_0", vec![(10, b"a".to_vec()), (11, b"b".to_vec())]),
        MemorySegment::with_values("_1", vec![(12, b"c".to_vec()), (13, b"d".to_vec())]),
    ]));
    let view = View::open(
        store.clone(),
        Arc::new(SegmentDecorator),
        CompositeViewConfig::default(),
    )
    .unwrap();
    (store, view)
}

#[test]
fn test_copy_keeps_deletes_committed_before_copy() {
    let (_store, view) = setup();
    view.mark_deletes_at(&[0]).unwrap();
    view.commit_deletes().unwrap();

    let copy = view.copy().unwrap();
    view.mark_deletes_at(&[1, 2]).unwrap();
    view.commit_deletes().unwrap();

    assert!(copy.is_deleted(0).unwrap());
    assert!(!copy.is_deleted(1).unwrap());
    assert!(!copy.is_deleted(2).unwrap());
    assert_eq!(copy.deleted_doc_count(), 1);
    assert_eq!(view.deleted_doc_count(), 3);
}

#[test]
fn test_copy_mutations_are_isolated() {
    let (_store, view) = setup();
    let first = view.copy().unwrap();
    let second = view.copy().unwrap();

    first.mark_deletes_at(&[3]).unwrap();
    first.commit_deletes().unwrap();

    assert!(first.is_deleted(3).unwrap());
    assert!(!second.is_deleted(3).unwrap());
    assert!(!view.is_deleted(3).unwrap());
}

#[test]
fn test_copy_serves_stored_values_with_carried_mapper() {
    let (_store, view) = setup();
    view.set_id_mapper(Arc::new(PositionTable::build(&*view)));

    let copy = view.copy().unwrap();
    assert_eq!(copy.stored_value(13).unwrap(), Some(b"d".to_vec()));
    assert_eq!(copy.stored_value(99).unwrap(), None);
}

#[test]
fn test_copy_survives_original_reopen_and_close() {
    let (store, view) = setup();
    let copy = view.copy().unwrap();

    store.add_segment(MemorySegment::sequential("_2", 20, 3));
    let reopened = view.reopen().unwrap();
    view.close().unwrap();

    assert_eq!(store.release_count(copy.version()), 0);
    assert_eq!(copy.total_doc_count(), 4);
    assert_eq!(copy.stable_id_at(3).unwrap(), Some(13));
    assert_eq!(reopened.total_doc_count(), 7);

    drop(copy);
    assert_eq!(store.release_count(view.version()), 1);
}

#[test]
fn test_concurrent_copies_release_once() {
    let (store, view) = setup();
    let version = view.version();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let view = Arc::clone(&view);
            scope.spawn(move || {
                for _ in 0..100 {
                    let copy = view.copy().unwrap();
                    assert_eq!(copy.stable_id_at(2).unwrap(), Some(12));
                    copy.close().unwrap();
                }
            });
        }
    });

    assert_eq!(store.release_count(version), 0);
    view.close().unwrap();
    assert_eq!(store.release_count(version), 1);
}
