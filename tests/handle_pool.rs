use std::cmp::min;

use pastel::impl_handle;
use pastel::prelude::*;

impl_handle!(MeshSlot);

#[test]
fn handle_set() {
    let mut set: HandlePool<Handle> = HandlePool::new();
    assert_eq!(set.len(), 0);

    let e1 = set.create();
    assert!(e1.is_valid());
    assert!(set.contains(e1));
    assert_eq!(set.len(), 1);

    let mut e2 = e1;
    e2.invalidate();
    assert!(!e2.is_valid());
    assert!(!set.contains(e2));
    assert!(set.contains(e1));

    assert!(set.free(e1));
    assert!(!set.free(e1));
    assert!(!set.contains(e1));
    assert_eq!(set.len(), 0);
}

#[test]
fn typed_handles() {
    let mut set: HandlePool<MeshSlot> = HandlePool::new();
    let h = set.create();
    assert!(h.is_valid());
    assert_eq!(format!("{}", h), "MeshSlot(0, 1)");
    assert!(!set.contains(MeshSlot::default()));
}

#[test]
fn retain() {
    let mut set: HandlePool<Handle> = HandlePool::new();
    for _ in 0..10 {
        set.create();
    }

    set.retain(|e| e.index() % 2 == 0);
    assert_eq!(set.len(), 5);

    for v in &set {
        assert!(v.index() % 2 == 0);
    }
}

#[test]
fn stale_handles_never_alias() {
    let mut set: HandlePool<Handle> = HandlePool::new();

    let mut v = vec![];
    for _ in 0..10 {
        v.push(set.create());
    }

    for e in &v {
        set.free(*e);
    }

    for _ in 0..10 {
        let e = set.create();
        let stale = v[e.index() as usize];
        assert_eq!(stale.index(), e.index());
        assert_ne!(stale.version(), e.version());
        assert!(!set.contains(stale));
        assert!(set.contains(e));
    }
}

#[test]
fn index_compact_reuse() {
    let mut set: HandlePool<Handle> = HandlePool::new();

    let mut v = vec![];
    for _ in 0..5 {
        for _ in 0..50 {
            v.push(set.create());
        }

        let size = v.len() / 2;
        for _ in 0..size {
            let len = v.len();
            set.free(v.swap_remove(rand::random::<usize>() % len));
        }
    }

    for i in v {
        set.free(i);
    }

    assert!(set.is_empty());
    for index in 0..50 {
        let handle = set.create();
        assert_eq!(handle.index(), index);
    }
}

#[test]
fn clear() {
    let mut set: HandlePool<Handle> = HandlePool::new();
    let handles: Vec<_> = (0..4).map(|_| set.create()).collect();
    set.clear();

    assert!(set.is_empty());
    for h in handles {
        assert!(!set.contains(h));
    }
}

#[test]
fn iter() {
    let mut set: HandlePool<Handle> = HandlePool::new();
    let mut v = vec![];

    for _ in 0..10 {
        v.push(set.create())
    }

    for i in (0..10).rev() {
        if i % 3 == 0 {
            set.free(v.remove(i));
        }
    }

    let mut iter = set.iter();
    let test_split_at = |stride| {
        let iter = set.iter();
        let (mut s1, mut s2) = iter.split_at(stride);
        assert_eq!(s1.len(), min(stride, iter.len()));
        assert_eq!(s2.len(), iter.len() - min(stride, iter.len()));

        for handle in &v {
            if let Some(v) = s1.next() {
                assert_eq!(*handle, v);
            } else {
                assert_eq!(*handle, s2.next().unwrap());
            }
        }
    };

    test_split_at(0);
    test_split_at(1);
    test_split_at(iter.len() - 1);
    test_split_at(iter.len());
    test_split_at(iter.len() * 2);

    for handle in &v {
        assert_eq!(*handle, iter.next().unwrap());
    }
    assert!(iter.next().is_none());
}
