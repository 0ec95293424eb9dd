use pastel::prelude::*;

#[test]
fn basic() {
    let mut set = ObjectPool::<Handle, i32>::new();

    let e1 = set.create(3);
    assert_eq!(set.get(e1), Some(&3));
    assert_eq!(set.len(), 1);
    assert_eq!(set.free(e1), Some(3));
    assert_eq!(set.len(), 0);
    assert_eq!(set.get(e1), None);
    assert_eq!(set.free(e1), None);
    assert_eq!(set.len(), 0);
}

#[test]
fn iterator() {
    let mut set = ObjectPool::<Handle, i32>::new();
    for i in 0..10 {
        set.create(i);
    }

    assert_eq!(set.iter().count(), 10);

    for (i, v) in set.keys().enumerate() {
        assert_eq!(v, Handle::new(i as u32, 1));
    }

    for v in set.values_mut() {
        *v += 1;
    }

    for (i, &v) in set.values().enumerate() {
        assert_eq!(v, (i + 1) as i32);
    }
}

#[test]
fn churn() {
    let mut set = ObjectPool::<Handle, usize>::new();
    let mut alive = vec![];

    for round in 0..20 {
        for i in 0..10 {
            let v = round * 10 + i;
            alive.push((set.create(v), v));
        }

        for _ in 0..5 {
            let len = alive.len();
            let (h, v) = alive.swap_remove(rand::random::<usize>() % len);
            assert_eq!(set.free(h), Some(v));
            assert!(!set.contains(h));
        }
    }

    assert_eq!(set.len(), alive.len());
    for (h, v) in &alive {
        assert_eq!(set.get(*h), Some(v));
    }

    let drained = set.drain();
    assert_eq!(drained.len(), alive.len());
    assert!(set.is_empty());
}
