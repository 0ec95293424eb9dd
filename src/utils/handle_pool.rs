use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

/// `HandlePool` manages the manipulations of a `Handle` collection, which are
/// created with a continuous `index` field. Freed indices are recycled smallest
/// first, and every recycle bumps the version of the slot.
///
/// An odd version marks a live slot, an even version a freed one.
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<Reverse<HandleIndex>>,
    _phantom: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<H: HandleLike> HandlePool<H> {
    /// Constructs a new, empty `HandlePool`.
    pub fn new() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
            _phantom: PhantomData,
        }
    }

    /// Constructs a new `HandlePool` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        HandlePool {
            versions: Vec::with_capacity(capacity),
            frees: BinaryHeap::with_capacity(capacity),
            _phantom: PhantomData,
        }
    }

    /// Creates a unused `Handle`.
    pub fn create(&mut self) -> H {
        if let Some(Reverse(index)) = self.frees.pop() {
            // If we have available free slots.
            let version = &mut self.versions[index as usize];
            *version += 1;
            H::new(index, *version)
        } else {
            // Or we just spawn a new index and corresponding version.
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if this `Handle` was created by `HandlePool`, and has not been
    /// freed yet.
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        self.is_alive_at(index) && (self.versions[index] == handle.version())
    }

    #[inline]
    fn is_alive_at(&self, index: usize) -> bool {
        (index < self.versions.len()) && ((self.versions[index] & 0x1) == 1)
    }

    /// Recycles the `Handle` index, and mark its version as dead. Returns false
    /// if the handle is stale or was never created by this pool.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.contains(handle) {
            false
        } else {
            self.versions[handle.index() as usize] += 1;
            self.frees.push(Reverse(handle.index()));
            true
        }
    }

    /// Recycles the `Handle` at `index` regardless of its version.
    pub fn free_at(&mut self, index: usize) -> Option<H> {
        if !self.is_alive_at(index) {
            None
        } else {
            self.versions[index] += 1;
            self.frees.push(Reverse(index as HandleIndex));
            Some(H::new(index as HandleIndex, self.versions[index] - 1))
        }
    }

    /// Removes all handles not matching `predicate`.
    pub fn retain<P>(&mut self, mut predicate: P)
    where
        P: FnMut(H) -> bool,
    {
        for index in 0..self.versions.len() {
            let version = self.versions[index];
            if version & 0x1 == 1 && !predicate(H::new(index as HandleIndex, version)) {
                self.free_at(index);
            }
        }
    }

    /// Frees every live handle. Versions are kept, so handles created before
    /// the call stay stale afterwards.
    pub fn clear(&mut self) {
        for index in 0..self.versions.len() {
            self.free_at(index);
        }
    }

    /// Returns the total number of alive handle in this `HandlePool`.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the alive handles, in index order.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        Iter {
            versions: &self.versions,
            start: 0,
            end: self.versions.len() as HandleIndex,
            _phantom: PhantomData,
        }
    }
}

impl<'a, H: HandleLike> IntoIterator for &'a HandlePool<H> {
    type Item = H;
    type IntoIter = Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Immutable `HandlePool` iterator, this struct is created by `iter` method on `HandlePool`.
#[derive(Copy, Clone)]
pub struct Iter<'a, H: HandleLike> {
    versions: &'a [HandleIndex],
    start: HandleIndex,
    end: HandleIndex,
    _phantom: PhantomData<H>,
}

impl<'a, H: HandleLike> Iter<'a, H> {
    /// Divides iterator into two with specified stripe in the first `Iter`.
    pub fn split_at(&self, len: usize) -> (Iter<'a, H>, Iter<'a, H>) {
        let len = len as HandleIndex;
        let mid = match (self.start + len).cmp(&self.end) {
            Ordering::Less => self.start + len,
            _ => self.end,
        };

        let left = Iter {
            versions: self.versions,
            start: self.start,
            end: mid,
            _phantom: PhantomData,
        };

        let right = Iter {
            versions: self.versions,
            start: mid,
            end: self.end,
            _phantom: PhantomData,
        };

        (left, right)
    }

    /// Returns the size of indices this iterator could reachs.
    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a, H: HandleLike> Iterator for Iter<'a, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        while self.start < self.end {
            let index = self.start;
            self.start += 1;

            let v = self.versions[index as usize];
            if v & 0x1 == 1 {
                return Some(H::new(index, v));
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;

    #[test]
    fn stale_handle_is_rejected() {
        let mut pool: HandlePool<Handle> = HandlePool::new();
        let h1 = pool.create();
        assert!(pool.free(h1));
        assert!(!pool.free(h1));

        let h2 = pool.create();
        assert_eq!(h1.index(), h2.index());
        assert_ne!(h1.version(), h2.version());
        assert!(!pool.contains(h1));
        assert!(pool.contains(h2));
    }

    #[test]
    fn clear() {
        let mut pool: HandlePool<Handle> = HandlePool::new();
        let handles: Vec<_> = (0..4).map(|_| pool.create()).collect();
        pool.clear();
        assert!(pool.is_empty());
        for h in handles {
            assert!(!pool.contains(h));
        }
    }
}
