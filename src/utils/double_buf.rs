use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Two instances of `T` with alternating roles. The front buffer is the one being
/// filled by the producer, the back buffer the one being consumed. `swap` takes
/// both locks, so neither side can observe a buffer while roles change.
pub struct DoubleBuf<T> {
    wbuf: RwLock<T>,
    rbuf: RwLock<T>,
}

impl<T: Default> Default for DoubleBuf<T> {
    fn default() -> Self {
        DoubleBuf {
            wbuf: RwLock::new(Default::default()),
            rbuf: RwLock::new(Default::default()),
        }
    }
}

impl<T> DoubleBuf<T> {
    #[inline]
    pub fn new(w: T, r: T) -> Self {
        DoubleBuf {
            wbuf: RwLock::new(w),
            rbuf: RwLock::new(r),
        }
    }

    /// Locks the front buffer for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<T> {
        self.wbuf.write().unwrap()
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<T> {
        self.wbuf.read().unwrap()
    }

    /// Locks the back buffer for writing.
    #[inline]
    pub fn write_back_buf(&self) -> RwLockWriteGuard<T> {
        self.rbuf.write().unwrap()
    }

    #[inline]
    pub fn read_back_buf(&self) -> RwLockReadGuard<T> {
        self.rbuf.read().unwrap()
    }

    /// Exchanges the contents of front and back buffers.
    #[inline]
    pub fn swap(&self) {
        let mut wbuf = self.wbuf.write().unwrap();
        let mut rbuf = self.rbuf.write().unwrap();
        std::mem::swap::<T>(&mut wbuf, &mut rbuf);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn swap() {
        let buf = DoubleBuf::new(vec![1], vec![2]);
        buf.write().push(3);
        buf.swap();

        assert_eq!(*buf.read_back_buf(), vec![1, 3]);
        assert_eq!(*buf.read(), vec![2]);
    }
}
