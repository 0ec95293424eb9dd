use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::errors::*;

enum PromiseState {
    NotReady,
    Ok(Result<()>),
    Taken,
}

/// A one-shot completion signal. The render thread fulfils it after a frame
/// has been drawn, the update thread blocks on it.
pub struct Promise {
    m: Mutex<PromiseState>,
    v: Condvar,
}

impl Default for Promise {
    fn default() -> Self {
        Promise::new()
    }
}

impl Promise {
    #[inline]
    pub fn new() -> Self {
        Promise {
            m: Mutex::new(PromiseState::NotReady),
            v: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn set(&self, v: Result<()>) {
        {
            let mut guard = self.m.lock().unwrap();
            *guard = PromiseState::Ok(v);
        }

        self.v.notify_all();
    }

    pub fn is_set(&self) -> bool {
        match *self.m.lock().unwrap() {
            PromiseState::NotReady => false,
            _ => true,
        }
    }

    /// Blocks until the promise is fulfilled, and takes its result.
    pub fn wait(&self) -> Result<()> {
        let mut guard = self.m.lock().unwrap();
        while let PromiseState::NotReady = *guard {
            guard = self.v.wait(guard).unwrap();
        }

        Self::take(&mut guard)
    }

    /// Blocks at most `timeout`. Returns `None` if the promise is still
    /// pending by then.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<()>> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.m.lock().unwrap();
        while let PromiseState::NotReady = *guard {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            guard = self.v.wait_timeout(guard, deadline - now).unwrap().0;
        }

        Some(Self::take(&mut guard))
    }

    fn take(state: &mut PromiseState) -> Result<()> {
        match ::std::mem::replace(state, PromiseState::Taken) {
            PromiseState::Ok(v) => v,
            _ => Err(format_err!("Promise has been taken already.")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait() {
        let promise = Arc::new(Promise::new());
        let p2 = promise.clone();
        let handle = thread::spawn(move || p2.set(Ok(())));

        assert!(promise.wait().is_ok());
        assert!(promise.is_set());
        assert!(promise.wait().is_err());
        handle.join().unwrap();
    }

    #[test]
    fn timeout() {
        let promise = Promise::new();
        assert!(promise.wait_timeout(Duration::from_millis(10)).is_none());

        promise.set(Err(format_err!("lost")));
        let v = promise.wait_timeout(Duration::from_millis(10));
        assert!(v.unwrap().is_err());
    }
}
