//! Non-poisoning [`Mutex`] and [`Condvar`] wrappers
//!
//! Connection workers must not take the whole server down when one of them
//! panics while holding a lock, so the poison flag is ignored and the inner
//! data is used as is.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync;
use std::time::Duration;


/// A [`Mutex`] that never poisons and has the same interface as
/// [`std::sync::Mutex`].
pub struct Mutex<T: ?Sized>(sync::Mutex<T>);

/// Like [`std::sync::MutexGuard`].
#[must_use]
pub struct MutexGuard<'a, T: ?Sized + 'a>(sync::MutexGuard<'a, T>);

/// A [`Condvar`] working with our [`MutexGuard`].
#[derive(Debug, Default)]
pub struct Condvar(sync::Condvar);

impl<T> Mutex<T> {
    #[inline]
    pub fn new(t: T) -> Mutex<T> {
        Mutex(sync::Mutex::new(t))
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: ?Sized> Mutex<T> {
    #[inline]
    pub fn lock(&self) -> MutexGuard<T> {
        MutexGuard(self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl<T: Default> Default for Mutex<T> {
    #[inline]
    fn default() -> Self {
        Mutex::new(T::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&*self.lock(), f)
    }
}

impl<'a, T: ?Sized> Deref for MutexGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.0.deref()
    }
}

impl<'a, T: ?Sized> DerefMut for MutexGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.0.deref_mut()
    }
}

impl Condvar {
    pub fn new() -> Condvar {
        Condvar(sync::Condvar::new())
    }

    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        MutexGuard(self.0.wait(guard.0).unwrap_or_else(|e| e.into_inner()))
    }

    pub fn wait_timeout<'a, T>(&self, guard: MutexGuard<'a, T>, dur: Duration)
        -> MutexGuard<'a, T>
    {
        let (guard, _) = self.0.wait_timeout(guard.0, dur)
            .unwrap_or_else(|e| e.into_inner());
        MutexGuard(guard)
    }

    pub fn notify_one(&self) {
        self.0.notify_one()
    }

    pub fn notify_all(&self) {
        self.0.notify_all()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::thread;

    use super::Mutex;

    #[test]
    fn survives_poisoning() {
        let value = Arc::new(Mutex::new(1));
        let v2 = value.clone();
        let _ = thread::spawn(move || {
            let _guard = v2.lock();
            panic!("poison the lock");
        }).join();
        *value.lock() += 1;
        assert_eq!(*value.lock(), 2);
    }
}
