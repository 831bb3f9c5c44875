//! Synchronization primitives for ISR-safe access.

use core::cell::RefCell;
use core::task::Waker;

use critical_section::Mutex;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` so a value can be shared
/// between thread code and an interrupt handler.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Execute a closure with shared access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }
}

// SAFETY: every access goes through a critical section.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

/// Single-slot waker storage, registered from `poll` and woken from the
/// completion interrupt.
pub struct AtomicWaker {
    waker: CriticalSectionCell<Option<Waker>>,
}

impl AtomicWaker {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            waker: CriticalSectionCell::new(None),
        }
    }

    /// Store `waker`, replacing any waker for a different task.
    pub fn register(&self, waker: &Waker) {
        self.waker.with(|slot| match slot {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        });
    }

    /// Take and wake the stored waker, if any.
    #[inline]
    pub fn wake(&self) {
        // Wake outside the critical section.
        if let Some(waker) = self.waker.with(Option::take) {
            waker.wake();
        }
    }

    /// Check if a waker is currently registered.
    pub fn is_registered(&self) -> bool {
        self.waker.with_ref(Option::is_some)
    }
}

impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}
