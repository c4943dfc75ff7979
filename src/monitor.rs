// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// In-process monitor: a mutex-guarded state plus the condition variable used
// to sleep/wake threads waiting on that state. Waits are interruptible.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::LockError;
use crate::interrupt;

/// Something a parked thread can be woken from.
pub(crate) trait Wake: Send + Sync {
    /// Wake every thread parked on this object.
    fn wake_all(&self);
}

/// A mutex and a condition variable bound together, `synchronized`-style.
///
/// The guarded value is the monitor's own state (e.g. the writer identity or a
/// reader record's `writer_waiting` flag). Monitors are shared through `Arc`
/// so that an interrupt can reach the monitor a thread is parked on.
pub(crate) struct Monitor<T> {
    state: Mutex<T>,
    cond: Condvar,
}

impl<T> Monitor<T> {
    pub(crate) fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            cond: Condvar::new(),
        }
    }

    /// Enter the monitor. A poisoned mutex is recovered: the states guarded
    /// here are single flags that are never left half-written.
    pub(crate) fn enter(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake one parked thread. The caller should hold the monitor.
    pub(crate) fn notify_one(&self) {
        self.cond.notify_one();
    }

    /// Wake every parked thread. The caller should hold the monitor.
    pub(crate) fn notify_all(&self) {
        self.cond.notify_all();
    }
}

impl<T: Send + 'static> Monitor<T> {
    /// Park while `condition` holds, re-checking it after every wake.
    ///
    /// Returns `Err(LockError::Cancelled)` if the calling thread is (or gets)
    /// interrupted while the condition still holds; the interrupt is consumed
    /// and the monitor is released.
    pub(crate) fn wait_while<'a, F>(
        self: &'a Arc<Self>,
        mut guard: MutexGuard<'a, T>,
        mut condition: F,
    ) -> Result<MutexGuard<'a, T>, LockError>
    where
        F: FnMut(&mut T) -> bool,
    {
        if !condition(&mut *guard) {
            return Ok(guard);
        }
        let target: Arc<dyn Wake> = self.clone();
        let _parked = interrupt::park_on(target);
        while condition(&mut *guard) {
            if interrupt::take_current() {
                return Err(LockError::Cancelled);
            }
            guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
        Ok(guard)
    }
}

impl<T: Send> Wake for Monitor<T> {
    fn wake_all(&self) {
        // Taking the mutex orders this wake after the waiter's last status check.
        let _guard = self.enter();
        self.cond.notify_all();
    }
}
