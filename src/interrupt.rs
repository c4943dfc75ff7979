// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Per-thread interrupt status. A blocked lock call on an interrupted thread
// gives up with `LockError::Cancelled` instead of waiting on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::monitor::Wake;

struct InterruptState {
    requested: AtomicBool,
    /// Monitor the thread is currently parked on, if any.
    parked_on: Mutex<Option<Arc<dyn Wake>>>,
}

impl InterruptState {
    fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            parked_on: Mutex::new(None),
        }
    }

    fn set_parked(&self, target: Option<Arc<dyn Wake>>) {
        *self.parked_on.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }
}

thread_local! {
    static CURRENT: Arc<InterruptState> = Arc::new(InterruptState::new());
}

/// Handle used to interrupt the lock waits of one thread.
///
/// Obtained on the target thread with [`current`], then sent to whichever
/// thread decides to cancel it.
#[derive(Clone)]
pub struct Interrupter {
    state: Arc<InterruptState>,
}

impl Interrupter {
    /// Request cancellation of the target thread's lock waits.
    ///
    /// If the thread is parked inside a lock call, that call returns
    /// `LockError::Cancelled`. Otherwise the request stays pending and the
    /// next wait fails immediately.
    pub fn interrupt(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
        // Clone out of the slot: the slot is never held while entering a monitor.
        let target = self
            .state
            .parked_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(target) = target {
            target.wake_all();
        }
    }

    /// Whether an interrupt is pending (does not clear it).
    pub fn is_interrupted(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interrupter")
            .field("interrupted", &self.is_interrupted())
            .finish_non_exhaustive()
    }
}

/// Interrupt handle for the calling thread.
///
/// Called from a thread-local destructor after the thread's interrupt state
/// is gone, the handle is detached and interrupts nothing.
pub fn current() -> Interrupter {
    Interrupter {
        state: CURRENT
            .try_with(Arc::clone)
            .unwrap_or_else(|_| Arc::new(InterruptState::new())),
    }
}

/// Test and clear the calling thread's interrupt status.
pub fn interrupted() -> bool {
    take_current()
}

pub(crate) fn take_current() -> bool {
    CURRENT
        .try_with(|state| state.requested.swap(false, Ordering::SeqCst))
        .unwrap_or(false)
}

/// Record `target` as the monitor the calling thread is parked on until the
/// returned guard is dropped.
pub(crate) fn park_on(target: Arc<dyn Wake>) -> Parked {
    // An exiting thread can no longer be reached by an `Interrupter`.
    let state = CURRENT.try_with(Arc::clone).ok();
    if let Some(state) = &state {
        state.set_parked(Some(target));
    }
    Parked { state }
}

pub(crate) struct Parked {
    state: Option<Arc<InterruptState>>,
}

impl Drop for Parked {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            state.set_parked(None);
        }
    }
}
