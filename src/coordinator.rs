// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Global write-intent coordination.
// - `write_intent` is read lock-free by readers, written only under the monitor.
// - The monitor state is the writer identity, `Some` iff `write_intent` is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard};
use std::thread::{self, ThreadId};

use crate::error::LockError;
use crate::monitor::Monitor;

pub(crate) struct Coordinator {
    write_intent: AtomicBool,
    monitor: Arc<Monitor<Option<ThreadId>>>,
}

impl Coordinator {
    pub(crate) fn new() -> Self {
        Self {
            write_intent: AtomicBool::new(false),
            monitor: Arc::new(Monitor::new(None)),
        }
    }

    /// Whether a writer holds or is draining toward the lock.
    #[inline]
    pub(crate) fn write_intent(&self) -> bool {
        self.write_intent.load(Ordering::SeqCst)
    }

    /// Enter the global monitor.
    pub(crate) fn enter(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.monitor.enter()
    }

    /// Park on the global monitor until no writer is present.
    /// The monitor is still held on return.
    pub(crate) fn wait_no_writer<'a>(
        &'a self,
        guard: MutexGuard<'a, Option<ThreadId>>,
    ) -> Result<MutexGuard<'a, Option<ThreadId>>, LockError> {
        self.monitor.wait_while(guard, |_| self.write_intent())
    }

    /// Block until no writer is present, then claim the write intent for the
    /// calling thread.
    pub(crate) fn acquire_write_intent(&self) -> Result<(), LockError> {
        let guard = self.enter();
        let mut owner = self.wait_no_writer(guard)?;
        self.write_intent.store(true, Ordering::SeqCst);
        *owner = Some(thread::current().id());
        Ok(())
    }

    /// Release the write intent. Fails without touching any state if the
    /// calling thread is not the current writer.
    pub(crate) fn release_write_intent(&self) -> Result<(), LockError> {
        let mut owner = self.enter();
        let caller = thread::current().id();
        if *owner != Some(caller) {
            return Err(LockError::IllegalOwnership {
                caller,
                owner: *owner,
            });
        }
        self.clear(&mut owner);
        Ok(())
    }

    /// Drop an intent claimed by the calling thread whose drain was abandoned.
    pub(crate) fn abandon_write_intent(&self) {
        let mut owner = self.enter();
        if *owner == Some(thread::current().id()) {
            self.clear(&mut owner);
        }
    }

    fn clear(&self, owner: &mut MutexGuard<'_, Option<ThreadId>>) {
        self.write_intent.store(false, Ordering::SeqCst);
        **owner = None;
        // Readers waiting for the writer to leave and threads queued to write.
        self.monitor.notify_all();
    }
}
