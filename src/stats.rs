// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Wait-event counters. Only slow paths touch them; the uncontended
// read lock/unlock sequence never writes shared memory other than its own record.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a lock's wait-event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Times a reader parked on the global monitor (record creation or slow path).
    pub reader_waits: u64,
    /// Optimistic read acquisitions undone because a writer was present.
    pub reverts: u64,
    /// Completed `write_lock` calls.
    pub write_locks: u64,
    /// Times a writer parked on a reader record during a drain.
    pub drain_waits: u64,
    /// Records removed because their owning thread had exited.
    pub stale_removed: u64,
    /// Lock calls that returned `LockError::Cancelled`.
    pub cancelled: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    reader_waits: AtomicU64,
    reverts: AtomicU64,
    write_locks: AtomicU64,
    drain_waits: AtomicU64,
    stale_removed: AtomicU64,
    cancelled: AtomicU64,
}

#[derive(Clone, Copy)]
pub(crate) enum Event {
    ReaderWait,
    Revert,
    WriteLock,
    DrainWait,
    StaleRemoved,
    Cancelled,
}

impl Counters {
    pub(crate) fn bump(&self, event: Event) {
        let counter = match event {
            Event::ReaderWait => &self.reader_waits,
            Event::Revert => &self.reverts,
            Event::WriteLock => &self.write_locks,
            Event::DrainWait => &self.drain_waits,
            Event::StaleRemoved => &self.stale_removed,
            Event::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LockStats {
        LockStats {
            reader_waits: self.reader_waits.load(Ordering::Relaxed),
            reverts: self.reverts.load(Ordering::Relaxed),
            write_locks: self.write_locks.load(Ordering::Relaxed),
            drain_waits: self.drain_waits.load(Ordering::Relaxed),
            stale_removed: self.stale_removed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}
