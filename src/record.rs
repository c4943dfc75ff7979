// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Per-thread reader bookkeeping.
// Each thread that read-locks a given lock owns exactly one `ReaderRecord`
// for it. The record lives in the lock's registry and in the thread's local
// table; the thread's liveness token lets a writer tell when the owner is gone.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, AccessError, ThreadId};

use crate::coordinator::Coordinator;
use crate::error::LockError;
use crate::monitor::Monitor;

pub(crate) struct ReaderRecord {
    /// Set only by the owning thread; the writer only observes it.
    held: AtomicBool,
    /// Monitor state: a writer is parked waiting on this record.
    writer_waiting: Arc<Monitor<bool>>,
    /// Liveness token of the owning thread. Never upgraded for ownership.
    owner: Weak<()>,
    thread: ThreadId,
}

impl ReaderRecord {
    /// A record for the calling thread. Fails once the thread's local table
    /// has been torn down.
    pub(crate) fn for_current_thread() -> Result<Self, AccessError> {
        let (owner, thread) = LOCAL.try_with(|readers| (readers.liveness(), readers.thread))?;
        Ok(Self {
            held: AtomicBool::new(false),
            writer_waiting: Arc::new(Monitor::new(false)),
            owner,
            thread,
        })
    }

    pub(crate) fn thread(&self) -> ThreadId {
        self.thread
    }

    #[inline]
    pub(crate) fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn set_held(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub(crate) fn clear_held(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    pub(crate) fn owner_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }

    /// Undo an optimistic acquisition that raced with a writer, waking the
    /// writer if it is already parked on this record.
    pub(crate) fn revert(&self) {
        let waiting = self.writer_waiting.enter();
        self.clear_held();
        if *waiting {
            self.writer_waiting.notify_one();
        }
    }

    /// Wake the writer if it is parked on this record.
    pub(crate) fn notify_writer(&self) {
        let waiting = self.writer_waiting.enter();
        if *waiting {
            self.writer_waiting.notify_one();
        }
    }

    /// Park the calling writer until this record is released or its owner
    /// thread has exited.
    pub(crate) fn wait_released(&self) -> Result<(), LockError> {
        let _mark = WaitingMark::set(&self.writer_waiting);
        let guard = self.writer_waiting.enter();
        let _guard = self
            .writer_waiting
            .wait_while(guard, |_| self.is_held() && self.owner_alive())?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_writer_waiting(&self) -> bool {
        *self.writer_waiting.enter()
    }
}

/// Keeps `writer_waiting` raised for the duration of one drain wait and
/// lowers it on every exit path, cancellation included.
struct WaitingMark<'a> {
    monitor: &'a Monitor<bool>,
}

impl<'a> WaitingMark<'a> {
    fn set(monitor: &'a Monitor<bool>) -> Self {
        *monitor.enter() = true;
        Self { monitor }
    }
}

impl Drop for WaitingMark<'_> {
    fn drop(&mut self) {
        *self.monitor.enter() = false;
    }
}

// ---------------------------------------------------------------------------
// Thread-local record table
// ---------------------------------------------------------------------------

struct LocalRecord {
    lock: Weak<Coordinator>,
    record: Arc<ReaderRecord>,
}

struct LocalReaders {
    thread: ThreadId,
    alive: Option<Arc<()>>,
    records: RefCell<Vec<LocalRecord>>,
}

impl LocalReaders {
    fn liveness(&self) -> Weak<()> {
        self.alive.as_ref().map(Arc::downgrade).unwrap_or_default()
    }
}

impl Drop for LocalReaders {
    fn drop(&mut self) {
        // The token goes first so a woken writer sees the owner as gone.
        self.alive = None;
        for local in self.records.get_mut().drain(..) {
            local.record.notify_writer();
        }
    }
}

thread_local! {
    static LOCAL: LocalReaders = LocalReaders {
        thread: thread::current().id(),
        alive: Some(Arc::new(())),
        records: RefCell::new(Vec::new()),
    };
}

/// The calling thread's record for the lock identified by `lock`, if any.
///
/// `Err` means the thread is exiting and its table is already gone (the call
/// comes from another thread-local destructor).
pub(crate) fn local(lock: &Arc<Coordinator>) -> Result<Option<Arc<ReaderRecord>>, AccessError> {
    LOCAL.try_with(|readers| {
        readers
            .records
            .borrow()
            .iter()
            .find(|local| std::ptr::eq(local.lock.as_ptr(), Arc::as_ptr(lock)))
            .map(|local| Arc::clone(&local.record))
    })
}

/// Remember `record` as the calling thread's record for `lock`. Entries of
/// locks that have since been dropped are discarded.
pub(crate) fn remember(
    lock: &Arc<Coordinator>,
    record: Arc<ReaderRecord>,
) -> Result<(), AccessError> {
    LOCAL.try_with(|readers| {
        let mut records = readers.records.borrow_mut();
        records.retain(|local| local.lock.strong_count() > 0);
        records.push(LocalRecord {
            lock: Arc::downgrade(lock),
            record,
        });
    })
}
