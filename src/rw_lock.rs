// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Read-heavy lock: readers take a per-thread flag without touching shared
// state; a writer raises a global intent flag, then waits for every reader
// record it observes held to be released.
// - Global monitor: write intent + writer identity, "writer left" wakeups.
// - Record monitor (one per reader thread): "this reader let go" wakeups.

use std::fmt;
use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::error::LockError;
use crate::record::{self, ReaderRecord};
use crate::registry::Registry;
use crate::scoped_access::{ScopedRead, ScopedWrite};
use crate::stats::{Counters, Event, LockStats};

/// A read-write lock optimised for workloads that are almost all reads.
///
/// With no writer around, `read_lock` and `read_unlock` are a thread-local
/// lookup plus a few atomic operations on the calling thread's own record;
/// no mutex is taken. A writer announces itself through a global flag and
/// then drains the readers one record at a time.
///
/// There is no fairness between readers and writers: a steady stream of
/// readers can keep a writer draining indefinitely.
///
/// # Caller contract
///
/// - Calls must be paired 1:1 on the same thread. The lock is not reentrant:
///   a second `read_lock` before `read_unlock` is not detected and breaks
///   the drain protocol.
/// - `read_unlock` on a thread that holds no read lock is not detected.
/// - A thread that exits while holding a read lock does not release it, but
///   writers stop waiting on it and drop its record.
pub struct ReadHeavyLock {
    coordinator: Arc<Coordinator>,
    registry: Registry,
    counters: Counters,
}

impl ReadHeavyLock {
    /// Create a new, unlocked lock.
    pub fn new() -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new()),
            registry: Registry::new(),
            counters: Counters::default(),
        }
    }

    /// Acquire a shared (read) lock, blocking while a writer is present.
    ///
    /// # Errors
    /// - `LockError::Cancelled` if the calling thread is interrupted while blocked.
    /// - `LockError::ThreadExiting` if called from a thread-local destructor
    ///   after this thread's reader state has been destroyed.
    pub fn read_lock(&self) -> Result<(), LockError> {
        let record = self.reader_record()?;

        // Optimistic: publish the hold first, then look for a writer.
        record.set_held();
        if !self.coordinator.write_intent() {
            return Ok(());
        }
        self.read_lock_contended(&record)
    }

    /// Slow path of `read_lock`: back out of the optimistic hold, then take it
    /// again under the global monitor once no writer is present.
    fn read_lock_contended(&self, record: &ReaderRecord) -> Result<(), LockError> {
        // A writer may already have inspected (or be about to inspect) this record.
        record.revert();
        self.counters.bump(Event::Revert);
        log::trace!("reader {:?} reverted, writer present", record.thread());

        let guard = self.coordinator.enter();
        if self.coordinator.write_intent() {
            self.counters.bump(Event::ReaderWait);
        }
        let _guard = self
            .coordinator
            .wait_no_writer(guard)
            .inspect_err(|_| self.cancelled())?;
        // No writer can claim the intent while the global monitor is held.
        record.set_held();
        Ok(())
    }

    /// Release this thread's shared (read) lock.
    ///
    /// From a thread-local destructor running after this thread's reader
    /// state is gone, this does nothing: the record is already orphaned and
    /// writers neither wait on it nor keep it.
    pub fn read_unlock(&self) {
        let Ok(Some(record)) = record::local(&self.coordinator) else {
            return;
        };
        record.clear_held();
        // A writer may have parked on this record since `read_lock`.
        if self.coordinator.write_intent() {
            record.notify_writer();
        }
    }

    /// Acquire the exclusive (write) lock: wait for any other writer, claim
    /// the write intent, then wait for every held reader to release.
    ///
    /// # Errors
    /// `LockError::Cancelled` if the calling thread is interrupted while
    /// blocked. A writer cancelled during the drain gives its intent back.
    pub fn write_lock(&self) -> Result<(), LockError> {
        self.coordinator
            .acquire_write_intent()
            .inspect_err(|_| self.cancelled())?;

        if let Err(err) = self.drain_readers() {
            self.coordinator.abandon_write_intent();
            self.cancelled();
            return Err(err);
        }
        self.counters.bump(Event::WriteLock);
        Ok(())
    }

    /// Release the exclusive (write) lock.
    ///
    /// # Errors
    /// `LockError::IllegalOwnership` if the calling thread is not the writer;
    /// the lock state is left untouched.
    pub fn write_unlock(&self) -> Result<(), LockError> {
        self.coordinator.release_write_intent().inspect_err(|err| {
            log::warn!("{err}");
        })
    }

    /// Acquire a read lock released when the returned guard is dropped.
    pub fn read(&self) -> Result<ScopedRead<'_>, LockError> {
        ScopedRead::new(self)
    }

    /// Acquire the write lock, released when the returned guard is dropped.
    pub fn write(&self) -> Result<ScopedWrite<'_>, LockError> {
        ScopedWrite::new(self)
    }

    /// Whether a writer currently holds or is draining toward the lock.
    pub fn is_write_locked(&self) -> bool {
        self.coordinator.write_intent()
    }

    /// Number of reader records currently registered (one per thread that
    /// has read-locked and has not been found dead by a writer yet).
    pub fn registered_readers(&self) -> usize {
        self.registry.len()
    }

    /// Snapshot of the wait-event counters.
    pub fn stats(&self) -> LockStats {
        self.counters.snapshot()
    }

    /// The calling thread's record, registering one (only while no writer is
    /// present) on first use.
    fn reader_record(&self) -> Result<Arc<ReaderRecord>, LockError> {
        let exiting = |_| {
            log::debug!("read_lock after thread-local teardown");
            LockError::ThreadExiting
        };
        if let Some(record) = record::local(&self.coordinator).map_err(exiting)? {
            return Ok(record);
        }
        let record = Arc::new(ReaderRecord::for_current_thread().map_err(exiting)?);

        let guard = self.coordinator.enter();
        if self.coordinator.write_intent() {
            self.counters.bump(Event::ReaderWait);
        }
        let guard = self
            .coordinator
            .wait_no_writer(guard)
            .inspect_err(|_| self.cancelled())?;
        self.registry.push(Arc::clone(&record));
        drop(guard);

        record::remember(&self.coordinator, Arc::clone(&record))?;
        Ok(record)
    }

    /// Wait for every registered reader seen holding the lock to release it,
    /// dropping records whose thread has exited.
    fn drain_readers(&self) -> Result<(), LockError> {
        for record in self.registry.snapshot().iter() {
            if record.is_held() && record.owner_alive() {
                self.counters.bump(Event::DrainWait);
                log::debug!("writer waiting on reader {:?}", record.thread());
                record.wait_released()?;
            }
            if !record.owner_alive() && self.registry.remove(record) {
                self.counters.bump(Event::StaleRemoved);
                log::debug!("removed record of exited reader {:?}", record.thread());
            }
        }
        Ok(())
    }

    fn cancelled(&self) {
        self.counters.bump(Event::Cancelled);
        log::warn!("lock wait cancelled by interrupt");
    }
}

impl Default for ReadHeavyLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadHeavyLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadHeavyLock")
            .field("write_locked", &self.is_write_locked())
            .field("registered_readers", &self.registered_readers())
            .finish_non_exhaustive()
    }
}
