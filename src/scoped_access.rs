// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RAII guards over `ReadHeavyLock`: lock on construction, unlock on drop.
// Guards are `!Send`; a lock must be released by the thread that took it.

use std::marker::PhantomData;

use crate::error::LockError;
use crate::ReadHeavyLock;

/// RAII read guard: `read_lock` on construction, `read_unlock` on drop.
pub struct ScopedRead<'a> {
    lock: &'a ReadHeavyLock,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ScopedRead<'a> {
    /// Create a new scoped read guard. Blocks while a writer is present.
    pub fn new(lock: &'a ReadHeavyLock) -> Result<Self, LockError> {
        lock.read_lock()?;
        Ok(Self {
            lock,
            _not_send: PhantomData,
        })
    }
}

impl Drop for ScopedRead<'_> {
    fn drop(&mut self) {
        self.lock.read_unlock();
    }
}

/// RAII write guard: `write_lock` on construction, `write_unlock` on drop.
pub struct ScopedWrite<'a> {
    lock: &'a ReadHeavyLock,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ScopedWrite<'a> {
    /// Create a new scoped write guard. Blocks until all readers have drained.
    pub fn new(lock: &'a ReadHeavyLock) -> Result<Self, LockError> {
        lock.write_lock()?;
        Ok(Self {
            lock,
            _not_send: PhantomData,
        })
    }
}

impl Drop for ScopedWrite<'_> {
    fn drop(&mut self) {
        // Same thread that locked; ownership cannot fail here.
        let _ = self.lock.write_unlock();
    }
}
