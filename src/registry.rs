// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Copy-on-write list of reader records.
// Appends and removals replace the shared vector when a snapshot is still
// outstanding, so a writer iterating a snapshot never sees it change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::record::ReaderRecord;

pub(crate) type Snapshot = Arc<Vec<Arc<ReaderRecord>>>;

pub(crate) struct Registry {
    records: Mutex<Snapshot>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            records: Mutex::new(Arc::new(Vec::new())),
        }
    }

    fn records(&self) -> MutexGuard<'_, Snapshot> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record at the end (insertion order is kept).
    pub(crate) fn push(&self, record: Arc<ReaderRecord>) {
        Arc::make_mut(&mut self.records()).push(record);
    }

    /// Remove `record` by identity. Returns `false` if it was not registered.
    pub(crate) fn remove(&self, record: &Arc<ReaderRecord>) -> bool {
        let mut records = self.records();
        let Some(pos) = records.iter().position(|r| Arc::ptr_eq(r, record)) else {
            return false;
        };
        Arc::make_mut(&mut records).remove(pos);
        true
    }

    /// The records registered at this instant.
    pub(crate) fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.records())
    }

    pub(crate) fn len(&self) -> usize {
        self.records().len()
    }
}
