// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error type shared by every blocking lock operation.

use std::fmt;
use std::io;
use std::thread::{AccessError, ThreadId};

/// Failure of a lock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// `write_unlock` was called by a thread that does not hold the write lock.
    /// `owner` is the current holder, if any.
    IllegalOwnership {
        caller: ThreadId,
        owner: Option<ThreadId>,
    },
    /// A blocking wait was interrupted through [`Interrupter::interrupt`](crate::Interrupter::interrupt).
    Cancelled,
    /// `read_lock` was called while the calling thread is being torn down
    /// (from a thread-local destructor) and its reader state is gone.
    ThreadExiting,
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::IllegalOwnership { caller, owner: Some(owner) } => write!(
                f,
                "write lock released by {caller:?} but held by {owner:?}"
            ),
            LockError::IllegalOwnership { caller, owner: None } => {
                write!(f, "write lock released by {caller:?} but not held")
            }
            LockError::Cancelled => write!(f, "lock wait interrupted"),
            LockError::ThreadExiting => write!(f, "thread-local reader state already destroyed"),
        }
    }
}

impl std::error::Error for LockError {}

impl From<AccessError> for LockError {
    fn from(_: AccessError) -> Self {
        LockError::ThreadExiting
    }
}

impl From<LockError> for io::Error {
    fn from(err: LockError) -> Self {
        let kind = match err {
            LockError::IllegalOwnership { .. } => io::ErrorKind::PermissionDenied,
            LockError::Cancelled => io::ErrorKind::Interrupted,
            LockError::ThreadExiting => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
