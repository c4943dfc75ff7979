// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Read-heavy lock: near-free uncontended reads through per-thread reader
// records, exclusive writers that drain in-flight readers before proceeding.

mod monitor;

pub mod interrupt;
pub use interrupt::Interrupter;

mod error;
pub use error::LockError;

mod coordinator;
mod record;
mod registry;

mod stats;
pub use stats::LockStats;

mod rw_lock;
pub use rw_lock::ReadHeavyLock;

mod scoped_access;
pub use scoped_access::{ScopedRead, ScopedWrite};
