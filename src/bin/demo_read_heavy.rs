// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Readers and a writer sharing a routing table behind a ReadHeavyLock.
//
// Usage:
//   demo_read_heavy [readers] [updates]
//
// Each reader looks up random keys in a loop; the writer replaces one entry
// every few milliseconds. At the end the lock's wait counters are printed.
// Set RUST_LOG_LEVEL=trace|debug|warn to see the lock's slow-path log lines.

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use readheavy::ReadHeavyLock;

// ---------------------------------------------------------------------------
// Minimal stderr logger
// ---------------------------------------------------------------------------

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logger() {
    let level = match std::env::var("RUST_LOG_LEVEL").as_deref() {
        Ok("trace") => log::LevelFilter::Trace,
        Ok("debug") => log::LevelFilter::Debug,
        Ok("warn") => log::LevelFilter::Warn,
        _ => log::LevelFilter::Info,
    };
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

// ---------------------------------------------------------------------------
// Table guarded by the lock
// ---------------------------------------------------------------------------

struct Routes {
    lock: ReadHeavyLock,
    table: UnsafeCell<HashMap<u32, u64>>,
}

// Safety: `table` is only read under a read lock and only written under the
// write lock.
unsafe impl Sync for Routes {}

impl Routes {
    fn lookup(&self, key: u32) -> Option<u64> {
        let _read = self.lock.read().expect("read lock");
        unsafe { (*self.table.get()).get(&key).copied() }
    }

    fn update(&self, key: u32, value: u64) {
        let _write = self.lock.write().expect("write lock");
        unsafe {
            (*self.table.get()).insert(key, value);
        }
    }
}

fn main() {
    init_logger();

    let args: Vec<String> = std::env::args().collect();
    let readers: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(8);
    let updates: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50);

    let routes = Arc::new(Routes {
        lock: ReadHeavyLock::new(),
        table: UnsafeCell::new((0..64).map(|k| (k, 0)).collect()),
    });
    let quit = Arc::new(AtomicBool::new(false));
    let lookups = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..readers)
        .map(|i| {
            let routes = Arc::clone(&routes);
            let quit = Arc::clone(&quit);
            let lookups = Arc::clone(&lookups);
            thread::spawn(move || {
                let mut key = i as u32;
                let mut local = 0u64;
                while !quit.load(Ordering::Acquire) {
                    key = key.wrapping_mul(1_103_515_245).wrapping_add(12_345) % 64;
                    let _ = routes.lookup(key);
                    local += 1;
                }
                lookups.fetch_add(local, Ordering::Relaxed);
            })
        })
        .collect();

    for n in 1..=updates {
        routes.update((n % 64) as u32, n);
        thread::sleep(Duration::from_millis(2));
    }
    quit.store(true, Ordering::Release);
    for h in handles {
        h.join().expect("reader thread panicked");
    }

    let stats = routes.lock.stats();
    println!("readers:            {readers}");
    println!("lookups:            {}", lookups.load(Ordering::Relaxed));
    println!("updates:            {}", stats.write_locks);
    println!("reader waits:       {}", stats.reader_waits);
    println!("reverts:            {}", stats.reverts);
    println!("writer drain waits: {}", stats.drain_waits);
    println!("stale records:      {}", stats.stale_removed);
}
