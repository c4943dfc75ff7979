// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Core read/write behaviour of ReadHeavyLock.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use readheavy::{LockError, ReadHeavyLock};

fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if cond() {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("condition not reached in time");
}

#[test]
fn basic_write_lock() {
    let lock = ReadHeavyLock::new();
    lock.write_lock().expect("write_lock");
    assert!(lock.is_write_locked());
    lock.write_unlock().expect("write_unlock");
    assert!(!lock.is_write_locked());
}

#[test]
fn basic_read_lock() {
    let lock = ReadHeavyLock::new();
    lock.read_lock().expect("read_lock");
    lock.read_unlock();
    assert_eq!(lock.registered_readers(), 1);
}

#[test]
fn multiple_write_cycles() {
    let lock = ReadHeavyLock::new();
    for _ in 0..100 {
        lock.write_lock().unwrap();
        lock.write_unlock().unwrap();
    }
    assert_eq!(lock.stats().write_locks, 100);
}

#[test]
fn multiple_read_cycles() {
    let lock = ReadHeavyLock::new();
    for _ in 0..100 {
        lock.read_lock().unwrap();
        lock.read_unlock();
    }
    // One record per thread, however often it reads.
    assert_eq!(lock.registered_readers(), 1);
}

#[test]
fn read_then_write_same_thread() {
    let lock = ReadHeavyLock::new();
    lock.read_lock().unwrap();
    lock.read_unlock();
    lock.write_lock().unwrap();
    lock.write_unlock().unwrap();
    lock.read_lock().unwrap();
    lock.read_unlock();
}

#[test]
fn unlock_without_read_lock_is_ignored() {
    let lock = ReadHeavyLock::new();
    lock.read_unlock();
    assert_eq!(lock.registered_readers(), 0);
}

#[test]
fn write_lock_protection() {
    let lock = Arc::new(ReadHeavyLock::new());
    let data = Arc::new(AtomicI32::new(0));
    let iterations = 500;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let data = Arc::clone(&data);
            thread::spawn(move || {
                for _ in 0..iterations {
                    lock.write_lock().unwrap();
                    // Non-atomic read-modify-write; only safe under exclusion.
                    let v = data.load(Ordering::Relaxed);
                    data.store(v + 1, Ordering::Relaxed);
                    lock.write_unlock().unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(data.load(Ordering::Relaxed), iterations * 2);
}

#[test]
fn concurrent_readers() {
    let lock = Arc::new(ReadHeavyLock::new());
    let inside = Arc::new(AtomicI32::new(0));
    let max_inside = Arc::new(AtomicI32::new(0));
    let num_readers = 5;

    let handles: Vec<_> = (0..num_readers)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                for _ in 0..20 {
                    lock.read_lock().unwrap();
                    let current = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(current, Ordering::SeqCst);
                    thread::sleep(Duration::from_micros(200));
                    inside.fetch_sub(1, Ordering::SeqCst);
                    lock.read_unlock();
                    thread::yield_now();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert!(
        max_inside.load(Ordering::SeqCst) > 1,
        "should have had multiple concurrent readers"
    );
}

#[test]
fn readers_never_wait_without_writer() {
    let lock = Arc::new(ReadHeavyLock::new());
    let num_readers = 8;

    let handles: Vec<_> = (0..num_readers)
        .map(|_| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for _ in 0..5000 {
                    lock.read_lock().unwrap();
                    lock.read_unlock();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = lock.stats();
    assert_eq!(stats.reader_waits, 0);
    assert_eq!(stats.reverts, 0);
    assert_eq!(stats.drain_waits, 0);
    assert!(!lock.is_write_locked());
    assert_eq!(lock.registered_readers(), num_readers);
}

#[test]
fn writer_exclusive_access() {
    let lock = Arc::new(ReadHeavyLock::new());
    let writer_in_cs = Arc::new(AtomicBool::new(false));
    let violation = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let wics = Arc::clone(&writer_in_cs);
            let viol = Arc::clone(&violation);
            thread::spawn(move || {
                for _ in 0..50 {
                    lock.write_lock().unwrap();
                    if wics.swap(true, Ordering::SeqCst) {
                        viol.store(true, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_micros(50));
                    wics.store(false, Ordering::SeqCst);
                    lock.write_unlock().unwrap();
                    thread::yield_now();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert!(!violation.load(Ordering::SeqCst));
}

#[test]
fn readers_writers_no_overlap() {
    let lock = Arc::new(ReadHeavyLock::new());
    let readers = Arc::new(AtomicI32::new(0));
    let writer_active = Arc::new(AtomicBool::new(false));
    let violation = Arc::new(AtomicBool::new(false));

    let mut handles: Vec<_> = (0..3)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let readers = Arc::clone(&readers);
            let wa = Arc::clone(&writer_active);
            let viol = Arc::clone(&violation);
            thread::spawn(move || {
                for _ in 0..30 {
                    lock.read_lock().unwrap();
                    readers.fetch_add(1, Ordering::SeqCst);
                    if wa.load(Ordering::SeqCst) {
                        viol.store(true, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_micros(50));
                    readers.fetch_sub(1, Ordering::SeqCst);
                    lock.read_unlock();
                    thread::yield_now();
                }
            })
        })
        .collect();

    for _ in 0..2 {
        let lock = Arc::clone(&lock);
        let readers = Arc::clone(&readers);
        let wa = Arc::clone(&writer_active);
        let viol = Arc::clone(&violation);
        handles.push(thread::spawn(move || {
            for _ in 0..15 {
                lock.write_lock().unwrap();
                if wa.swap(true, Ordering::SeqCst) {
                    viol.store(true, Ordering::SeqCst);
                }
                if readers.load(Ordering::SeqCst) > 0 {
                    viol.store(true, Ordering::SeqCst);
                }
                thread::sleep(Duration::from_micros(50));
                wa.store(false, Ordering::SeqCst);
                lock.write_unlock().unwrap();
                thread::yield_now();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert!(!violation.load(Ordering::SeqCst));
    assert!(!lock.is_write_locked());
}

#[test]
fn many_readers_one_writer() {
    let lock = Arc::new(ReadHeavyLock::new());
    let data = Arc::new(AtomicI32::new(0));
    let read_count = Arc::new(AtomicI32::new(0));
    let num_readers = 10;

    let mut handles: Vec<_> = (0..num_readers)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let data = Arc::clone(&data);
            let rc = Arc::clone(&read_count);
            thread::spawn(move || {
                for _ in 0..50 {
                    lock.read_lock().unwrap();
                    let _ = data.load(Ordering::Relaxed);
                    rc.fetch_add(1, Ordering::Relaxed);
                    lock.read_unlock();
                    thread::yield_now();
                }
            })
        })
        .collect();

    let lock_w = Arc::clone(&lock);
    let data_w = Arc::clone(&data);
    handles.push(thread::spawn(move || {
        for _ in 0..100 {
            lock_w.write_lock().unwrap();
            data_w.fetch_add(1, Ordering::Relaxed);
            lock_w.write_unlock().unwrap();
            thread::yield_now();
        }
    }));

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(data.load(Ordering::Relaxed), 100);
    assert_eq!(read_count.load(Ordering::Relaxed), num_readers * 50);
    assert_eq!(lock.stats().write_locks, 100);
}

#[test]
fn mixed_rapid_operations() {
    let lock = Arc::new(ReadHeavyLock::new());

    let mut handles: Vec<_> = (0..3)
        .map(|_| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for _ in 0..1000 {
                    lock.read_lock().unwrap();
                    lock.read_unlock();
                }
            })
        })
        .collect();
    for _ in 0..2 {
        let lock = Arc::clone(&lock);
        handles.push(thread::spawn(move || {
            for _ in 0..300 {
                lock.write_lock().unwrap();
                lock.write_unlock().unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert!(!lock.is_write_locked());
    lock.write_lock().unwrap();
    lock.write_unlock().unwrap();
}

#[test]
fn write_lock_blocks_readers() {
    let lock = Arc::new(ReadHeavyLock::new());
    let write_locked = Arc::new(AtomicBool::new(false));
    let reader_entered = Arc::new(AtomicBool::new(false));

    lock.write_lock().unwrap();
    write_locked.store(true, Ordering::SeqCst);

    let lock_r = Arc::clone(&lock);
    let wl = Arc::clone(&write_locked);
    let re = Arc::clone(&reader_entered);
    let reader = thread::spawn(move || {
        lock_r.read_lock().unwrap();
        if wl.load(Ordering::SeqCst) {
            re.store(true, Ordering::SeqCst);
        }
        lock_r.read_unlock();
    });

    wait_for(|| lock.stats().reader_waits == 1);
    thread::sleep(Duration::from_millis(20));
    write_locked.store(false, Ordering::SeqCst);
    lock.write_unlock().unwrap();

    reader.join().unwrap();
    assert!(!reader_entered.load(Ordering::SeqCst));
}

#[test]
fn writer_drains_held_reader() {
    let lock = Arc::new(ReadHeavyLock::new());
    let (locked_tx, locked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let lock_r = Arc::clone(&lock);
    let reader = thread::spawn(move || {
        lock_r.read_lock().unwrap();
        locked_tx.send(()).unwrap();
        release_rx.recv().unwrap();
        lock_r.read_unlock();
    });
    locked_rx.recv().unwrap();

    let acquired = Arc::new(AtomicBool::new(false));
    let lock_w = Arc::clone(&lock);
    let acq = Arc::clone(&acquired);
    let writer = thread::spawn(move || {
        lock_w.write_lock().unwrap();
        acq.store(true, Ordering::SeqCst);
        lock_w.write_unlock().unwrap();
    });

    wait_for(|| lock.stats().drain_waits == 1);
    thread::sleep(Duration::from_millis(20));
    assert!(!acquired.load(Ordering::SeqCst));
    assert!(lock.is_write_locked());

    release_tx.send(()).unwrap();
    writer.join().unwrap();
    reader.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
    assert!(!lock.is_write_locked());
}

// Reader A holds, writer B drains on A, reader C queues behind B.
#[test]
fn reader_writer_reader_handoff() {
    let lock = Arc::new(ReadHeavyLock::new());
    lock.read_lock().unwrap(); // thread A is this thread

    let (b_locked_tx, b_locked_rx) = mpsc::channel();
    let (b_release_tx, b_release_rx) = mpsc::channel::<()>();
    let lock_b = Arc::clone(&lock);
    let b = thread::spawn(move || {
        lock_b.write_lock().unwrap();
        b_locked_tx.send(()).unwrap();
        b_release_rx.recv().unwrap();
        lock_b.write_unlock().unwrap();
    });

    wait_for(|| lock.stats().drain_waits == 1);
    assert!(b_locked_rx.recv_timeout(Duration::from_millis(20)).is_err());

    let c_done = Arc::new(AtomicBool::new(false));
    let lock_c = Arc::clone(&lock);
    let done = Arc::clone(&c_done);
    let c = thread::spawn(move || {
        lock_c.read_lock().unwrap();
        done.store(true, Ordering::SeqCst);
        lock_c.read_unlock();
    });
    wait_for(|| lock.stats().reader_waits == 1);

    lock.read_unlock();
    b_locked_rx.recv().unwrap();
    assert!(!c_done.load(Ordering::SeqCst));

    b_release_tx.send(()).unwrap();
    b.join().unwrap();
    c.join().unwrap();
    assert!(c_done.load(Ordering::SeqCst));
}

#[test]
fn write_unlock_by_non_owner_fails() {
    let lock = Arc::new(ReadHeavyLock::new());
    lock.write_lock().unwrap();
    let owner = thread::current().id();

    let lock2 = Arc::clone(&lock);
    let (caller, result) = thread::spawn(move || (thread::current().id(), lock2.write_unlock()))
        .join()
        .unwrap();

    assert_eq!(
        result,
        Err(LockError::IllegalOwnership {
            caller,
            owner: Some(owner),
        })
    );
    assert!(lock.is_write_locked());
    lock.write_unlock().unwrap();
}

#[test]
fn write_unlock_when_unlocked_fails() {
    let lock = ReadHeavyLock::new();
    let result = lock.write_unlock();
    assert!(matches!(
        result,
        Err(LockError::IllegalOwnership { owner: None, .. })
    ));
    assert!(!lock.is_write_locked());
}

#[test]
fn errors_convert_to_io() {
    let err: std::io::Error = LockError::Cancelled.into();
    assert_eq!(err.kind(), std::io::ErrorKind::Interrupted);

    let err: std::io::Error = LockError::ThreadExiting.into();
    assert_eq!(err.kind(), std::io::ErrorKind::Other);

    let lock = ReadHeavyLock::new();
    let err: std::io::Error = lock.write_unlock().unwrap_err().into();
    assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
}

#[test]
fn independent_locks_have_independent_records() {
    let a = ReadHeavyLock::new();
    let b = ReadHeavyLock::new();

    a.read_lock().unwrap();
    // Holding `a` does not hold `b`.
    b.write_lock().unwrap();
    b.write_unlock().unwrap();
    a.read_unlock();

    b.read_lock().unwrap();
    b.read_unlock();
    assert_eq!(a.registered_readers(), 1);
    assert_eq!(b.registered_readers(), 1);
}

#[test]
fn concurrent_mixed_operations() {
    let lock = Arc::new(ReadHeavyLock::new());
    let data = Arc::new(AtomicI32::new(0));
    let reads = Arc::new(AtomicI32::new(0));
    let writes = Arc::new(AtomicI32::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let data = Arc::clone(&data);
            let reads = Arc::clone(&reads);
            let writes = Arc::clone(&writes);
            thread::spawn(move || {
                for i in 0..50 {
                    if i % 3 == 0 {
                        lock.write_lock().unwrap();
                        data.fetch_add(1, Ordering::Relaxed);
                        writes.fetch_add(1, Ordering::Relaxed);
                        lock.write_unlock().unwrap();
                    } else {
                        lock.read_lock().unwrap();
                        let _ = data.load(Ordering::Relaxed);
                        reads.fetch_add(1, Ordering::Relaxed);
                        lock.read_unlock();
                    }
                    thread::yield_now();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(writes.load(Ordering::Relaxed), 4 * 17);
    assert_eq!(data.load(Ordering::Relaxed), 4 * 17);
    assert_eq!(reads.load(Ordering::Relaxed), 4 * 33);
}
