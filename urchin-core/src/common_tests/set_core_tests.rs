use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use crate::data_structures::{ListSet, MAX_KEY, MIN_KEY};
use crate::error::SetError;
use crate::guard::Guard;

fn assert_strictly_ascending(keys: &[i32]) {
    for window in keys.windows(2) {
        assert!(
            window[0] < window[1],
            "keys not strictly ascending: {} then {}",
            window[0],
            window[1]
        );
    }
}

/// `add` then `contains` on a fresh set, including duplicate rejection.
pub fn test_sequential_add<G: Guard>() {
    let set = ListSet::<G>::new();

    assert!(!set.contains(5));
    assert_eq!(set.add(5), Ok(true));
    assert!(set.contains(5));
    assert_eq!(set.add(5), Ok(false));
    assert!(set.contains(5));
    assert_eq!(set.len(), 1);
}

/// `remove` on empty, present, and already-removed keys.
pub fn test_sequential_remove<G: Guard>() {
    let set = ListSet::<G>::new();

    assert!(!set.remove(5));
    assert_eq!(set.add(5), Ok(true));
    assert!(set.remove(5));
    assert!(!set.contains(5));
    assert!(!set.remove(5));

    // Re-adding after removal works.
    assert_eq!(set.add(5), Ok(true));
    assert!(set.contains(5));
}

/// Test basic insert, contains, and duplicate rejection
pub fn test_basic_operations<G: Guard>() {
    let set = ListSet::<G>::new();

    for key in [5, 10, 3, 7, 1] {
        assert_eq!(set.add(key), Ok(true));
    }

    // Duplicate rejection
    assert_eq!(set.add(5), Ok(false));
    assert_eq!(set.add(10), Ok(false));

    for key in [1, 3, 5, 7, 10] {
        assert!(set.contains(key), "Missing key: {}", key);
    }
    assert!(!set.contains(2));
    assert!(!set.contains(99));

    assert!(set.remove(3));
    assert!(!set.contains(3));
    assert!(!set.remove(3)); // Already removed

    assert_eq!(set.to_vec(), vec![1, 5, 7, 10]);
}

/// Negative keys, domain bounds and the reserved sentinel values.
pub fn test_key_domain<G: Guard>() {
    let set = ListSet::<G>::new();

    for key in [i32::MIN, i32::MAX] {
        assert_eq!(set.add(key), Err(SetError::ReservedKey { key }));
        assert!(!set.contains(key));
        assert!(!set.remove(key));
    }

    for key in [MAX_KEY, -1, 0, MIN_KEY, 1] {
        assert_eq!(set.add(key), Ok(true));
    }
    assert_eq!(set.to_vec(), vec![MIN_KEY, -1, 0, 1, MAX_KEY]);

    assert!(set.remove(MIN_KEY));
    assert!(set.remove(MAX_KEY));
    assert_eq!(set.to_vec(), vec![-1, 0, 1]);
}

/// Insertion order does not matter; Live keys come out sorted and unique.
pub fn test_sorted_unique_after_scrambled_inserts<G: Guard>() {
    let set = ListSet::<G>::new();
    let mut model = BTreeSet::new();

    // 7919 is prime, so this walks 0..1000 in a scrambled order, twice.
    for i in 0..2000 {
        let key = (i * 7919) % 1000 - 500;
        assert_eq!(set.add(key), Ok(model.insert(key)));
    }

    let keys = set.to_vec();
    assert_strictly_ascending(&keys);
    assert_eq!(keys, model.into_iter().collect::<Vec<_>>());
}

/// Test sequential insert and delete pattern
pub fn test_sequential_operations<G: Guard>() {
    let set = ListSet::<G>::new();

    for i in 0..100 {
        assert_eq!(set.add(i), Ok(true));
    }

    for i in (0..100).step_by(2) {
        assert!(set.remove(i));
    }

    for i in 0..100 {
        assert_eq!(set.contains(i), i % 2 == 1, "wrong membership for {}", i);
    }
    assert_eq!(set.len(), 50);
}

/// `is_empty` and `len` track membership.
pub fn test_is_empty<G: Guard>() {
    let set = ListSet::<G>::new();

    assert!(set.is_empty());

    set.add(1).unwrap();
    assert!(!set.is_empty());
    assert_eq!(set.len(), 1);

    set.remove(1);
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
}

/// Threads inserting disjoint ranges end with exactly the union.
pub fn test_concurrent_disjoint_ranges<G: Guard + 'static>() {
    let set = Arc::new(ListSet::<G>::new());
    let num_threads = 8;
    let items_per_thread = 500;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..items_per_thread {
                    let key = thread_id * items_per_thread + i;
                    assert_eq!(set.add(key), Ok(true), "Failed to insert {}", key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let expected: Vec<i32> = (0..num_threads * items_per_thread).collect();
    assert_eq!(set.len(), expected.len());
    assert_eq!(set.to_vec(), expected);
}

/// Test high contention on same keys
pub fn test_high_contention<G: Guard + 'static>() {
    let set = Arc::new(ListSet::<G>::new());
    let num_threads = 16;
    let range = 100;

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                let mut inserted = 0;
                for i in 0..range {
                    if set.add(i) == Ok(true) {
                        inserted += 1;
                    }
                }
                inserted
            })
        })
        .collect();

    let total: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Duplicates rejected: every key inserted by exactly one thread.
    assert_eq!(total, range);
    assert_eq!(set.to_vec(), (0..range).collect::<Vec<_>>());
}

/// Concurrent mixed operations, then structural checks once quiesced.
pub fn test_concurrent_mixed_operations<G: Guard + 'static>() {
    let set = Arc::new(ListSet::<G>::new());
    let num_threads = 6;
    let num_operations = 1000;

    // Pre-populate
    for i in 0..50 {
        set.add(i * 3).unwrap();
    }

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..num_operations {
                    let key = (thread_id * num_operations + i) % 500;

                    match i % 3 {
                        0 => {
                            set.add(key).unwrap();
                        }
                        1 => {
                            set.remove(key);
                        }
                        2 => {
                            set.contains(key);
                        }
                        _ => unreachable!(),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let keys = set.to_vec();
    assert_strictly_ascending(&keys);
    assert_eq!(keys.len(), set.len());
    for key in keys {
        assert!(set.contains(key), "listed key {} not a member", key);
    }
}
