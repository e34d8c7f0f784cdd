//! Recorded concurrent histories and a linearizability checker.
//!
//! Threads run scripted operations against one set and stamp each call with
//! a shared logical clock before invocation and after return. A history is
//! linearizable if some order of the calls, consistent with those stamps,
//! replays against a `BTreeSet` with identical results (Wing & Gong search,
//! memoized on the set of linearized calls and the model state).

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::data_structures::ListSet;
use crate::guard::Guard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Add(i32),
    Remove(i32),
    Contains(i32),
}

impl SetOp {
    fn run<G: Guard>(self, set: &ListSet<G>) -> bool {
        match self {
            SetOp::Add(key) => set.add(key).expect("scripted keys are never reserved"),
            SetOp::Remove(key) => set.remove(key),
            SetOp::Contains(key) => set.contains(key),
        }
    }

    fn apply(self, model: &mut BTreeSet<i32>) -> bool {
        match self {
            SetOp::Add(key) => model.insert(key),
            SetOp::Remove(key) => model.remove(&key),
            SetOp::Contains(key) => model.contains(&key),
        }
    }
}

/// One completed call.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub thread: usize,
    pub op: SetOp,
    pub result: bool,
    pub invoked: u64,
    pub returned: u64,
}

/// Run one script per thread against a fresh set and collect every call.
pub fn record_history<G: Guard + 'static>(scripts: Vec<Vec<SetOp>>) -> Vec<Event> {
    let set = Arc::new(ListSet::<G>::new());
    let clock = Arc::new(AtomicU64::new(0));
    let barrier = Arc::new(Barrier::new(scripts.len()));

    let handles: Vec<_> = scripts
        .into_iter()
        .enumerate()
        .map(|(thread_id, script)| {
            let set = Arc::clone(&set);
            let clock = Arc::clone(&clock);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                script
                    .into_iter()
                    .map(|op| {
                        let invoked = clock.fetch_add(1, Ordering::SeqCst);
                        let result = op.run(&set);
                        let returned = clock.fetch_add(1, Ordering::SeqCst);
                        Event {
                            thread: thread_id,
                            op,
                            result,
                            invoked,
                            returned,
                        }
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect()
}

/// Whether `history` (starting from an empty set) has a legal linearization.
///
/// Supports up to 64 events.
pub fn is_linearizable(history: &[Event]) -> bool {
    assert!(history.len() <= 64, "history too long for the checker");
    let mut visited = HashSet::new();
    search(history, 0, &BTreeSet::new(), &mut visited)
}

fn search(
    history: &[Event],
    done: u64,
    model: &BTreeSet<i32>,
    visited: &mut HashSet<(u64, Vec<i32>)>,
) -> bool {
    if done.count_ones() as usize == history.len() {
        return true;
    }
    if !visited.insert((done, model.iter().copied().collect())) {
        return false;
    }

    let pending = || {
        history
            .iter()
            .enumerate()
            .filter(move |(i, _)| (done & (1 << *i)) == 0)
    };

    // A call may go next only if no other pending call returned before it began.
    let horizon = pending().map(|(_, e)| e.returned).min().unwrap_or(u64::MAX);

    for (i, event) in pending() {
        if event.invoked > horizon {
            continue;
        }
        let mut next = model.clone();
        if event.op.apply(&mut next) == event.result
            && search(history, done | (1 << i), &next, visited)
        {
            return true;
        }
    }
    false
}

/// Record each round's scripts and require a linearizable history.
pub fn test_linearizable_histories<G, I>(rounds: I)
where
    G: Guard + 'static,
    I: IntoIterator<Item = Vec<Vec<SetOp>>>,
{
    for (round, scripts) in rounds.into_iter().enumerate() {
        let history = record_history::<G>(scripts);
        assert!(
            is_linearizable(&history),
            "round {}: no legal linearization for {:#?}",
            round,
            history
        );
    }
}
