use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::sync::{Condvar, Mutex};
use crate::websocket::Error;


type Task = Box<dyn FnOnce() + Send + 'static>;

/// Longest delay honored, larger ones are clamped
const MAX_DELAY: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Runs tasks after a delay on a dedicated thread
///
/// Tasks with the same deadline run in the order they were scheduled. After
/// `shutdown()` pending tasks are dropped and new ones are rejected.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

struct State {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    shut_down: bool,
}

struct Entry {
    deadline: Instant,
    seq: u64,
    task: Task,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed, earliest deadline first
        other.deadline.cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl Scheduler {
    pub fn new(name: &str) -> io::Result<Scheduler> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                next_seq: 0,
                shut_down: false,
            }),
            wake: Condvar::new(),
        });
        let worker = shared.clone();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker.run())?;
        Ok(Scheduler { shared })
    }

    /// Runs `task` once `delay` elapses
    pub fn schedule<F>(&self, delay: Duration, task: F) -> Result<(), Error>
        where F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        if state.shut_down {
            return Err(Error::Closed);
        }
        let now = Instant::now();
        let deadline = now.checked_add(delay)
            .or_else(|| now.checked_add(MAX_DELAY))
            .unwrap_or(now);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Entry {
            deadline,
            seq,
            task: Box::new(task),
        });
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Drops pending tasks and stops the thread
    ///
    /// Doesn't wait for a task which is already running.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.shut_down = true;
        state.heap.clear();
        self.shared.wake.notify_one();
    }

    pub fn pending(&self) -> usize {
        self.shared.state.lock().heap.len()
    }
}

impl Shared {
    fn run(&self) {
        let mut state = self.state.lock();
        loop {
            if state.shut_down {
                return;
            }
            let now = Instant::now();
            let deadline = state.heap.peek().map(|e| e.deadline);
            match deadline {
                Some(deadline) if deadline <= now => {
                    if let Some(entry) = state.heap.pop() {
                        drop(state);
                        (entry.task)();
                        state = self.state.lock();
                    }
                }
                Some(deadline) => {
                    state = self.wake.wait_timeout(state, deadline - now);
                }
                None => {
                    state = self.wake.wait(state);
                }
            }
        }
    }
}
