use std::collections::VecDeque;

use crate::sync::{Condvar, Mutex};
use crate::websocket::Error;


/// Blocking FIFO queue with a priority path and a close flag
///
/// Once closed, pending items are dropped, `take` returns `None` and pushes
/// fail.
#[derive(Debug)]
pub struct Queue<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> Queue<T> {
    pub fn new() -> Queue<T> {
        Queue {
            state: Mutex::new(State { items: VecDeque::new(), closed: false }),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) -> Result<(), Error> {
        self.extend(Some(item))
    }

    /// Pushes all items atomically, so they are taken in a row
    pub fn extend<I: IntoIterator<Item=T>>(&self, items: I)
        -> Result<(), Error>
    {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        state.items.extend(items);
        self.ready.notify_all();
        Ok(())
    }

    /// Puts the item before everything pending
    pub fn push_front(&self, item: T) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        state.items.push_front(item);
        self.ready.notify_all();
        Ok(())
    }

    /// Blocks until an item is available or the queue is closed
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            state = self.ready.wait(state);
        }
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.items.clear();
        self.ready.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }
}
