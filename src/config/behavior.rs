use std::cmp::max;
use std::time::Duration;

use rand::{Rng, thread_rng};


/// Inclusive range of unsigned values
///
/// `0..0` is a sentinel meaning "no hint", consumers pick their own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

/// How a response body is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Behavior {
    /// Random delay in milliseconds before each body part
    pub delay: Interval,
    /// Random size in bytes of each body part
    pub chunk: Interval,
    /// Add `Content-Length` when the response declares no body framing
    pub calculate_content_length: bool,
    /// Add `Sec-WebSocket-Accept` when the client sent a key
    pub calculate_websocket_accept: bool,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Interval {
        Interval { start, end }
    }

    pub fn zero() -> Interval {
        Interval { start: 0, end: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Uniformly random value of the range, upper bound never below lower
    pub fn random(&self) -> u64 {
        let end = max(self.start, self.end);
        thread_rng().gen_range(self.start..=end)
    }

    /// Random delay, zero for `0..0`
    pub fn random_delay(&self) -> Duration {
        Duration::from_millis(self.random())
    }

    /// Random frame size, unbounded for `0..0`
    ///
    /// Never returns zero so splitting a payload always makes progress.
    pub fn random_size(&self) -> usize {
        if max(self.start, self.end) == 0 {
            return usize::MAX;
        }
        let size = self.random();
        if size > usize::MAX as u64 {
            usize::MAX
        } else {
            max(size as usize, 1)
        }
    }
}

impl Default for Behavior {
    fn default() -> Behavior {
        Behavior {
            delay: Interval::zero(),
            chunk: Interval::zero(),
            calculate_content_length: true,
            calculate_websocket_accept: true,
        }
    }
}
