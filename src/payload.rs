use std::cmp::{max, min};
use std::sync::Arc;
use std::thread;

use rand::{Rng, thread_rng};

use crate::config::Interval;


/// Size of a body part when no chunk range is configured
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Serves a byte template in random pieces
///
/// The cursor re-arms itself: once everything is served, one call to `next`
/// returns `None` and the following calls start over from the beginning.
#[derive(Debug, Clone)]
pub struct Payload {
    template: Arc<[u8]>,
    position: usize,
}

impl Payload {
    pub fn new(template: Arc<[u8]>) -> Payload {
        Payload { template, position: 0 }
    }

    pub fn template(&self) -> &[u8] {
        &self.template
    }

    /// Starts over from the beginning of the template
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn remaining(&self) -> usize {
        self.template.len() - self.position
    }

    /// Returns next piece of the template
    ///
    /// Sleeps for a random duration from `delay` first. The size of the
    /// piece is random within `size` and capped to what is left. With
    /// `chunked` set, the piece is prefixed by its hex length and CRLF.
    pub fn next(&mut self, delay: Interval, size: Interval, chunked: bool)
        -> Option<Vec<u8>>
    {
        if self.remaining() == 0 {
            self.position = 0;
            return None;
        }
        if !delay.is_zero() && !delay.is_empty() {
            thread::sleep(delay.random_delay());
        }
        let len = self.piece_size(size);
        let piece = &self.template[self.position..self.position + len];
        self.position += len;
        if chunked {
            let mut buf = format!("{:x}\r\n", len).into_bytes();
            buf.extend_from_slice(piece);
            Some(buf)
        } else {
            Some(piece.to_vec())
        }
    }

    fn piece_size(&self, size: Interval) -> usize {
        let remaining = self.remaining();
        let degenerate = size.is_zero() || size.is_empty() ||
            size.start > remaining as u64;
        if degenerate {
            return min(DEFAULT_CHUNK_SIZE, remaining);
        }
        let low = max(size.start, 1);
        let high = min(size.end, remaining as u64);
        thread_rng().gen_range(low..=max(low, high)) as usize
    }
}
