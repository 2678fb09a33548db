//! Request patterns, scripted responses and websocket messages
//!
//! A [`Configuration`] maps every [`Pattern`] to a list of [`Response`]s.
//! Lookups rotate these lists, so the configuration is shared between
//! connection threads behind an `Arc` and synchronizes internally.
use std::collections::VecDeque;
use std::sync::Arc;

use rand::{Rng, thread_rng};

use crate::server::Request;
use crate::sync::Mutex;

mod behavior;
mod message;
mod pattern;
mod response;
pub mod json;

pub use self::behavior::{Behavior, Interval};
pub use self::message::{Message, MessageType};
pub use self::pattern::{Order, Pattern};
pub use self::response::Response;

use self::pattern::Matcher;


/// The pattern to response store
#[derive(Debug, Default)]
pub struct Configuration {
    entries: Mutex<Vec<Arc<Entry>>>,
}

#[derive(Debug)]
struct Entry {
    pattern: Pattern,
    matcher: Matcher,
    responses: Mutex<VecDeque<Arc<Response>>>,
}

impl Entry {
    fn new(pattern: Pattern, responses: VecDeque<Arc<Response>>)
        -> Result<Entry, regex::Error>
    {
        Ok(Entry {
            matcher: Matcher::new(&pattern)?,
            pattern,
            responses: Mutex::new(responses),
        })
    }

    fn select(&self) -> Option<Arc<Response>> {
        let mut responses = self.responses.lock();
        match self.pattern.response_order {
            Order::Sequential => {
                let resp = responses.pop_front()?;
                responses.push_back(resp.clone());
                Some(resp)
            }
            Order::Random => {
                if responses.is_empty() {
                    return None;
                }
                let idx = thread_rng().gen_range(0..responses.len());
                Some(responses[idx].clone())
            }
            Order::Batch => None,
        }
    }
}

impl Configuration {
    pub fn new() -> Configuration {
        Configuration::default()
    }

    /// Appends a response to the list of the pattern
    ///
    /// Fails only if a pattern seen for the first time has an invalid
    /// regular expression.
    pub fn add_response(&self, pattern: Pattern, response: Response)
        -> Result<(), regex::Error>
    {
        let response = Arc::new(response);
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.iter().find(|e| e.pattern == pattern) {
            entry.responses.lock().push_back(response);
            return Ok(());
        }
        let mut list = VecDeque::new();
        list.push_back(response);
        entries.push(Arc::new(Entry::new(pattern, list)?));
        Ok(())
    }

    /// Merges patterns of `other` into this configuration
    ///
    /// Responses of a pattern present in both replace ours. New patterns are
    /// appended after the existing ones.
    pub fn add_configuration(&self, other: &Configuration) {
        let theirs = other.entries.lock().clone();
        let mut entries = self.entries.lock();
        for entry in theirs {
            match entries.iter().position(|e| e.pattern == entry.pattern) {
                Some(idx) => entries[idx] = entry,
                None => entries.push(entry),
            }
        }
    }

    /// Replaces everything by the contents of `other`
    pub fn set_configuration(&self, other: &Configuration) {
        let theirs = other.entries.lock().clone();
        *self.entries.lock() = theirs;
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Patterns in insertion order
    pub fn patterns(&self) -> Vec<Pattern> {
        self.entries.lock().iter().map(|e| e.pattern.clone()).collect()
    }

    /// Response for the first pattern matching `request`
    ///
    /// Returns `None` if nothing matches, or if the matched pattern's order
    /// can't select a single response.
    pub fn find_response(&self, request: &Request) -> Option<Arc<Response>> {
        // don't hold the list lock while rotating responses
        let entries = self.entries.lock().clone();
        entries.iter()
            .find(|e| e.matcher.matches(request))
            .and_then(|e| e.select())
    }

    /// Messages to send after `response` was served
    pub fn find_messages(&self, response: &Response) -> Vec<Message> {
        response.next_messages()
    }
}
