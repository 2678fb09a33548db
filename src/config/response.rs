use std::collections::VecDeque;
use std::sync::Arc;

use rand::{Rng, thread_rng};

use crate::config::{Behavior, Message, Order};
use crate::enums::reason_phrase;
use crate::headers;
use crate::payload::Payload;
use crate::sync::Mutex;


/// A scripted HTTP response
///
/// Holds streaming state: every `body()` call advances a cursor over the
/// content, so a response is meant to be shared behind an `Arc` and served
/// repeatedly.
#[derive(Debug)]
pub struct Response {
    pub code: u16,
    pub protocol: String,
    pub headers: Vec<String>,
    pub behavior: Behavior,
    pub message_order: Order,
    messages: Mutex<VecDeque<Message>>,
    payload: Mutex<Payload>,
}

impl Response {
    pub fn new(code: u16) -> Response {
        Response {
            code,
            protocol: "HTTP/1.1".to_string(),
            headers: Vec::new(),
            behavior: Behavior::default(),
            message_order: Order::Sequential,
            messages: Mutex::new(VecDeque::new()),
            payload: Mutex::new(Payload::new(Arc::from(&b""[..]))),
        }
    }

    /// The response served when nothing matches
    pub fn not_found() -> Response {
        Response::new(404)
    }

    pub fn protocol(mut self, protocol: &str) -> Response {
        self.protocol = protocol.to_string();
        self
    }

    pub fn header(mut self, line: &str) -> Response {
        self.headers.push(line.to_string());
        self
    }

    pub fn content<B: AsRef<[u8]>>(self, content: B) -> Response {
        *self.payload.lock() = Payload::new(Arc::from(content.as_ref()));
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Response {
        self.behavior = behavior;
        self
    }

    pub fn message_order(mut self, order: Order) -> Response {
        self.message_order = order;
        self
    }

    pub fn message(self, message: Message) -> Response {
        self.messages.lock().push_back(message);
        self
    }

    /// Reason phrase of the status code
    pub fn phrase(&self) -> &'static str {
        reason_phrase(self.code)
    }

    /// Full content, regardless of the cursor position
    pub fn content_bytes(&self) -> Vec<u8> {
        self.payload.lock().template().to_vec()
    }

    pub fn content_len(&self) -> usize {
        self.payload.lock().template().len()
    }

    /// True if this response switches the connection to websocket
    pub fn is_websocket(&self) -> bool {
        self.code == 101 && headers::is_websocket_upgrade(&self.headers)
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.lock().is_empty()
    }

    /// Next part of the body as configured by `behavior`
    ///
    /// Returns `None` once the content is exhausted, and re-arms so the next
    /// call starts from the beginning again.
    pub fn body(&self) -> Option<Vec<u8>> {
        let chunked = headers::expect_chunked_content(&self.headers);
        self.payload.lock().next(
            self.behavior.delay, self.behavior.chunk, chunked)
    }

    /// Moves the body cursor back to the start of the content
    pub fn rewind(&self) {
        self.payload.lock().rewind();
    }

    /// Messages to push to websockets after this response is served
    pub fn next_messages(&self) -> Vec<Message> {
        let mut messages = self.messages.lock();
        match self.message_order {
            Order::Sequential => match messages.pop_front() {
                Some(msg) => {
                    messages.push_back(msg.clone());
                    vec![msg]
                }
                None => Vec::new(),
            },
            Order::Random => {
                if messages.is_empty() {
                    return Vec::new();
                }
                let idx = thread_rng().gen_range(0..messages.len());
                vec![messages[idx].clone()]
            }
            Order::Batch => messages.iter().cloned().collect(),
        }
    }
}

impl Clone for Response {
    /// Clones configuration, the body cursor of the copy is rewound
    fn clone(&self) -> Response {
        let template = Arc::from(self.payload.lock().template());
        Response {
            code: self.code,
            protocol: self.protocol.clone(),
            headers: self.headers.clone(),
            behavior: self.behavior,
            message_order: self.message_order,
            messages: Mutex::new(self.messages.lock().clone()),
            payload: Mutex::new(Payload::new(template)),
        }
    }
}
