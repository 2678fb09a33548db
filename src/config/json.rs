//! Loads a [`Configuration`] from a JSON document
//!
//! ```json
//! {"requests": [{
//!     "verb": "GET", "path": "/ping", "protocol": "HTTP/1.1",
//!     "headers": ["Accept: text/plain"],
//!     "responseOrder": "SEQUENTIAL",
//!     "responses": [{
//!         "code": 200, "headers": ["Content-Type: text/plain"],
//!         "content": "pong",
//!         "behavior": {"chunk": [1, 16], "delay": [0, 10]},
//!         "messageOrder": "BATCH",
//!         "messages": [{"type": "TEXT", "path": "/ws", "text": "hi"}]
//!     }]
//! }]}
//! ```
use std::io::{self, Read};

use serde::Deserialize;

use crate::config::{Behavior, Configuration, Interval, Message};
use crate::config::{MessageType, Order, Pattern, Response};


quick_error! {
    /// Error loading a JSON configuration
    #[derive(Debug)]
    pub enum Error {
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            from()
        }
        Json(err: serde_json::Error) {
            description("invalid configuration document")
            display("invalid configuration document: {}", err)
            from()
        }
        InvalidHex(value: String) {
            description("invalid hex data")
            display("invalid hex data: {:?}", value)
        }
        InvalidRegex(err: regex::Error) {
            description("invalid pattern regex")
            display("invalid pattern regex: {}", err)
            from()
        }
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    requests: Vec<RequestEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all="camelCase")]
struct RequestEntry {
    verb: Option<String>,
    path: Option<String>,
    protocol: Option<String>,
    #[serde(default)]
    headers: Vec<String>,
    response_order: Option<String>,
    #[serde(default)]
    responses: Vec<ResponseEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all="camelCase")]
struct ResponseEntry {
    code: Option<u16>,
    protocol: Option<String>,
    #[serde(default)]
    headers: Vec<String>,
    content: Option<String>,
    behavior: Option<BehaviorEntry>,
    message_order: Option<String>,
    #[serde(default)]
    messages: Vec<MessageEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all="camelCase")]
struct BehaviorEntry {
    chunk: Option<[u64; 2]>,
    delay: Option<[u64; 2]>,
    calculate_content_length_if_absent: Option<bool>,
    calculate_sec_web_socket_accept_if_absent: Option<bool>,
}

#[derive(Deserialize)]
struct MessageEntry {
    #[serde(rename="type")]
    kind: Option<String>,
    path: Option<String>,
    text: Option<String>,
    data: Option<String>,
    code: Option<u16>,
    chunk: Option<[u64; 2]>,
    delay: Option<[u64; 2]>,
}

fn interval(pair: Option<[u64; 2]>) -> Interval {
    pair.map(|[start, end]| Interval::new(start, end))
        .unwrap_or_else(Interval::zero)
}

/// Decodes hex data, `0x` prefix is optional
pub fn decode_hex(value: &str) -> Result<Vec<u8>, Error> {
    let digits = value.strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.len() % 2 != 0 ||
        !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(Error::InvalidHex(value.to_string()));
    }
    (0..digits.len()).step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i+2], 16)
            .map_err(|_| Error::InvalidHex(value.to_string())))
        .collect()
}

impl MessageEntry {
    fn into_message(self) -> Result<Message, Error> {
        Ok(Message {
            path: self.path.unwrap_or_default(),
            text: self.text,
            data: match self.data {
                Some(ref hex) => Some(decode_hex(hex)?),
                None => None,
            },
            kind: self.kind.as_ref().and_then(|k| MessageType::from_name(k)),
            code: self.code,
            delay: interval(self.delay),
            chunk: interval(self.chunk),
        })
    }
}

impl ResponseEntry {
    fn into_response(self) -> Result<Response, Error> {
        let mut behavior = Behavior::default();
        if let Some(b) = self.behavior {
            behavior.chunk = interval(b.chunk);
            behavior.delay = interval(b.delay);
            if let Some(flag) = b.calculate_content_length_if_absent {
                behavior.calculate_content_length = flag;
            }
            if let Some(flag) = b.calculate_sec_web_socket_accept_if_absent {
                behavior.calculate_websocket_accept = flag;
            }
        }
        let order = self.message_order.as_ref()
            .map(|o| Order::from_name(o))
            .unwrap_or_default();
        let mut response = Response::new(self.code.unwrap_or(200))
            .behavior(behavior)
            .message_order(order)
            .content(self.content.unwrap_or_default());
        if let Some(protocol) = self.protocol {
            response = response.protocol(&protocol);
        }
        response.headers = self.headers;
        for msg in self.messages {
            response = response.message(msg.into_message()?);
        }
        Ok(response)
    }
}

impl RequestEntry {
    fn pattern(&self) -> Pattern {
        let mut pattern = Pattern::default();
        if let Some(ref verb) = self.verb {
            pattern.verb = verb.clone();
        }
        if let Some(ref path) = self.path {
            pattern.path = path.clone();
        }
        if let Some(ref protocol) = self.protocol {
            pattern.protocol = protocol.clone();
        }
        if let Some(ref order) = self.response_order {
            pattern.response_order = Order::from_name(order);
        }
        pattern.headers = self.headers.clone();
        pattern
    }
}

impl Configuration {
    /// Reads a whole configuration document
    pub fn from_json<R: Read>(reader: R) -> Result<Configuration, Error> {
        let cfg = Configuration::new();
        cfg.add_json(reader)?;
        Ok(cfg)
    }

    /// Adds all patterns of the document to this configuration
    ///
    /// Nothing is added if the document is invalid.
    pub fn add_json<R: Read>(&self, reader: R) -> Result<(), Error> {
        let doc: Document = serde_json::from_reader(reader)?;
        let parsed = Configuration::new();
        for entry in doc.requests {
            let pattern = entry.pattern();
            for resp in entry.responses {
                parsed.add_response(pattern.clone(), resp.into_response()?)?;
            }
        }
        debug!("Loaded {} request patterns", parsed.patterns().len());
        self.add_configuration(&parsed);
        Ok(())
    }
}
