use std::fmt;

use crate::config::Interval;


/// Kind of websocket message to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Data,
    Ping,
    Pong,
    Close,
}

/// A scripted outbound websocket message
///
/// `path` selects the websocket connection (the request path it was
/// upgraded on) the message is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub path: String,
    pub text: Option<String>,
    pub data: Option<Vec<u8>>,
    pub kind: Option<MessageType>,
    /// Close code, only used by close messages
    pub code: Option<u16>,
    /// Random delay in milliseconds before sending
    pub delay: Interval,
    /// Random maximum frame size in bytes
    pub chunk: Interval,
}

impl MessageType {
    /// Case-insensitive lookup of a configuration name
    pub fn from_name(name: &str) -> Option<MessageType> {
        let all = [
            ("text", MessageType::Text),
            ("data", MessageType::Data),
            ("ping", MessageType::Ping),
            ("pong", MessageType::Pong),
            ("close", MessageType::Close),
        ];
        all.iter()
            .find(|&&(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }
}

impl Message {
    pub fn text(path: &str, text: &str) -> Message {
        Message {
            path: path.to_string(),
            text: Some(text.to_string()),
            kind: Some(MessageType::Text),
            .. Message::default()
        }
    }

    pub fn data(path: &str, data: &[u8]) -> Message {
        Message {
            path: path.to_string(),
            data: Some(data.to_vec()),
            kind: Some(MessageType::Data),
            .. Message::default()
        }
    }

    pub fn of_type(path: &str, kind: MessageType) -> Message {
        Message {
            path: path.to_string(),
            kind: Some(kind),
            .. Message::default()
        }
    }

    /// The payload of the message, text takes precedence over data
    pub fn payload(&self) -> Option<&[u8]> {
        match self.text {
            Some(ref text) => Some(text.as_bytes()),
            None => self.data.as_ref().map(|d| &d[..]),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref text) = self.text {
            return f.write_str(text);
        }
        if let Some(ref data) = self.data {
            f.write_str("[hex=")?;
            for b in data {
                write!(f, "{:02x}", b)?;
            }
            return f.write_str("]");
        }
        match self.kind {
            Some(kind) => write!(f, "{:?}", kind),
            None => Ok(()),
        }
    }
}
