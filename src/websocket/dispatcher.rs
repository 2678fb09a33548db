use std::sync::mpsc::{channel, Receiver, Sender};

use crate::sync::Mutex;


/// Receives complete messages assembled from websocket frames
pub trait Dispatcher: Send + Sync {
    /// A message received on the websocket started for `path`
    fn message(&self, path: &str, data: &[u8], is_text: bool);
}

/// A dispatcher which logs and drops all messages
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackHole;

/// A message as delivered by [`Channel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub path: String,
    pub data: Vec<u8>,
    pub is_text: bool,
}

/// A dispatcher forwarding messages to a `std::sync::mpsc` channel
#[derive(Debug)]
pub struct Channel {
    sender: Mutex<Sender<Incoming>>,
}

impl Dispatcher for BlackHole {
    fn message(&self, path: &str, data: &[u8], is_text: bool) {
        if is_text {
            info!("Websocket {} received: {}",
                path, String::from_utf8_lossy(data));
        } else {
            info!("Websocket {} received {} bytes", path, data.len());
        }
    }
}

impl Channel {
    pub fn new() -> (Channel, Receiver<Incoming>) {
        let (tx, rx) = channel();
        (Channel { sender: Mutex::new(tx) }, rx)
    }
}

impl Dispatcher for Channel {
    fn message(&self, path: &str, data: &[u8], is_text: bool) {
        let msg = Incoming {
            path: path.to_string(),
            data: data.to_vec(),
            is_text,
        };
        if self.sender.lock().send(msg).is_err() {
            debug!("Websocket {}: message receiver is gone", path);
        }
    }
}
