use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::config::Message;
use crate::sync::Mutex;
use crate::websocket::{Config, Dispatcher, Error, Reason};
use crate::websocket::{State, Transport, WebSocket};


/// Websocket connections by the path they were upgraded on
///
/// A connection which is shut down is never reused, the next lookup for its
/// key creates a fresh one.
pub struct Registry {
    config: Arc<Config>,
    dispatcher: Arc<dyn Dispatcher>,
    sockets: Mutex<HashMap<String, WebSocket>>,
}

/// Running connections get a close handshake, others have no peer to
/// talk to and are torn down
fn close(ws: &WebSocket) {
    if ws.state() == State::Running {
        ws.stop(Reason::GoingAway);
    } else {
        ws.shutdown();
    }
}

impl Registry {
    pub fn new(config: &Arc<Config>, dispatcher: &Arc<dyn Dispatcher>)
        -> Registry
    {
        Registry {
            config: config.clone(),
            dispatcher: dispatcher.clone(),
            sockets: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_create(&self, key: &str) -> Result<WebSocket, Error> {
        let mut sockets = self.sockets.lock();
        if let Some(ws) = sockets.get(key) {
            if !ws.is_closing() {
                return Ok(ws.clone());
            }
        }
        // a closing connection finishes its handshake on its own thread
        let ws = WebSocket::new(key, &self.config, &self.dispatcher)?;
        sockets.insert(key.to_string(), ws.clone());
        Ok(ws)
    }

    /// Serves the upgraded connection for `key`, blocks until it's closed
    pub fn start<R: Read>(&self, key: &str, source: R,
                          sink: Box<dyn Transport>)
        -> Result<(), Error>
    {
        let ws = self.get_or_create(key)?;
        let result = ws.start(source, sink);
        let mut sockets = self.sockets.lock();
        let finished = sockets.get(key)
            .map(|cur| cur.same(&ws) && cur.is_closing())
            .unwrap_or(false);
        if finished {
            sockets.remove(key);
        }
        result
    }

    /// Sends messages to the connection for `key`
    ///
    /// If nothing is connected yet, messages wait for the connection.
    pub fn send(&self, key: &str, messages: &[Message]) -> Result<(), Error> {
        self.get_or_create(key)?.send(messages);
        Ok(())
    }

    /// Closes the connection for `key`, if any
    pub fn stop(&self, key: &str) {
        let removed = self.sockets.lock().remove(key);
        if let Some(ws) = removed {
            close(&ws);
        }
    }

    /// Closes all connections
    pub fn stop_all(&self) {
        let sockets: Vec<_> = self.sockets.lock().drain()
            .map(|(_, ws)| ws).collect();
        for ws in sockets {
            close(&ws);
        }
    }

    pub fn len(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sockets.lock().get(key).map_or(false, |ws| !ws.is_closing())
    }
}
