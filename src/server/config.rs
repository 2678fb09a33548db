use std::time::Duration;
use std::sync::Arc;

use crate::server::{Config};
use crate::websocket;

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            accept_poll_interval: Duration::from_millis(20),
            tls_poll_interval: Duration::from_millis(50),
            websocket: Arc::new(websocket::Config::new()),
        }
    }
    /// How long the accept loop sleeps when no connection is pending
    ///
    /// This is also the longest time `stop()` waits for the loop to notice.
    pub fn accept_poll_interval(&mut self, value: Duration) -> &mut Self {
        self.accept_poll_interval = value;
        self
    }
    /// Read timeout used internally by TLS connections
    ///
    /// A TLS session can't be read and written at the same time, so reads
    /// give up the session at this interval to let pending writes through.
    pub fn tls_poll_interval(&mut self, value: Duration) -> &mut Self {
        self.tls_poll_interval = value;
        self
    }
    /// Configuration of upgraded websocket connections
    pub fn websocket_config(&mut self, value: &Arc<websocket::Config>)
        -> &mut Self
    {
        self.websocket = value.clone();
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}
