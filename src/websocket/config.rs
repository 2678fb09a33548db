use std::sync::Arc;

use crate::websocket::{Config};

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            max_payload_size: i32::max_value() as u64,
        }
    }

    /// Maximum payload size of an incoming frame
    ///
    /// If some frame declares size larger than this, we send a "message too
    /// big" close frame and shut the connection down.
    pub fn max_payload_size(&mut self, size: u64) -> &mut Self {
        self.max_payload_size = size;
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
