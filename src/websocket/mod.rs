//! Websocket support stuff
//!
//! Connections are upgraded by the server and then owned by a [`WebSocket`]
//! engine, which is looked up by the request path in the [`Registry`].

mod config;
mod connection;
mod dispatcher;
mod error;
mod keys;
mod queue;
mod reason;
mod registry;
mod scheduler;
pub mod frame;

pub use self::connection::{State, Transport, WebSocket};
pub use self::dispatcher::{BlackHole, Channel, Dispatcher, Incoming};
pub use self::error::Error;
pub use self::frame::Frame;
pub use self::keys::{Accept, GUID};
pub use self::reason::Reason;
pub use self::registry::Registry;


/// Fine-grained configuration of websocket connections
#[derive(Debug, Clone)]
pub struct Config {
    max_payload_size: u64,
}
