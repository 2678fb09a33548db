//! Programmable mock HTTP and websocket server
//!
//! The server answers every request with a response picked from a
//! [`Configuration`] of request patterns. Bodies may be delivered in random
//! parts with random delays, and responses may upgrade the connection to a
//! websocket with scripted messages.
//!
//! ```no_run
//! use tk_mock::{MockServer, Pattern, Response};
//!
//! let server = MockServer::new();
//! server.configuration()
//!     .add_response(Pattern::new("GET", "/ping"),
//!                   Response::new(200).content("pong"))
//!     .unwrap();
//! server.start(0).unwrap();
//! ```

#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate log;


pub mod config;
pub mod server;
pub mod websocket;
pub mod payload;
mod enums;
mod error;
mod headers;
mod chunked;
mod sync;

pub use config::{Configuration, Pattern, Response, Message, MessageType};
pub use config::{Behavior, Interval, Order};
pub use enums::{Status, reason_phrase};
pub use error::StartError;
pub use server::MockServer;
