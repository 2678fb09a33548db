use std::io;


quick_error! {
    /// Websocket error
    #[derive(Debug)]
    pub enum Error {
        /// Socket IO error
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            from()
        }
        /// Got unmasked frame
        Unmasked {
            description("Received unmasked frame")
        }
        /// Frame is longer than we can read or write
        PayloadTooLarge(size: u64) {
            description("Frame payload is too large")
            display("Frame payload is too large: {} bytes", size)
        }
        /// The connection is shut down, or the queue it uses is closed
        Closed {
            description("Connection closed")
        }
    }
}

#[test]
fn send_sync() {
    fn send_sync<T: Send+Sync>(_: T) {}
    send_sync(Error::Closed);
}
