use std::io;

use httparse;
use native_tls;

use crate::websocket;


quick_error! {
    /// Error serving a single connection
    #[derive(Debug)]
    pub enum Error {
        /// Socket IO error
        Io(err: io::Error) {
            description("I/O error")
            display("I/O error: {}", err)
            from()
        }
        /// Connection closed before the request line
        EmptyRequest {
            description("empty request")
        }
        /// Request line isn't `VERB SP PATH SP PROTOCOL`
        BadRequestLine(line: String) {
            description("malformed request line")
            display("malformed request line: {:?}", line)
        }
        /// Content length header is invalid (non-integer, or > 64bit)
        ContentLengthInvalid {
            description("invalid content-length header")
        }
        /// Error parsing http chunk
        ChunkSize(err: httparse::InvalidChunkSize) {
            description("chunk size parse error")
            from()
        }
        /// Chunk data isn't followed by CRLF
        ChunkTerminator {
            description("chunk is not terminated by CRLF")
        }
        /// TLS handshake failed
        Tls(err: String) {
            description("TLS handshake error")
            display("TLS handshake error: {}", err)
        }
        /// Upgraded connection failed
        WebSocket(err: websocket::Error) {
            description("websocket error")
            display("websocket error: {}", err)
            from()
        }
    }
}

impl<S> From<native_tls::HandshakeError<S>> for Error {
    fn from(err: native_tls::HandshakeError<S>) -> Error {
        match err {
            native_tls::HandshakeError::Failure(e) => Error::Tls(e.to_string()),
            native_tls::HandshakeError::WouldBlock(_) => {
                Error::Tls("handshake interrupted".to_string())
            }
        }
    }
}
