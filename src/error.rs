use std::io;

use native_tls;


quick_error! {
    /// Error starting the mock server
    ///
    /// The server is stopped when this is returned.
    #[derive(Debug)]
    pub enum StartError {
        /// Can't bind or listen on the port
        Bind(err: io::Error) {
            description("can't bind listening socket")
            display("can't bind listening socket: {}", err)
            cause(err)
        }
        /// Can't enable address reuse on the socket
        ReuseAddress(err: io::Error) {
            description("can't enable address reuse")
            display("can't enable address reuse: {}", err)
            cause(err)
        }
        /// PKCS#12 identity can't be read (corrupt data or wrong password)
        Identity(err: native_tls::Error) {
            description("can't load TLS identity")
            display("can't load TLS identity: {}", err)
            cause(err)
        }
        /// TLS context can't be built from the identity
        TlsContext(err: native_tls::Error) {
            description("can't create TLS context")
            display("can't create TLS context: {}", err)
            cause(err)
        }
        /// Accept thread can't be started
        Spawn(err: io::Error) {
            description("can't start accept thread")
            display("can't start accept thread: {}", err)
            cause(err)
        }
    }
}
