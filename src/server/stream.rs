use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use native_tls::{HandshakeError, TlsAcceptor, TlsStream};

use crate::server::Error;
use crate::sync::Mutex;
use crate::websocket::Transport;


/// Accepted connection, plain or TLS
///
/// Clones share the connection, so one may read while another writes. TLS
/// state can't be split, so a TLS stream reads with a short socket timeout
/// and retries, releasing the session to writers in between.
pub enum Stream {
    Plain(TcpStream),
    Tls {
        session: Arc<Mutex<TlsStream<TcpStream>>>,
        socket: TcpStream,
    },
}

impl Stream {
    /// Runs the server side TLS handshake
    pub fn accept_tls(acceptor: &TlsAcceptor, socket: TcpStream,
                      poll_interval: Duration)
        -> Result<Stream, Error>
    {
        let control = socket.try_clone()?;
        let mut result = acceptor.accept(socket);
        let session = loop {
            match result {
                Ok(session) => break session,
                Err(HandshakeError::WouldBlock(mid)) => {
                    result = mid.handshake();
                }
                Err(e) => return Err(e.into()),
            }
        };
        control.set_read_timeout(Some(poll_interval))?;
        Ok(Stream::Tls {
            session: Arc::new(Mutex::new(session)),
            socket: control,
        })
    }

    pub fn try_clone(&self) -> io::Result<Stream> {
        match *self {
            Stream::Plain(ref sock) => Ok(Stream::Plain(sock.try_clone()?)),
            Stream::Tls { ref session, ref socket } => Ok(Stream::Tls {
                session: session.clone(),
                socket: socket.try_clone()?,
            }),
        }
    }

    fn socket(&self) -> &TcpStream {
        match *self {
            Stream::Plain(ref sock) => sock,
            Stream::Tls { ref socket, .. } => socket,
        }
    }

    /// Makes reads block until data or end of stream
    ///
    /// TLS streams keep polling internally, only timeouts visible to the
    /// reader are disabled.
    pub fn disable_read_timeout(&self) -> io::Result<()> {
        match *self {
            Stream::Plain(ref sock) => sock.set_read_timeout(None),
            Stream::Tls { .. } => Ok(()),
        }
    }

    pub fn shutdown(&self) {
        self.socket().shutdown(Shutdown::Both).ok();
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            Stream::Plain(ref mut sock) => sock.read(buf),
            Stream::Tls { ref session, .. } => loop {
                let result = session.lock().read(buf);
                match result {
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock ||
                                  e.kind() == io::ErrorKind::TimedOut
                        => thread::yield_now(),
                    result => return result,
                }
            },
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match *self {
            Stream::Plain(ref mut sock) => sock.write(buf),
            Stream::Tls { ref session, .. } => session.lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self {
            Stream::Plain(ref mut sock) => sock.flush(),
            Stream::Tls { ref session, .. } => session.lock().flush(),
        }
    }
}

impl Transport for Stream {
    fn close(&mut self) {
        self.shutdown();
    }
}
