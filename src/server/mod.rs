//! The mock HTTP server
//!
//! Every accepted connection is served by its own thread: a single request
//! is read, answered with the configured response, and the connection is
//! closed. A response upgrading to websocket keeps the connection (and the
//! thread) until the websocket is closed.
use std::collections::HashMap;
use std::io::{self, BufReader, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use native_tls::{Identity, TlsAcceptor};
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::{json, Configuration, Message, Response};
use crate::error::StartError;
use crate::sync::Mutex;
use crate::websocket::{self, BlackHole, Dispatcher, Registry};

mod config;
mod error;
mod request;
mod response_writer;
mod stream;

pub use self::error::Error;
pub use self::request::Request;
pub use self::response_writer::{ResponseWriter, response_headers};
pub use self::response_writer::status_line;
pub use self::stream::Stream;


/// Fine-grained configuration of the mock server
#[derive(Debug, Clone)]
pub struct Config {
    accept_poll_interval: Duration,
    tls_poll_interval: Duration,
    websocket: Arc<websocket::Config>,
}

/// Programmable mock server
///
/// Responses are picked from the [`Configuration`], which may be changed
/// while the server runs.
pub struct MockServer {
    config: Arc<Config>,
    configuration: Arc<Configuration>,
    registry: Arc<Registry>,
    listener: Mutex<Option<Listener>>,
}

/// State of a started server
struct Listener {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    connections: Arc<Mutex<HashMap<u64, TcpStream>>>,
}

/// Everything a connection thread needs
struct Context {
    config: Arc<Config>,
    configuration: Arc<Configuration>,
    registry: Arc<Registry>,
    tls: Option<TlsAcceptor>,
    not_found: Arc<Response>,
}

impl MockServer {
    /// Server with default config, websocket messages are dropped
    pub fn new() -> MockServer {
        MockServer::with_dispatcher(&Config::new().done(), Arc::new(BlackHole))
    }

    /// Server delivering websocket messages to `dispatcher`
    pub fn with_dispatcher(config: &Arc<Config>,
                           dispatcher: Arc<dyn Dispatcher>)
        -> MockServer
    {
        MockServer {
            config: config.clone(),
            configuration: Arc::new(Configuration::new()),
            registry: Arc::new(Registry::new(&config.websocket, &dispatcher)),
            listener: Mutex::new(None),
        }
    }

    /// The live configuration, changes apply to subsequent requests
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn set_configuration(&self, configuration: &Configuration) {
        self.configuration.set_configuration(configuration);
    }

    pub fn add_configuration(&self, configuration: &Configuration) {
        self.configuration.add_configuration(configuration);
    }

    pub fn set_configuration_json<R: Read>(&self, reader: R)
        -> Result<(), json::Error>
    {
        let parsed = Configuration::from_json(reader)?;
        self.configuration.set_configuration(&parsed);
        Ok(())
    }

    pub fn add_configuration_json<R: Read>(&self, reader: R)
        -> Result<(), json::Error>
    {
        self.configuration.add_json(reader)
    }

    /// Pushes messages to the websocket connected on `path`
    pub fn send(&self, path: &str, messages: &[Message])
        -> Result<(), websocket::Error>
    {
        self.registry.send(path, messages)
    }

    /// Starts serving plain HTTP on `port`, zero picks a free port
    ///
    /// Does nothing if the server is running already.
    pub fn start(&self, port: u16) -> Result<(), StartError> {
        self.start_with(port, None)
    }

    /// Starts serving HTTPS with a PKCS#12 identity
    pub fn start_tls(&self, port: u16, pkcs12: &[u8], password: &str)
        -> Result<(), StartError>
    {
        if self.is_running() {
            return Ok(());
        }
        let identity = Identity::from_pkcs12(pkcs12, password)
            .map_err(StartError::Identity)?;
        let acceptor = TlsAcceptor::new(identity)
            .map_err(StartError::TlsContext)?;
        self.start_with(port, Some(acceptor))
    }

    fn start_with(&self, port: u16, tls: Option<TlsAcceptor>)
        -> Result<(), StartError>
    {
        let mut slot = self.listener.lock();
        if slot.as_ref().map_or(false, |l| l.is_running()) {
            return Ok(());
        }
        if let Some(old) = slot.take() {
            old.stop();
        }
        let listener = bind(port)?;
        let addr = listener.local_addr().map_err(StartError::Bind)?;
        let running = Arc::new(AtomicBool::new(true));
        let connections = Arc::new(Mutex::new(HashMap::new()));
        let context = Arc::new(Context {
            config: self.config.clone(),
            configuration: self.configuration.clone(),
            registry: self.registry.clone(),
            tls,
            not_found: Arc::new(Response::not_found()),
        });
        let thread = {
            let running = running.clone();
            let connections = connections.clone();
            thread::Builder::new()
                .name(format!("mock-accept {}", addr.port()))
                .spawn(move || {
                    accept_loop(listener, &running, &connections, &context)
                })
                .map_err(StartError::Spawn)?
        };
        info!("Mock server listening on {}", addr);
        *slot = Some(Listener {
            addr,
            running,
            thread: Some(thread),
            connections,
        });
        Ok(())
    }

    /// Stops accepting and closes all connections
    ///
    /// Safe to call in any state, any number of times.
    pub fn stop(&self) {
        let listener = self.listener.lock().take();
        self.registry.stop_all();
        if let Some(listener) = listener {
            let addr = listener.addr;
            listener.stop();
            info!("Mock server on {} stopped", addr);
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener.lock().as_ref().map_or(false, |l| l.is_running())
    }

    /// Bound address, `None` when not running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().as_ref()
            .filter(|l| l.is_running())
            .map(|l| l.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Listener {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Accept loop on {} panicked", self.addr);
            }
        }
        for (_, conn) in self.connections.lock().drain() {
            conn.shutdown(Shutdown::Both).ok();
        }
    }
}

fn bind(port: u16) -> Result<TcpListener, StartError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(StartError::Bind)?;
    if port != 0 {
        socket.set_reuse_address(true).map_err(StartError::ReuseAddress)?;
    }
    socket.bind(&addr.into()).map_err(StartError::Bind)?;
    socket.listen(128).map_err(StartError::Bind)?;
    socket.set_nonblocking(true).map_err(StartError::Bind)?;
    Ok(socket.into())
}

fn accept_loop(listener: TcpListener, running: &AtomicBool,
               connections: &Arc<Mutex<HashMap<u64, TcpStream>>>,
               context: &Arc<Context>)
{
    let mut next_id = 0u64;
    while running.load(Ordering::SeqCst) {
        let (sock, peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(context.config.accept_poll_interval);
                continue;
            }
            Err(e) => {
                error!("Error accepting connection: {}. Shutting down.", e);
                running.store(false, Ordering::SeqCst);
                break;
            }
        };
        if let Err(e) = sock.set_nonblocking(false) {
            error!("Can't configure connection from {}: {}", peer, e);
            continue;
        }
        let id = next_id;
        next_id += 1;
        match sock.try_clone() {
            Ok(tracked) => {
                connections.lock().insert(id, tracked);
            }
            Err(e) => {
                error!("Can't track connection from {}: {}", peer, e);
                continue;
            }
        }
        let ctx = context.clone();
        let conns = connections.clone();
        let spawned = thread::Builder::new()
            .name(format!("mock-conn {}", peer))
            .spawn(move || {
                if let Err(e) = serve(sock, &ctx) {
                    error!("Error serving {}: {}", peer, e);
                }
                if let Some(conn) = conns.lock().remove(&id) {
                    conn.shutdown(Shutdown::Both).ok();
                }
            });
        if let Err(e) = spawned {
            error!("Can't start connection thread for {}: {}", peer, e);
            if let Some(conn) = connections.lock().remove(&id) {
                conn.shutdown(Shutdown::Both).ok();
            }
        }
    }
    debug!("Accept loop finished");
}

/// Messages grouped by websocket path, paths in order of appearance
fn group_by_path(messages: Vec<Message>) -> Vec<(String, Vec<Message>)> {
    let mut groups: Vec<(String, Vec<Message>)> = Vec::new();
    for msg in messages {
        match groups.iter().position(|g| g.0 == msg.path) {
            Some(idx) => groups[idx].1.push(msg),
            None => groups.push((msg.path.clone(), vec![msg])),
        }
    }
    groups
}

fn serve(sock: TcpStream, context: &Context) -> Result<(), Error> {
    let stream = match context.tls {
        Some(ref acceptor) => Stream::accept_tls(acceptor, sock,
            context.config.tls_poll_interval)?,
        None => Stream::Plain(sock),
    };
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let request = Request::read_from(&mut reader)?;
    let response = match context.configuration.find_response(&request) {
        Some(response) => response,
        None => context.not_found.clone(),
    };
    info!("{} {} {} -> {}", request.verb, request.path, request.protocol,
        response.code);
    ResponseWriter::new(&mut writer).write(&response, &request)?;

    let messages = context.configuration.find_messages(&response);
    for (path, group) in group_by_path(messages) {
        context.registry.send(&path, &group)?;
    }
    if response.is_websocket() {
        if !request.is_websocket() {
            info!("{} upgraded without a websocket handshake", request.path);
        }
        reader.get_ref().disable_read_timeout()?;
        context.registry.start(&request.path, reader, Box::new(writer))?;
    }
    Ok(())
}
