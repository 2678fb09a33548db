use std::io::{self, Read};
use std::mem;
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Weak};
use std::thread;

use crate::config::{Message, MessageType};
use crate::sync::Mutex;
use crate::websocket::frame::{self, Frame, read_frame, write_frame};
use crate::websocket::frame::{FIN, OP_BINARY, OP_CLOSE, OP_CONTINUATION};
use crate::websocket::frame::{OP_PING, OP_PONG, OP_TEXT};
use crate::websocket::queue::Queue;
use crate::websocket::scheduler::Scheduler;
use crate::websocket::{Config, Dispatcher, Error, Reason};


/// Write half of an upgraded connection
pub trait Transport: io::Write + Send {
    /// Closes the connection, unblocking any pending reads
    fn close(&mut self);
}

impl Transport for TcpStream {
    fn close(&mut self) {
        self.shutdown(Shutdown::Both).ok();
    }
}

/// Lifecycle of a websocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    /// Close frame is sent, waiting for the peer to confirm
    Closing,
    Shutdown,
}

/// Websocket protocol engine for a single upgraded connection
///
/// The handle is cheap to clone. Messages may be sent before the connection
/// is started, they are queued until then.
#[derive(Clone)]
pub struct WebSocket {
    inner: Arc<Inner>,
}

struct Inner {
    path: String,
    config: Arc<Config>,
    dispatcher: Arc<dyn Dispatcher>,
    state: Mutex<State>,
    sink: Mutex<Option<Box<dyn Transport>>>,
    read_queue: Queue<Frame>,
    write_queue: Queue<Frame>,
    scheduler: Scheduler,
    /// Repeating heartbeats waiting for the peer to connect
    parked: Mutex<Vec<Message>>,
}

impl WebSocket {
    pub fn new(path: &str, config: &Arc<Config>,
               dispatcher: &Arc<dyn Dispatcher>)
        -> Result<WebSocket, Error>
    {
        let scheduler = Scheduler::new(&format!("ws-sched {}", path))?;
        Ok(WebSocket {
            inner: Arc::new(Inner {
                path: path.to_string(),
                config: config.clone(),
                dispatcher: dispatcher.clone(),
                state: Mutex::new(State::Idle),
                sink: Mutex::new(None),
                read_queue: Queue::new(),
                write_queue: Queue::new(),
                scheduler,
                parked: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn state(&self) -> State {
        *self.inner.state.lock()
    }

    /// True once closing has begun, the connection takes no new peers
    pub fn is_closing(&self) -> bool {
        match self.state() {
            State::Closing | State::Shutdown => true,
            State::Idle | State::Running => false,
        }
    }

    pub fn same(&self, other: &WebSocket) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Serves the connection, blocks until it's shut down
    ///
    /// Does nothing if the engine was started before. Reads must not time
    /// out on `source`.
    pub fn start<R: Read>(&self, mut source: R, sink: Box<dyn Transport>)
        -> Result<(), Error>
    {
        {
            let mut state = self.inner.state.lock();
            if *state != State::Idle {
                debug!("Websocket {} is already started", self.inner.path);
                return Ok(());
            }
            *state = State::Running;
        }
        *self.inner.sink.lock() = Some(sink);

        let assembly = self.inner.clone();
        let spawned = thread::Builder::new()
            .name(format!("ws-read {}", self.inner.path))
            .spawn(move || assembly.assemble());
        if let Err(e) = spawned {
            self.inner.shutdown();
            return Err(e.into());
        }
        let pump = self.inner.clone();
        let spawned = thread::Builder::new()
            .name(format!("ws-write {}", self.inner.path))
            .spawn(move || pump.pump());
        if let Err(e) = spawned {
            self.inner.shutdown();
            return Err(e.into());
        }
        let parked = mem::take(&mut *self.inner.parked.lock());
        for message in parked {
            Inner::schedule(&self.inner, message);
        }
        debug!("Websocket {} started", self.inner.path);
        self.inner.read_loop(&mut source);
        Ok(())
    }

    /// Schedules messages according to their delay and chunk settings
    pub fn send(&self, messages: &[Message]) {
        for message in messages {
            Inner::schedule(&self.inner, message.clone());
        }
    }

    /// Asks the peer to close the connection
    ///
    /// The close frame is written before any pending frames.
    pub fn stop(&self, reason: Reason) {
        let close = frame::close_reason(reason);
        if self.inner.write_queue.push_front(close).is_err() {
            debug!("Websocket {} is already closed", self.inner.path);
        }
    }

    /// Tears the connection down without a close handshake
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

fn frames(message: &Message) -> Vec<Frame> {
    let payload = message.payload().unwrap_or(&[]);
    let kind = message.kind.or_else(|| match message.data {
        Some(_) if message.text.is_none() => Some(MessageType::Data),
        _ => Some(MessageType::Text),
    });
    match kind {
        Some(MessageType::Ping) => vec![frame::ping(payload)],
        Some(MessageType::Pong) => vec![frame::pong(payload)],
        Some(MessageType::Close) => {
            let reason = message.text.as_ref().map(|t| &t[..]).unwrap_or("");
            vec![frame::close(message.code, reason)]
        }
        Some(MessageType::Data) => {
            frame::data_frames(payload, message.chunk.random_size())
        }
        Some(MessageType::Text) | None => {
            let text = String::from_utf8_lossy(payload);
            frame::text_frames(&text, message.chunk.random_size())
        }
    }
}

impl Inner {
    fn state(&self) -> State {
        *self.state.lock()
    }

    fn schedule(inner: &Arc<Inner>, message: Message) {
        let delay = message.delay.random_delay();
        let weak: Weak<Inner> = Arc::downgrade(inner);
        let scheduled = inner.scheduler.schedule(delay, move || {
            if let Some(inner) = weak.upgrade() {
                Inner::enqueue(&inner, message);
            }
        });
        if scheduled.is_err() {
            debug!("Websocket {} rejects new messages", inner.path);
            inner.shutdown();
        }
    }

    fn enqueue(inner: &Arc<Inner>, message: Message) {
        let heartbeat = match message.kind {
            Some(MessageType::Ping) | Some(MessageType::Pong) => true,
            _ => false,
        };
        let repeats = heartbeat && !message.delay.is_zero();
        if repeats {
            let state = inner.state.lock();
            if *state == State::Idle {
                debug!("Websocket {} holds {} until connected",
                    inner.path, message);
                inner.parked.lock().push(message);
                return;
            }
        }
        info!("Websocket {} sending: {}", inner.path, message);
        if inner.write_queue.extend(frames(&message)).is_err() {
            inner.shutdown();
            return;
        }
        if repeats {
            Inner::schedule(inner, message);
        }
    }

    fn read_loop<R: Read>(&self, source: &mut R) {
        while self.state() != State::Shutdown {
            match read_frame(source, self.config.max_payload_size) {
                Ok(frame) => {
                    trace!("Websocket {} got {:?}", self.path, frame);
                    if self.read_queue.push(frame).is_err() {
                        break;
                    }
                }
                Err(Error::Unmasked) => {
                    info!("Websocket {}: unmasked frame", self.path);
                    self.close(frame::close_reason(Reason::ProtocolError));
                    break;
                }
                Err(Error::PayloadTooLarge(size)) => {
                    info!("Websocket {}: frame of {} bytes is too large",
                        self.path, size);
                    self.close(frame::close_reason(Reason::MessageTooBig));
                    break;
                }
                Err(e) => {
                    debug!("Websocket {} read error: {}", self.path, e);
                    break;
                }
            }
        }
        self.shutdown();
    }

    fn assemble(&self) {
        let mut buffer = Vec::new();
        let mut is_text = false;
        while let Some(frame) = self.read_queue.take() {
            if frame.opcode() == OP_CLOSE {
                if self.state() == State::Closing {
                    self.shutdown();
                    break;
                }
                info!("Websocket {} closed by peer: {}", self.path,
                    frame::parse_close_reason(&frame).unwrap_or_default());
                self.close(Frame::new(FIN | OP_CLOSE, frame.payload));
                continue;
            }
            if self.state() == State::Closing {
                continue;
            }
            match frame.opcode() {
                OP_PONG => {
                    debug!("Websocket {} got pong", self.path);
                }
                OP_PING => {
                    let pong = frame::pong(&frame.payload);
                    if self.write_queue.push_front(pong).is_err() {
                        self.shutdown();
                        break;
                    }
                }
                OP_TEXT | OP_BINARY => {
                    is_text = frame.opcode() == OP_TEXT;
                    let fin = frame.is_fin();
                    buffer = frame.payload;
                    if fin {
                        self.deliver(mem::take(&mut buffer), is_text);
                    }
                }
                OP_CONTINUATION => {
                    buffer.extend_from_slice(&frame.payload);
                    if frame.is_fin() {
                        self.deliver(mem::take(&mut buffer), is_text);
                    }
                }
                op => {
                    debug!("Websocket {} ignores opcode {:#x}", self.path, op);
                }
            }
        }
    }

    fn deliver(&self, data: Vec<u8>, is_text: bool) {
        self.dispatcher.message(&self.path, &data, is_text);
    }

    fn pump(&self) {
        while let Some(frame) = self.write_queue.take() {
            if frame.is_close() {
                self.close(frame);
                break;
            }
            let written = match *self.sink.lock() {
                Some(ref mut sink) => write_frame(&frame, sink),
                None => Err(Error::Closed),
            };
            match written {
                Ok(()) => trace!("Websocket {} sent {:?}", self.path, frame),
                Err(Error::PayloadTooLarge(size)) => {
                    error!("Websocket {}: can't send frame of {} bytes",
                        self.path, size);
                    self.close(frame::close_reason(Reason::InternalError));
                    break;
                }
                Err(e) => {
                    debug!("Websocket {} write error: {}", self.path, e);
                    self.shutdown();
                    break;
                }
            }
        }
    }

    /// Writes the close frame right away and waits for the peer's echo
    fn close(&self, frame: Frame) {
        {
            let mut state = self.state.lock();
            match *state {
                State::Closing | State::Shutdown => return,
                State::Idle | State::Running => *state = State::Closing,
            }
        }
        let dropped = self.scheduler.pending() + self.write_queue.len();
        if dropped > 0 {
            debug!("Websocket {} drops {} unsent items", self.path, dropped);
        }
        self.scheduler.shutdown();
        self.write_queue.close();
        let written = match *self.sink.lock() {
            Some(ref mut sink) => write_frame(&frame, sink),
            None => Err(Error::Closed),
        };
        match written {
            Ok(()) => debug!("Websocket {} closing: {}", self.path,
                frame::parse_close_reason(&frame).unwrap_or_default()),
            Err(e) => {
                debug!("Websocket {} can't write close: {}", self.path, e);
                self.shutdown();
            }
        }
    }

    fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if *state == State::Shutdown {
                return;
            }
            *state = State::Shutdown;
        }
        self.scheduler.shutdown();
        self.read_queue.close();
        self.write_queue.close();
        let sink = self.sink.lock().take();
        if let Some(mut sink) = sink {
            sink.close();
        }
        debug!("Websocket {} shut down", self.path);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};
    use std::sync::Arc;
    use std::sync::mpsc::Receiver;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::{frames, State, Transport, WebSocket};
    use crate::config::{Interval, Message, MessageType};
    use crate::sync::{Condvar, Mutex};
    use crate::websocket::{Channel, Config, Dispatcher, Incoming, Reason};
    use crate::websocket::frame::{self, Frame};

    /// In-memory socket, reads block until data is fed or it's closed
    #[derive(Clone, Default)]
    struct Pipe(Arc<(Mutex<(VecDeque<u8>, bool)>, Condvar)>);

    #[derive(Clone, Default)]
    struct Sink {
        output: Arc<Mutex<Vec<u8>>>,
        input: Pipe,
    }

    impl Pipe {
        fn feed(&self, data: &[u8]) {
            (self.0).0.lock().0.extend(data);
            (self.0).1.notify_all();
        }
        fn close(&self) {
            (self.0).0.lock().1 = true;
            (self.0).1.notify_all();
        }
    }

    impl Read for Pipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut state = (self.0).0.lock();
            loop {
                if !state.0.is_empty() {
                    let n = buf.len().min(state.0.len());
                    for (dst, src) in buf.iter_mut().zip(state.0.drain(..n)) {
                        *dst = src;
                    }
                    return Ok(n);
                }
                if state.1 {
                    return Ok(0);
                }
                state = (self.0).1.wait(state);
            }
        }
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    impl Transport for Sink {
        fn close(&mut self) {
            self.input.close();
        }
    }

    fn masked(control: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![control, 0x80 | payload.len() as u8, 1, 2, 3, 4];
        buf.extend(payload.iter().enumerate()
            .map(|(i, b)| b ^ [1, 2, 3, 4][i % 4]));
        buf
    }

    fn engine(config: Arc<Config>) -> (WebSocket, Receiver<Incoming>) {
        let (chan, rx) = Channel::new();
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(chan);
        let ws = WebSocket::new("/ws", &config, &dispatcher).unwrap();
        (ws, rx)
    }

    fn run(ws: &WebSocket) -> (Sink, thread::JoinHandle<()>) {
        let sink = Sink::default();
        let source = sink.input.clone();
        let transport = sink.clone();
        let ws = ws.clone();
        let handle = thread::spawn(move || {
            ws.start(source, Box::new(transport)).unwrap();
        });
        (sink, handle)
    }

    /// Unmasked frames written by the engine so far
    fn written(sink: &Sink) -> Vec<Frame> {
        let data = sink.output.lock().clone();
        let mut frames = Vec::new();
        let mut pos = 0;
        while pos + 2 <= data.len() {
            let (len, start) = match data[pos + 1] {
                126 => (((data[pos + 2] as usize) << 8) |
                        data[pos + 3] as usize, pos + 4),
                len => (len as usize, pos + 2),
            };
            frames.push(Frame::new(data[pos],
                                   data[start..start + len].to_vec()));
            pos = start + len;
        }
        frames
    }

    fn wait_for<F: Fn() -> bool>(cond: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition is not met");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn assembles_fragments_and_answers_ping() {
        let (ws, rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        sink.input.feed(&masked(0x01, b"hel"));
        sink.input.feed(&masked(0x89, b"beat"));
        sink.input.feed(&masked(0x80, b"lo"));
        sink.input.feed(&masked(0x82, &[1, 2]));
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.data, b"hello");
        assert!(first.is_text);
        assert_eq!(first.path, "/ws");
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second.data, [1, 2]);
        assert!(!second.is_text);
        wait_for(|| !written(&sink).is_empty());
        let out = written(&sink);
        assert_eq!(out[0].control, 0x8A);
        assert_eq!(out[0].payload, b"beat");

        // end of input shuts the engine down
        sink.input.close();
        handle.join().unwrap();
        assert_eq!(ws.state(), State::Shutdown);
        assert!(ws.is_closing());
    }

    #[test]
    fn unmasked_frame_closes_with_protocol_error() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        sink.input.feed(&[0x81, 0x01, b'x']);
        handle.join().unwrap();
        let out = written(&sink);
        assert_eq!(out.len(), 1);
        assert_eq!(frame::parse_close_reason(&out[0]).unwrap(),
                   "1002 Protocol Error");
        assert_eq!(ws.state(), State::Shutdown);
    }

    #[test]
    fn oversized_frame_closes_with_message_too_big() {
        let (ws, _rx) = engine(Config::new().max_payload_size(4).done());
        let (sink, handle) = run(&ws);
        sink.input.feed(&masked(0x81, b"hello"));
        handle.join().unwrap();
        let out = written(&sink);
        assert_eq!(frame::parse_close_reason(&out[0]).unwrap(),
                   "1009 Message Too Big");
    }

    #[test]
    fn peer_close_is_echoed() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        let mut payload = 1000u16.to_be_bytes().to_vec();
        payload.extend_from_slice(b"bye");
        sink.input.feed(&masked(0x88, &payload));
        wait_for(|| !written(&sink).is_empty());
        let out = written(&sink);
        assert!(out[0].is_close());
        assert_eq!(out[0].payload, payload);
        assert_eq!(ws.state(), State::Closing);
        sink.input.close();
        handle.join().unwrap();
        assert_eq!(ws.state(), State::Shutdown);
    }

    #[test]
    fn stop_waits_for_peer_echo() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        ws.stop(Reason::GoingAway);
        wait_for(|| !written(&sink).is_empty());
        assert_eq!(frame::parse_close_reason(&written(&sink)[0]).unwrap(),
                   "1001 Going Away");
        assert_eq!(ws.state(), State::Closing);
        sink.input.feed(&masked(0x88, &1001u16.to_be_bytes()));
        handle.join().unwrap();
        assert_eq!(ws.state(), State::Shutdown);
        assert_eq!(written(&sink).len(), 1);
    }

    #[test]
    fn messages_queued_before_start() {
        let (ws, _rx) = engine(Config::new().done());
        ws.send(&[Message::text("/ws", "early"),
                  Message::data("/ws", &[7, 7])]);
        thread::sleep(Duration::from_millis(50));
        let (sink, handle) = run(&ws);
        wait_for(|| written(&sink).len() == 2);
        let out = written(&sink);
        assert_eq!(out[0].control, 0x81);
        assert_eq!(out[0].payload, b"early");
        assert_eq!(out[1].control, 0x82);
        ws.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn heartbeat_repeats() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        let mut ping = Message::of_type("/ws", MessageType::Ping);
        ping.delay = Interval::new(10, 10);
        ws.send(&[ping]);
        wait_for(|| written(&sink).len() >= 3);
        assert!(written(&sink).iter().all(|f| f.is_ping()));
        ws.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn zero_delay_heartbeat_is_sent_once() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        ws.send(&[Message::of_type("/ws", MessageType::Pong)]);
        wait_for(|| written(&sink).len() == 1);
        thread::sleep(Duration::from_millis(100));
        let out = written(&sink);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_pong());
        assert_eq!(ws.inner.scheduler.pending(), 0);
        ws.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn heartbeat_waits_for_connection() {
        let (ws, _rx) = engine(Config::new().done());
        let mut ping = Message::of_type("/ws", MessageType::Ping);
        ping.delay = Interval::new(10, 10);
        ws.send(&[ping]);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(ws.inner.write_queue.len(), 0);
        assert_eq!(ws.inner.scheduler.pending(), 0);
        assert_eq!(ws.inner.parked.lock().len(), 1);

        let (sink, handle) = run(&ws);
        wait_for(|| written(&sink).len() >= 2);
        assert!(written(&sink).iter().all(|f| f.is_ping()));
        ws.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn oversized_message_closes_with_internal_error() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        ws.send(&[Message::data("/ws", &vec![0u8; 70000])]);
        wait_for(|| !written(&sink).is_empty());
        let out = written(&sink);
        assert_eq!(out.len(), 1);
        assert_eq!(frame::parse_close_reason(&out[0]).unwrap(),
                   "1011 Internal Error");
        assert_eq!(ws.state(), State::Closing);
        sink.input.feed(&masked(0x88, &1011u16.to_be_bytes()));
        handle.join().unwrap();
        assert_eq!(ws.state(), State::Shutdown);
    }

    #[test]
    fn start_is_idempotent() {
        let (ws, _rx) = engine(Config::new().done());
        let (sink, handle) = run(&ws);
        wait_for(|| ws.state() == State::Running);
        // second start returns right away
        ws.start(Pipe::default(), Box::new(Sink::default())).unwrap();
        sink.input.close();
        handle.join().unwrap();
    }

    #[test]
    fn send_after_shutdown_is_silent() {
        let (ws, _rx) = engine(Config::new().done());
        ws.shutdown();
        ws.send(&[Message::text("/ws", "late")]);
        ws.stop(Reason::GoingAway);
        assert_eq!(ws.state(), State::Shutdown);
    }

    #[test]
    fn message_frames() {
        let mut text = Message::text("/ws", "hello");
        text.chunk = Interval::new(2, 2);
        let controls: Vec<u8> = frames(&text).iter()
            .map(|f| f.control).collect();
        assert_eq!(controls, [0x01, 0x00, 0x80]);

        let data = Message::data("/ws", &[1, 2, 3]);
        assert_eq!(frames(&data)[0].control, 0x82);

        let mut close = Message::of_type("/ws", MessageType::Close);
        close.code = Some(1000);
        close.text = Some("done".into());
        let out = frames(&close);
        assert_eq!(out.len(), 1);
        assert_eq!(frame::parse_close_reason(&out[0]).unwrap(), "1000 done");

        let ping = Message::of_type("/ws", MessageType::Ping);
        assert_eq!(frames(&ping)[0].control, 0x89);
    }
}
