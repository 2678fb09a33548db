use std::cmp::min;
use std::fmt;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::websocket::{Error, Reason};


pub const FIN: u8 = 0x80;
pub const OP_CONTINUATION: u8 = 0x0;
pub const OP_TEXT: u8 = 0x1;
pub const OP_BINARY: u8 = 0x2;
pub const OP_CLOSE: u8 = 0x8;
pub const OP_PING: u8 = 0x9;
pub const OP_PONG: u8 = 0xA;

/// Control frames can't carry more than this
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// Largest payload we can write (the 64-bit length form isn't written)
pub const MAX_WRITE_PAYLOAD: usize = 0xFFFF;

/// A single websocket frame
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// FIN bit, three reserved bits and the opcode
    pub control: u8,
    pub mask: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(control: u8, payload: Vec<u8>) -> Frame {
        Frame { control, mask: None, payload }
    }

    pub fn opcode(&self) -> u8 {
        self.control & 0x0F
    }

    pub fn is_fin(&self) -> bool {
        self.control & FIN != 0
    }

    pub fn is_text(&self) -> bool { self.opcode() == OP_TEXT }
    pub fn is_binary(&self) -> bool { self.opcode() == OP_BINARY }
    pub fn is_close(&self) -> bool { self.opcode() == OP_CLOSE }
    pub fn is_ping(&self) -> bool { self.opcode() == OP_PING }
    pub fn is_pong(&self) -> bool { self.opcode() == OP_PONG }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Frame")
            .field("control", &format_args!("{:#04x}", self.control))
            .field("masked", &self.mask.is_some())
            .field("len", &self.payload.len())
            .finish()
    }
}

/// Reads a single client frame and unmasks its payload
///
/// Payloads longer than `limit` are rejected before reading them.
pub fn read_frame<R: Read>(src: &mut R, limit: u64) -> Result<Frame, Error> {
    let mut head = [0u8; 2];
    src.read_exact(&mut head)?;
    if head[1] & 0x80 == 0 {
        return Err(Error::Unmasked);
    }
    let size = match head[1] & 0x7F {
        126 => src.read_u16::<BigEndian>()? as u64,
        127 => src.read_u64::<BigEndian>()?,
        size => size as u64,
    };
    if size > limit || size > usize::max_value() as u64 {
        return Err(Error::PayloadTooLarge(size));
    }
    let mut mask = [0u8; 4];
    src.read_exact(&mut mask)?;
    let mut payload = vec![0u8; size as usize];
    src.read_exact(&mut payload)?;
    for (idx, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[idx % 4];
    }
    Ok(Frame { control: head[0], mask: Some(mask), payload })
}

/// Writes a server frame, never masked
pub fn write_frame<W: Write>(frame: &Frame, sink: &mut W)
    -> Result<(), Error>
{
    let len = frame.payload.len();
    let mut buf = Vec::with_capacity(len + 4);
    buf.push(frame.control);
    match len {
        0..=125 => buf.push(len as u8),
        126..=MAX_WRITE_PAYLOAD => {
            buf.push(126);
            buf.write_u16::<BigEndian>(len as u16)?;
        }
        _ => return Err(Error::PayloadTooLarge(len as u64)),
    }
    buf.extend_from_slice(&frame.payload);
    sink.write_all(&buf)?;
    sink.flush()?;
    Ok(())
}

fn split(opcode: u8, payload: &[u8], size: usize) -> Vec<Frame> {
    let size = if size == 0 { payload.len().max(1) } else { size };
    if payload.len() <= size {
        return vec![Frame::new(FIN | opcode, payload.to_vec())];
    }
    let pieces: Vec<&[u8]> = payload.chunks(size).collect();
    let last = pieces.len() - 1;
    pieces.into_iter().enumerate().map(|(idx, piece)| {
        let control = match idx {
            0 => opcode,
            i if i == last => FIN | OP_CONTINUATION,
            _ => OP_CONTINUATION,
        };
        Frame::new(control, piece.to_vec())
    }).collect()
}

/// Text message split in frames of at most `size` bytes
pub fn text_frames(text: &str, size: usize) -> Vec<Frame> {
    split(OP_TEXT, text.as_bytes(), size)
}

/// Binary message split in frames of at most `size` bytes
pub fn data_frames(data: &[u8], size: usize) -> Vec<Frame> {
    split(OP_BINARY, data, size)
}

fn control(opcode: u8, payload: &[u8]) -> Frame {
    let len = min(payload.len(), MAX_CONTROL_PAYLOAD);
    Frame::new(FIN | opcode, payload[..len].to_vec())
}

pub fn ping(payload: &[u8]) -> Frame {
    control(OP_PING, payload)
}

pub fn pong(payload: &[u8]) -> Frame {
    control(OP_PONG, payload)
}

/// Close frame, the message is only included along with a code
pub fn close(code: Option<u16>, message: &str) -> Frame {
    let mut payload = Vec::new();
    if let Some(code) = code {
        payload.extend_from_slice(&code.to_be_bytes());
        payload.extend_from_slice(message.as_bytes());
    }
    control(OP_CLOSE, &payload)
}

pub fn close_reason(reason: Reason) -> Frame {
    close(Some(reason.code()), reason.message())
}

/// `"<code> <message>"` of a close frame carrying a code
pub fn parse_close_reason(frame: &Frame) -> Option<String> {
    if !frame.is_close() || frame.payload.len() < 2 {
        return None;
    }
    let code = u16::from_be_bytes([frame.payload[0], frame.payload[1]]);
    let message = String::from_utf8_lossy(&frame.payload[2..]);
    Some(format!("{} {}", code, message).trim().to_string())
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::websocket::{Error, Reason};

    fn masked(control: u8, payload: &[u8]) -> Vec<u8> {
        let mask = [0x37, 0xfa, 0x21, 0x3d];
        let mut buf = vec![control];
        match payload.len() {
            len @ 0..=125 => buf.push(0x80 | len as u8),
            len => {
                buf.push(0x80 | 126);
                buf.extend_from_slice(&(len as u16).to_be_bytes());
            }
        }
        buf.extend_from_slice(&mask);
        buf.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
        buf
    }

    #[test]
    fn read_masked_text() {
        // RFC6455 5.7 sample: masked "Hello"
        let data = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d,
                    0x7f, 0x9f, 0x4d, 0x51, 0x58];
        let frame = read_frame(&mut Cursor::new(&data[..]), 1000).unwrap();
        assert!(frame.is_fin());
        assert!(frame.is_text());
        assert_eq!(frame.mask, Some([0x37, 0xfa, 0x21, 0x3d]));
        assert_eq!(frame.payload, b"Hello");
    }

    #[test]
    fn read_extended_length() {
        let payload = vec![b'z'; 300];
        let data = masked(FIN | OP_BINARY, &payload);
        let frame = read_frame(&mut Cursor::new(data), 1000).unwrap();
        assert!(frame.is_binary());
        assert_eq!(frame.payload, payload);
    }

    #[test]
    fn written_frame_reads_back() {
        let mut buf = Vec::new();
        write_frame(&text_frames("hi there", 0)[0], &mut buf).unwrap();
        assert_eq!(buf, b"\x81\x08hi there");
        // add a mask bit and a zero mask to read it as a client frame
        let mut client = vec![buf[0], buf[1] | 0x80, 0, 0, 0, 0];
        client.extend_from_slice(&buf[2..]);
        let frame = read_frame(&mut Cursor::new(client), 1000).unwrap();
        assert_eq!(frame.control, FIN | OP_TEXT);
        assert_eq!(frame.payload, b"hi there");
    }

    #[test]
    fn write_16bit_length() {
        let mut buf = Vec::new();
        write_frame(&Frame::new(FIN | OP_BINARY, vec![1; 256]), &mut buf)
            .unwrap();
        assert_eq!(&buf[..4], &[0x82, 126, 1, 0]);
        assert_eq!(buf.len(), 260);
    }

    #[test]
    fn write_too_large() {
        let mut buf = Vec::new();
        let frame = Frame::new(FIN | OP_BINARY, vec![0; 0x10000]);
        match write_frame(&frame, &mut buf) {
            Err(Error::PayloadTooLarge(0x10000)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn unmasked_rejected() {
        let data = [0x81, 0x02, b'h', b'i'];
        match read_frame(&mut Cursor::new(&data[..]), 1000) {
            Err(Error::Unmasked) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn huge_length_rejected() {
        let data = [0x82, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        match read_frame(&mut Cursor::new(&data[..]),
                         i32::max_value() as u64) {
            Err(Error::PayloadTooLarge(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn limit_enforced() {
        let data = masked(FIN | OP_TEXT, b"hello");
        match read_frame(&mut Cursor::new(data), 4) {
            Err(Error::PayloadTooLarge(5)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_frame() {
        let mut data = masked(FIN | OP_TEXT, b"hello");
        data.truncate(8);
        match read_frame(&mut Cursor::new(data), 1000) {
            Err(Error::Io(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fragmentation() {
        let frames = text_frames("hello", 2);
        let controls: Vec<u8> = frames.iter().map(|f| f.control).collect();
        assert_eq!(controls, [0x01, 0x00, 0x80]);
        let payloads: Vec<&[u8]> = frames.iter()
            .map(|f| &f.payload[..]).collect();
        assert_eq!(payloads, [&b"he"[..], &b"ll"[..], &b"o"[..]]);

        let frames = data_frames(&[1, 2, 3, 4], 2);
        let controls: Vec<u8> = frames.iter().map(|f| f.control).collect();
        assert_eq!(controls, [0x02, 0x80]);

        let single = data_frames(&[1, 2, 3], usize::max_value());
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].control, 0x82);

        let empty = text_frames("", 10);
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].control, 0x81);
    }

    #[test]
    fn control_frames() {
        let big = vec![b'p'; 200];
        let frame = ping(&big);
        assert_eq!(frame.control, 0x89);
        assert_eq!(frame.payload.len(), MAX_CONTROL_PAYLOAD);
        assert_eq!(pong(b"abc").control, 0x8A);
        assert_eq!(pong(b"abc").payload, b"abc");
    }

    #[test]
    fn close_frames() {
        let bare = close(None, "ignored");
        assert_eq!(bare.control, 0x88);
        assert!(bare.payload.is_empty());
        assert_eq!(parse_close_reason(&bare), None);

        let coded = close(Some(1000), "bye");
        assert_eq!(coded.payload, b"\x03\xe8bye");
        assert_eq!(parse_close_reason(&coded).unwrap(), "1000 bye");

        let reason = close_reason(Reason::GoingAway);
        assert_eq!(parse_close_reason(&reason).unwrap(), "1001 Going Away");
        assert_eq!(parse_close_reason(&close(Some(1005), "")).unwrap(),
                   "1005");
        assert_eq!(parse_close_reason(&ping(b"12")), None);
    }
}
