use std::io::{BufRead, Read};

use crate::chunked;
use crate::headers;
use crate::server::Error;


/// Intercepted HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: String,
    pub path: String,
    pub protocol: String,
    /// Raw `Name: Value` lines in the order received
    pub headers: Vec<String>,
    pub content: Vec<u8>,
}

impl Request {
    pub fn new(verb: &str, path: &str, protocol: &str) -> Request {
        Request {
            verb: verb.to_string(),
            path: path.to_string(),
            protocol: protocol.to_string(),
            headers: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn header(mut self, line: &str) -> Request {
        self.headers.push(line.to_string());
        self
    }

    /// Reads request line, headers and body from the stream
    ///
    /// A chunked body takes precedence over `Content-Length`. Without either
    /// the body is empty.
    pub fn read_from<R: BufRead>(src: &mut R) -> Result<Request, Error> {
        let line = read_line(src)?.ok_or(Error::EmptyRequest)?;
        if line.is_empty() {
            return Err(Error::EmptyRequest);
        }
        let mut parts = line.splitn(3, ' ');
        let (verb, path, protocol) = match
            (parts.next(), parts.next(), parts.next())
        {
            (Some(v), Some(p), Some(pr)) if !v.is_empty() && !p.is_empty()
                => (v, p, pr.trim()),
            _ => return Err(Error::BadRequestLine(line.clone())),
        };
        let mut request = Request::new(verb, path, protocol);
        loop {
            match read_line(src)? {
                Some(ref h) if h.is_empty() => break,
                Some(h) => request.headers.push(h),
                None => break,
            }
        }
        if headers::expect_chunked_content(&request.headers) {
            request.content = chunked::read_body(src)?;
        } else if let Some(len) = headers::content_length(&request.headers) {
            src.by_ref().take(len).read_to_end(&mut request.content)?;
            if (request.content.len() as u64) < len {
                return Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
        } else if headers::find(&request.headers,
                                headers::is_content_length).is_some()
        {
            return Err(Error::ContentLengthInvalid);
        }
        Ok(request)
    }

    /// True for `GET` requests asking for a websocket upgrade
    pub fn is_websocket(&self) -> bool {
        self.verb == "GET" &&
            self.websocket_key().is_some() &&
            headers::is_websocket_upgrade(&self.headers)
    }

    pub fn websocket_key(&self) -> Option<&str> {
        headers::websocket_key(&self.headers)
    }
}

/// Reads one line without its line terminator, `None` on end of stream
fn read_line<R: BufRead>(src: &mut R) -> Result<Option<String>, Error> {
    let mut buf = Vec::new();
    if src.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    while buf.last().map_or(false, |&b| b == b'\n' || b == b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
