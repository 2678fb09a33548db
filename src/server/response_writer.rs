use std::io::{self, Write};

use crate::config::Response;
use crate::headers;
use crate::server::Request;
use crate::websocket::Accept;


/// Writes a scripted response to a connection
///
/// Headers are computed once from the response and the request, then the
/// body is streamed part by part as the response behavior dictates.
pub struct ResponseWriter<'a, W: Write + 'a> {
    sink: &'a mut W,
}

/// Headers of the response to `request` with computed fields added
///
/// Existing headers are never replaced.
pub fn response_headers(response: &Response, request: &Request)
    -> Vec<String>
{
    let mut result = response.headers.clone();
    let behavior = &response.behavior;
    if behavior.calculate_content_length {
        let declared =
            headers::find(&result, headers::is_content_length).is_some() ||
            headers::expect_chunked_content(&result);
        let len = response.content_len();
        if !declared && len > 0 {
            result.push(format!("Content-Length: {}", len));
        }
    }
    if behavior.calculate_websocket_accept &&
        !headers::has_websocket_accept(&result)
    {
        if let Some(key) = request.websocket_key() {
            let accept = Accept::from_key_bytes(key.as_bytes());
            result.push(format!("Sec-WebSocket-Accept: {}", accept));
        }
    }
    result
}

/// `PROTOCOL CODE PHRASE` with whitespace collapsed
pub fn status_line(response: &Response) -> String {
    let line = format!("{} {} {}",
        response.protocol, response.code, response.phrase());
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a, W: Write> ResponseWriter<'a, W> {
    pub fn new(sink: &'a mut W) -> ResponseWriter<'a, W> {
        ResponseWriter { sink }
    }

    /// Writes status line, headers and the whole body
    ///
    /// Returns the number of body bytes written, framing excluded.
    pub fn write(&mut self, response: &Response, request: &Request)
        -> io::Result<usize>
    {
        let headers = response_headers(response, request);
        let chunked = headers::expect_chunked_content(&headers);
        let mut head = status_line(response);
        head.push_str("\r\n");
        for line in &headers {
            head.push_str(line.trim());
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        self.sink.write_all(head.as_bytes())?;
        self.sink.flush()?;

        self.write_body(response, chunked).map_err(|e| {
            // next client must get the whole body
            response.rewind();
            e
        })
    }

    fn write_body(&mut self, response: &Response, chunked: bool)
        -> io::Result<usize>
    {
        let mut total = 0;
        while let Some(part) = response.body() {
            self.sink.write_all(&part)?;
            if chunked {
                self.sink.write_all(b"\r\n")?;
            }
            self.sink.flush()?;
            total += part.len();
        }
        if chunked {
            self.sink.write_all(b"0\r\n\r\n")?;
            self.sink.flush()?;
        }
        Ok(total)
    }
}
