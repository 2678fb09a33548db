use std::io::{self, BufRead, Read};

use httparse::{Status, parse_chunk_size};

use crate::server::Error;


/// Reads a whole chunked body from the stream, returning decoded bytes
///
/// Chunk extensions are ignored, trailer fields are read and dropped.
pub fn read_body<R: BufRead>(src: &mut R) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    let mut line = Vec::with_capacity(32);
    loop {
        read_line(src, &mut line)?;
        let size = match parse_chunk_size(&line)? {
            Status::Complete((_, size)) => size,
            Status::Partial => return Err(unexpected_eof().into()),
        };
        if size == 0 {
            break;
        }
        let before = body.len();
        src.by_ref().take(size).read_to_end(&mut body)?;
        if ((body.len() - before) as u64) < size {
            return Err(unexpected_eof().into());
        }
        read_line(src, &mut line)?;
        if line != b"\r\n" && line != b"\n" {
            return Err(Error::ChunkTerminator);
        }
    }
    // trailer section ends with an empty line
    loop {
        read_line(src, &mut line)?;
        if line == b"\r\n" || line == b"\n" {
            return Ok(body);
        }
    }
}

fn read_line<R: BufRead>(src: &mut R, line: &mut Vec<u8>)
    -> Result<(), Error>
{
    line.clear();
    if src.read_until(b'\n', line)? == 0 {
        return Err(unexpected_eof().into());
    }
    Ok(())
}

fn unexpected_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "chunked body is truncated")
}
