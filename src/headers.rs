//! Helpers over header lists
//!
//! Mock requests and responses keep their headers as raw `Name: Value`
//! lines, exactly as configured or as received. These helpers look up the
//! few headers that influence the protocol.

pub fn is_transfer_encoding(val: &str) -> bool {
    val.eq_ignore_ascii_case("Transfer-Encoding")
}

pub fn is_content_length(val: &str) -> bool {
    val.eq_ignore_ascii_case("Content-Length")
}

pub fn is_connection(val: &str) -> bool {
    val.eq_ignore_ascii_case("Connection")
}

pub fn is_upgrade(val: &str) -> bool {
    val.eq_ignore_ascii_case("Upgrade")
}

pub fn is_websocket_key(val: &str) -> bool {
    val.eq_ignore_ascii_case("Sec-WebSocket-Key")
}

pub fn is_websocket_accept(val: &str) -> bool {
    val.eq_ignore_ascii_case("Sec-WebSocket-Accept")
}

// header value is byte sequence
// we need case insensitive comparison and strip out of the whitespace
pub fn is_chunked(val: &[u8]) -> bool {
    if val.len() < "chunked".len() {
        return false;
    }
    let mut iter = val.iter();
    for (idx, &ch) in iter.by_ref().enumerate() {
        match ch {
            b'\r' | b'\n' | b' ' | b'\t' => continue,
            b'c' | b'C' => {
                if idx + "chunked".len() > val.len() {
                    return false;
                }
                break;
            }
            _ => return false,
        }
    }
    for (idx, ch) in iter.by_ref().take(6).enumerate() {
        if b"hunked"[idx] != ch.to_ascii_lowercase() {
            return false;
        }
    }
    for &ch in iter {
        if !matches!(ch, b'\r' | b'\n' | b' ' | b'\t') {
            return false;
        }
    }
    return true;
}

/// Splits a `Name: Value` line, both parts trimmed
pub fn split(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.splitn(2, ':');
    let name = parts.next()?.trim();
    let value = parts.next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Value of the last header accepted by `is_name`
pub fn find<'a, F>(headers: &'a [String], is_name: F) -> Option<&'a str>
    where F: Fn(&str) -> bool,
{
    headers.iter().rev()
        .filter_map(|line| split(line))
        .find(|&(name, _)| is_name(name))
        .map(|(_, value)| value)
}

/// Declared `Content-Length`, if there is a numeric one
pub fn content_length(headers: &[String]) -> Option<u64> {
    find(headers, is_content_length)
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|v| v.parse().ok())
}

/// Whether headers declare a chunked body
pub fn expect_chunked_content(headers: &[String]) -> bool {
    find(headers, is_transfer_encoding)
        .and_then(|v| v.split(',').last())
        .map(|enc| is_chunked(enc.as_bytes()))
        .unwrap_or(false)
}

/// The client's `Sec-WebSocket-Key`, if present and well-formed
pub fn websocket_key(headers: &[String]) -> Option<&str> {
    find(headers, is_websocket_key)
        .filter(|v| !v.is_empty())
        .filter(|v| v.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='
        }))
}

pub fn has_websocket_accept(headers: &[String]) -> bool {
    find(headers, is_websocket_accept).is_some()
}

/// Whether `Upgrade: websocket` and `Connection: upgrade` are both present
pub fn is_websocket_upgrade(headers: &[String]) -> bool {
    let upgrade = find(headers, is_upgrade)
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);
    let connection = find(headers, is_connection)
        .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case("upgrade")))
        .unwrap_or(false);
    upgrade && connection
}
