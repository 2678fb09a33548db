use regex::Regex;

use crate::server::Request;


/// Order in which responses of a pattern, or messages of a response, are
/// served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// One at a time, rotating through the list
    Sequential,
    /// One uniformly random element per call
    Random,
    /// All messages at once (not applicable to responses)
    Batch,
}

/// Describes which intercepted requests a set of responses is served for
///
/// `verb`, `path` and `protocol` are regular expressions which must match the
/// whole corresponding request field. Every entry of `headers` must be
/// present in the request, the request may carry more.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub verb: String,
    pub path: String,
    pub protocol: String,
    pub response_order: Order,
    pub headers: Vec<String>,
}

/// Compiled form of a `Pattern`
#[derive(Debug)]
pub struct Matcher {
    verb: Regex,
    path: Regex,
    protocol: Regex,
    headers: Vec<String>,
}

impl Order {
    /// Parses the configuration name of an order
    ///
    /// Anything unknown is `Sequential`.
    pub fn from_name(name: &str) -> Order {
        match name {
            "RANDOM" => Order::Random,
            "BATCH" => Order::Batch,
            _ => Order::Sequential,
        }
    }
}

impl Default for Order {
    fn default() -> Order {
        Order::Sequential
    }
}

impl Pattern {
    /// Pattern matching `verb` requests to paths matching `path`
    pub fn new(verb: &str, path: &str) -> Pattern {
        Pattern {
            verb: verb.to_string(),
            path: path.to_string(),
            .. Pattern::default()
        }
    }

    pub fn header(mut self, line: &str) -> Pattern {
        self.headers.push(line.to_string());
        self
    }

    pub fn response_order(mut self, order: Order) -> Pattern {
        self.response_order = order;
        self
    }
}

impl Default for Pattern {
    fn default() -> Pattern {
        Pattern {
            verb: "GET".to_string(),
            path: "/.*".to_string(),
            protocol: "HTTP/1.1".to_string(),
            response_order: Order::Sequential,
            headers: Vec::new(),
        }
    }
}

fn whole(expr: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", expr))
}

impl Matcher {
    pub fn new(pattern: &Pattern) -> Result<Matcher, regex::Error> {
        Ok(Matcher {
            verb: whole(&pattern.verb)?,
            path: whole(&pattern.path)?,
            protocol: whole(&pattern.protocol)?,
            headers: pattern.headers.clone(),
        })
    }

    pub fn matches(&self, request: &Request) -> bool {
        self.verb.is_match(&request.verb) &&
        self.path.is_match(&request.path) &&
        self.protocol.is_match(&request.protocol) &&
        self.headers.iter().all(|expected| {
            request.headers.iter().any(|h| h.contains(expected.as_str()))
        })
    }
}
