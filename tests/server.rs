extern crate env_logger;
extern crate native_tls;
extern crate tk_mock;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::str::from_utf8;
use std::time::Duration;

use tk_mock::{Behavior, Configuration, Interval, MockServer};
use tk_mock::{Order, Pattern, Response, StartError};


fn started(server: &MockServer) -> SocketAddr {
    let _ = env_logger::builder().is_test(true).try_init();
    server.start(0).unwrap();
    let port = server.local_addr().unwrap().port();
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut sock = TcpStream::connect(addr).unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    sock.write_all(request).unwrap();
    let mut buf = Vec::new();
    sock.read_to_end(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

fn get(addr: SocketAddr, path: &str) -> String {
    exchange(addr, format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n",
                           path).as_bytes())
}

fn split_head(response: &str) -> (Vec<&str>, &str) {
    let idx = response.find("\r\n\r\n").expect("end of headers");
    (response[..idx].split("\r\n").collect(), &response[idx+4..])
}

#[test]
fn ping_and_not_found() {
    let server = MockServer::new();
    server.configuration()
        .add_response(Pattern::new("GET", "/ping"),
                      Response::new(200).content("pong"))
        .unwrap();
    let addr = started(&server);

    let (head, body) = {
        let resp = get(addr, "/ping");
        let (head, body) = split_head(&resp);
        (head.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
         body.to_string())
    };
    assert_eq!(head, ["HTTP/1.1 200 OK", "Content-Length: 4"]);
    assert_eq!(body, "pong");

    let missing = get(addr, "/missing");
    assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\n"), "{}", missing);
    server.stop();
}

#[test]
fn sequential_responses_rotate() {
    let server = MockServer::new();
    let pattern = Pattern::new("GET", "/rot");
    server.configuration()
        .add_response(pattern.clone(), Response::new(200).content("A"))
        .unwrap();
    server.configuration()
        .add_response(pattern, Response::new(201).content("B"))
        .unwrap();
    let addr = started(&server);
    let bodies: Vec<String> = (0..3)
        .map(|_| split_head(&get(addr, "/rot")).1.to_string())
        .collect();
    assert_eq!(bodies, ["A", "B", "A"]);
}

#[test]
fn random_responses() {
    let server = MockServer::new();
    let pattern = Pattern::new("GET", "/rnd").response_order(Order::Random);
    server.configuration()
        .add_response(pattern.clone(), Response::new(200)).unwrap();
    server.configuration()
        .add_response(pattern, Response::new(202)).unwrap();
    let addr = started(&server);
    for _ in 0..10 {
        let resp = get(addr, "/rnd");
        assert!(resp.starts_with("HTTP/1.1 200") ||
                resp.starts_with("HTTP/1.1 202"), "{}", resp);
    }
}

#[test]
fn declared_length_is_kept() {
    let server = MockServer::new();
    server.configuration()
        .add_response(Pattern::new("GET", "/len"),
            Response::new(200).header("Content-Length: 1").content("longer"))
        .unwrap();
    let addr = started(&server);
    let resp = get(addr, "/len");
    let (head, _) = split_head(&resp);
    assert_eq!(head, ["HTTP/1.1 200 OK", "Content-Length: 1"]);
}

#[test]
fn chunked_delayed_body() {
    let server = MockServer::new();
    let mut behavior = Behavior::default();
    behavior.chunk = Interval::new(1, 4);
    behavior.delay = Interval::new(1, 5);
    let content = "The quick brown fox jumps over the lazy dog";
    server.configuration()
        .add_response(Pattern::new("GET", "/chunked"),
            Response::new(200)
                .header("Transfer-Encoding: chunked")
                .behavior(behavior)
                .content(content))
        .unwrap();
    let addr = started(&server);
    let resp = get(addr, "/chunked");
    let (head, mut body) = split_head(&resp);
    assert_eq!(head, ["HTTP/1.1 200 OK", "Transfer-Encoding: chunked"]);

    let mut decoded = String::new();
    loop {
        let eol = body.find("\r\n").unwrap();
        let size = usize::from_str_radix(&body[..eol], 16).unwrap();
        body = &body[eol+2..];
        if size == 0 {
            assert_eq!(body, "\r\n");
            break;
        }
        assert!(size >= 1 && size <= 4);
        decoded.push_str(&body[..size]);
        assert_eq!(&body[size..size+2], "\r\n");
        body = &body[size+2..];
    }
    assert_eq!(decoded, content);
}

#[test]
fn request_body_and_headers() {
    let server = MockServer::new();
    server.configuration()
        .add_response(Pattern::new("POST", "/items/\\d+")
                        .header("X-Token: secret"),
                      Response::new(201).content("created"))
        .unwrap();
    let addr = started(&server);

    let chunked = exchange(addr, b"POST /items/12 HTTP/1.1\r\n\
        X-Token: secret\r\n\
        Transfer-Encoding: chunked\r\n\r\n\
        4\r\nsome\r\n5\r\n data\r\n0\r\n\r\n");
    assert!(chunked.starts_with("HTTP/1.1 201 Created\r\n"), "{}", chunked);

    let sized = exchange(addr, b"POST /items/7 HTTP/1.1\r\n\
        Content-Length: 4\r\n\
        X-Token: secret\r\n\r\nbody");
    assert!(sized.starts_with("HTTP/1.1 201"), "{}", sized);

    let no_token = exchange(addr, b"POST /items/7 HTTP/1.1\r\n\
        Content-Length: 4\r\n\r\nbody");
    assert!(no_token.starts_with("HTTP/1.1 404"), "{}", no_token);
}

#[test]
fn malformed_request_closes_connection() {
    let server = MockServer::new();
    let addr = started(&server);
    assert_eq!(exchange(addr, b"\r\n"), "");
    assert_eq!(exchange(addr, b"GARBAGE\r\n\r\n"), "");
    // other connections are still served
    assert!(get(addr, "/").starts_with("HTTP/1.1 404"));
}

#[test]
fn json_configuration() {
    let server = MockServer::new();
    server.set_configuration_json(&br#"{"requests": [{
        "path": "/json",
        "responses": [{
            "code": 202,
            "headers": ["Content-Type: text/plain"],
            "content": "teapot"
        }]
    }]}"#[..]).unwrap();
    let addr = started(&server);
    let resp = get(addr, "/json");
    let (head, body) = split_head(&resp);
    assert_eq!(head, ["HTTP/1.1 202 Accepted",
                      "Content-Type: text/plain",
                      "Content-Length: 6"]);
    assert_eq!(body, "teapot");

    let extra = Configuration::new();
    extra.add_response(Pattern::new("GET", "/extra"), Response::new(204))
        .unwrap();
    server.add_configuration(&extra);
    assert!(get(addr, "/extra").starts_with("HTTP/1.1 204 No Content"));
    assert!(get(addr, "/json").starts_with("HTTP/1.1 202"));

    server.configuration().clear();
    assert!(get(addr, "/json").starts_with("HTTP/1.1 404"));
}

#[test]
fn start_and_stop() {
    let server = MockServer::new();
    assert!(!server.is_running());
    server.stop();
    let addr = started(&server);
    assert!(server.is_running());
    // start is a no-op when running
    server.start(0).unwrap();
    assert_eq!(server.local_addr().unwrap().port(), addr.port());

    server.stop();
    server.stop();
    assert!(!server.is_running());
    assert!(server.local_addr().is_none());
    assert!(TcpStream::connect(addr).is_err());

    // restart on the same port
    server.start(addr.port()).unwrap();
    assert!(get(addr, "/").starts_with("HTTP/1.1 404"));
}

#[test]
fn port_in_use() {
    let first = MockServer::new();
    let addr = started(&first);
    let second = MockServer::new();
    match second.start(addr.port()) {
        Err(StartError::Bind(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!second.is_running());
}

#[test]
fn tls() {
    let identity = include_bytes!("data/identity.p12");
    let server = MockServer::new();
    server.configuration()
        .add_response(Pattern::new("GET", "/secure"),
                      Response::new(200).content("secret"))
        .unwrap();
    server.start_tls(0, identity, "password").unwrap();
    let port = server.local_addr().unwrap().port();

    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build().unwrap();
    let sock = TcpStream::connect(("127.0.0.1", port)).unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    let mut tls = connector.connect("localhost", sock).unwrap();
    tls.write_all(b"GET /secure HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .unwrap();
    let mut buf = Vec::new();
    // the server closes the socket without a TLS close_notify
    let _ = tls.read_to_end(&mut buf);
    let resp = from_utf8(&buf).unwrap();
    assert_eq!(resp, "HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\nsecret");
}

#[test]
fn tls_wrong_password() {
    let identity = include_bytes!("data/identity.p12");
    let server = MockServer::new();
    match server.start_tls(0, identity, "wrong") {
        Err(StartError::Identity(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!server.is_running());
    match server.start_tls(0, b"not a pkcs12 blob", "password") {
        Err(StartError::Identity(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}
