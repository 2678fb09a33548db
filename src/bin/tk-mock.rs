extern crate argparse;
extern crate env_logger;
extern crate tk_mock;
#[macro_use] extern crate log;

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::exit;
use std::thread;
use std::time::Duration;

use argparse::{ArgumentParser, Store, ParseOption};
use tk_mock::MockServer;


pub struct Options {
    pub port: u16,
    pub config: Option<PathBuf>,
    pub pkcs12: Option<PathBuf>,
    pub password: String,
}


pub fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let mut opt = Options {
        port: 8080,
        config: None,
        pkcs12: None,
        password: String::new(),
    };
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Serves scripted HTTP and websocket responses");
        ap.refer(&mut opt.port)
            .add_option(&["-p", "--port"], Store,
                "Port to listen on, 0 picks a free one (default 8080)");
        ap.refer(&mut opt.config)
            .add_option(&["-c", "--config"], ParseOption,
                "JSON file with request patterns and responses");
        ap.refer(&mut opt.pkcs12)
            .add_option(&["--pkcs12"], ParseOption,
                "Serve HTTPS with the identity from this PKCS#12 file");
        ap.refer(&mut opt.password)
            .add_option(&["--password"], Store,
                "Password of the PKCS#12 file");
        ap.parse_args_or_exit();
    }

    let server = MockServer::new();
    if let Some(ref path) = opt.config {
        let loaded = File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|f| server.set_configuration_json(f)
                .map_err(|e| e.to_string()));
        if let Err(e) = loaded {
            error!("Can't load {:?}: {}", path, e);
            exit(1);
        }
    }
    let started = match opt.pkcs12 {
        Some(ref path) => {
            let mut identity = Vec::new();
            if let Err(e) = File::open(path)
                .and_then(|mut f| f.read_to_end(&mut identity))
            {
                error!("Can't read {:?}: {}", path, e);
                exit(1);
            }
            server.start_tls(opt.port, &identity, &opt.password)
        }
        None => server.start(opt.port),
    };
    if let Err(e) = started {
        error!("{}", e);
        exit(2);
    }
    if let Some(addr) = server.local_addr() {
        info!("Serving {} patterns on port {}",
            server.configuration().patterns().len(), addr.port());
    }
    while server.is_running() {
        thread::sleep(Duration::from_secs(1));
    }
    error!("Server stopped accepting connections");
    exit(3);
}
