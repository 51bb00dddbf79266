//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves canned bodies keyed by request target (path plus query). Unknown
//! targets get 404. A route can omit `Content-Length` (body ends when the
//! connection closes) or declare more bytes than it sends.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// If false, no `Content-Length` header is sent.
    pub send_length: bool,
    /// Declared length when it should differ from `body.len()`.
    pub declared_length: Option<usize>,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            send_length: true,
            declared_length: None,
        }
    }

    pub fn without_length(mut self) -> Self {
        self.send_length = false;
        self
    }

    pub fn declaring(mut self, length: usize) -> Self {
        self.declared_length = Some(length);
        self
    }
}

/// Running server handle. The listener thread lives until the process exits.
pub struct AssetServer {
    base: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    hits: Arc<AtomicUsize>,
}

impl AssetServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let (r, h) = (Arc::clone(&routes), Arc::clone(&hits));
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                h.fetch_add(1, Ordering::SeqCst);
                let route_table = Arc::clone(&r);
                thread::spawn(move || handle(stream, &route_table));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            routes,
            hits,
        }
    }

    /// Base URL without trailing slash, e.g. `http://127.0.0.1:12345`.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn url(&self, target: &str) -> String {
        format!("{}{}", self.base, target)
    }

    /// Serve `route` for the exact request target (`/path?query`).
    pub fn route(&self, target: &str, route: Route) -> &Self {
        self.routes.lock().unwrap().insert(target.to_string(), route);
        self
    }

    /// Connections accepted so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, routes: &Mutex<HashMap<String, Route>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let route = routes.lock().unwrap().get(&target).cloned();
    let Some(route) = route else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };

    let mut head = format!("HTTP/1.1 {} X\r\nConnection: close\r\n", route.status);
    if route.send_length {
        let declared = route.declared_length.unwrap_or(route.body.len());
        head.push_str(&format!("Content-Length: {}\r\n", declared));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}
