//! In-memory fetcher: canned responses keyed by exact URL.
//!
//! Records every requested URL so tests can assert how many network
//! requests a bootstrap run made. Unknown URLs answer 404.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{HttpFetch, ResponseHandler, ResponseHead};
use crate::downloader::{DownloadError, TransportKind};

const CHUNK: usize = 1024;

/// One canned response.
#[derive(Debug, Clone)]
pub enum MemoryResponse {
    Body {
        status: u32,
        /// Value sent as `Content-Length`; may disagree with `body.len()`.
        declared_length: Option<u64>,
        body: Vec<u8>,
    },
    /// Fails before any response arrives (refused connection, reset, ...).
    Fail { kind: TransportKind, message: String },
}

impl MemoryResponse {
    /// 200 with an honest `Content-Length`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        MemoryResponse::Body {
            status: 200,
            declared_length: Some(body.len() as u64),
            body,
        }
    }

    /// Empty response with the given status.
    pub fn status(status: u32) -> Self {
        MemoryResponse::Body {
            status,
            declared_length: Some(0),
            body: Vec::new(),
        }
    }

    pub fn connection_error(message: impl Into<String>) -> Self {
        MemoryResponse::Fail {
            kind: TransportKind::Connection,
            message: message.into(),
        }
    }

    /// Override the declared `Content-Length` (`None` omits the header).
    pub fn with_declared_length(self, length: Option<u64>) -> Self {
        match self {
            MemoryResponse::Body { status, body, .. } => MemoryResponse::Body {
                status,
                declared_length: length,
                body,
            },
            fail => fail,
        }
    }
}

/// Fetcher backed by a URL -> response table.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: Mutex<HashMap<String, MemoryResponse>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, url: impl Into<String>, response: MemoryResponse) -> Self {
        self.set_route(url, response);
        self
    }

    /// Add or replace a route on a shared fetcher.
    pub fn set_route(&self, url: impl Into<String>, response: MemoryResponse) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), response);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl HttpFetch for MemoryFetcher {
    fn get(&self, url: &str, handler: &mut dyn ResponseHandler) -> Result<(), DownloadError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        let response = self
            .routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
            .unwrap_or_else(|| MemoryResponse::status(404));

        match response {
            MemoryResponse::Fail { kind, message } => Err(DownloadError::transport(kind, message)),
            MemoryResponse::Body {
                status,
                declared_length,
                body,
            } => {
                handler.on_head(&ResponseHead {
                    status,
                    content_length: declared_length,
                })?;
                for chunk in body.chunks(CHUNK) {
                    handler.on_chunk(chunk)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect {
        head: Option<ResponseHead>,
        body: Vec<u8>,
        chunks: usize,
    }

    impl ResponseHandler for Collect {
        fn on_head(&mut self, head: &ResponseHead) -> Result<(), DownloadError> {
            self.head = Some(head.clone());
            Ok(())
        }
        fn on_chunk(&mut self, data: &[u8]) -> Result<(), DownloadError> {
            self.body.extend_from_slice(data);
            self.chunks += 1;
            Ok(())
        }
    }

    fn collect() -> Collect {
        Collect {
            head: None,
            body: Vec::new(),
            chunks: 0,
        }
    }

    #[test]
    fn serves_body_in_chunks_and_records_request() {
        let body = vec![7u8; CHUNK * 2 + 10];
        let f = MemoryFetcher::new().with_route("http://h/x", MemoryResponse::ok(body.clone()));
        let mut c = collect();
        f.get("http://h/x", &mut c).unwrap();
        assert_eq!(c.body, body);
        assert_eq!(c.chunks, 3);
        assert_eq!(c.head.unwrap().content_length, Some(body.len() as u64));
        assert_eq!(f.requests(), vec!["http://h/x".to_string()]);
    }

    #[test]
    fn unknown_url_is_404() {
        let f = MemoryFetcher::new();
        let mut c = collect();
        f.get("http://h/none", &mut c).unwrap();
        assert_eq!(c.head.unwrap().status, 404);
        assert_eq!(f.request_count(), 1);
    }

    #[test]
    fn failure_surfaces_as_transport_error() {
        let f = MemoryFetcher::new().with_route("http://h/x", MemoryResponse::connection_error("reset"));
        let err = f.get("http://h/x", &mut collect()).unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Transport {
                kind: TransportKind::Connection,
                ..
            }
        ));
    }
}
