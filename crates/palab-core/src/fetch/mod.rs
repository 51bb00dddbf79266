//! HTTP fetch capability.
//!
//! The downloader and hub discovery reach the network only through
//! [`HttpFetch`]. Production code uses [`CurlFetcher`] (libcurl); tests use
//! [`MemoryFetcher`] so they run without sockets.

mod easy;
mod memory;
mod parse;

pub use easy::CurlFetcher;
pub use memory::{MemoryFetcher, MemoryResponse};

use crate::downloader::DownloadError;

/// Status and size of the final response (after redirects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u32,
    /// `Content-Length` as declared by the server, if any.
    pub content_length: Option<u64>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Consumer of one GET response: `on_head` once, then `on_chunk` per body chunk.
/// An error from either callback aborts the transfer and is returned by `get`.
pub trait ResponseHandler {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), DownloadError>;
    fn on_chunk(&mut self, data: &[u8]) -> Result<(), DownloadError>;
}

/// Blocking HTTP GET with a streaming body.
pub trait HttpFetch {
    fn get(&self, url: &str, handler: &mut dyn ResponseHandler) -> Result<(), DownloadError>;
}

impl<T: HttpFetch + ?Sized> HttpFetch for &T {
    fn get(&self, url: &str, handler: &mut dyn ResponseHandler) -> Result<(), DownloadError> {
        (**self).get(url, handler)
    }
}

impl<T: HttpFetch + ?Sized> HttpFetch for std::sync::Arc<T> {
    fn get(&self, url: &str, handler: &mut dyn ResponseHandler) -> Result<(), DownloadError> {
        (**self).get(url, handler)
    }
}

/// Collects a small response body in memory (hub API JSON).
struct BufferHandler {
    url: String,
    max_len: usize,
    body: Vec<u8>,
}

impl ResponseHandler for BufferHandler {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), DownloadError> {
        if !head.is_success() {
            return Err(DownloadError::Http {
                status: head.status,
                url: self.url.clone(),
            });
        }
        Ok(())
    }

    fn on_chunk(&mut self, data: &[u8]) -> Result<(), DownloadError> {
        let total = self.body.len() + data.len();
        if total > self.max_len {
            return Err(DownloadError::SizeLimitExceeded {
                limit: self.max_len as u64,
                actual: total as u64,
            });
        }
        self.body.extend_from_slice(data);
        Ok(())
    }
}

/// GET `url` into memory, failing on non-2xx or bodies over `max_len` bytes.
pub fn get_bytes(fetcher: &dyn HttpFetch, url: &str, max_len: usize) -> Result<Vec<u8>, DownloadError> {
    let mut handler = BufferHandler {
        url: url.to_string(),
        max_len,
        body: Vec::new(),
    };
    fetcher.get(url, &mut handler)?;
    Ok(handler.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_bytes_collects_body() {
        let fetcher = MemoryFetcher::new().with_route("http://hub.test/a", MemoryResponse::ok("payload"));
        let body = get_bytes(&fetcher, "http://hub.test/a", 1024).unwrap();
        assert_eq!(body, b"payload");
    }

    #[test]
    fn get_bytes_rejects_error_status() {
        let fetcher = MemoryFetcher::new();
        let err = get_bytes(&fetcher, "http://hub.test/missing", 1024).unwrap_err();
        assert!(matches!(err, DownloadError::Http { status: 404, .. }));
    }

    #[test]
    fn get_bytes_caps_body() {
        let fetcher =
            MemoryFetcher::new().with_route("http://hub.test/big", MemoryResponse::ok(vec![0u8; 64]));
        let err = get_bytes(&fetcher, "http://hub.test/big", 16).unwrap_err();
        assert!(matches!(err, DownloadError::SizeLimitExceeded { limit: 16, .. }));
    }
}
