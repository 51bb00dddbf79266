//! libcurl-backed fetcher.
//!
//! One `Easy` handle per request, redirects followed. Header lines are
//! collected until the first body byte arrives; that is the point where the
//! final status and `Content-Length` are known and handed to the handler.

use std::cell::{Cell, RefCell};
use std::str;
use std::time::Duration;

use super::parse::parse_head;
use super::{HttpFetch, ResponseHandler};
use crate::downloader::{DownloadError, TransportKind};

/// Blocking GET via libcurl. Cheap to clone; holds only request options.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    bearer_token: Option<String>,
    connect_timeout: Duration,
    /// Abort if throughput stays below 1 KiB/s for this long.
    low_speed_time: Duration,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self {
            bearer_token: None,
            connect_timeout: Duration::from_secs(30),
            low_speed_time: Duration::from_secs(60),
        }
    }
}

impl CurlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `Authorization: Bearer <token>` (gated Hugging Face repos).
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Map a libcurl error onto the transport categories used for retries.
pub(crate) fn transport_error(e: curl::Error) -> DownloadError {
    let kind = if e.is_operation_timedout() {
        TransportKind::Timeout
    } else if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        TransportKind::Connection
    } else {
        TransportKind::Other
    };
    DownloadError::transport(kind, e.to_string())
}

impl HttpFetch for CurlFetcher {
    fn get(&self, url: &str, handler: &mut dyn ResponseHandler) -> Result<(), DownloadError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(transport_error)?;
        easy.follow_location(true).map_err(transport_error)?;
        easy.max_redirections(10).map_err(transport_error)?;
        easy.connect_timeout(self.connect_timeout)
            .map_err(transport_error)?;
        easy.low_speed_limit(1024).map_err(transport_error)?;
        easy.low_speed_time(self.low_speed_time)
            .map_err(transport_error)?;
        easy.useragent(concat!("palab/", env!("CARGO_PKG_VERSION")))
            .map_err(transport_error)?;

        if let Some(token) = &self.bearer_token {
            let mut list = curl::easy::List::new();
            list.append(&format!("Authorization: Bearer {}", token.trim()))
                .map_err(transport_error)?;
            easy.http_headers(list).map_err(transport_error)?;
        }

        let header_lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let head_sent = Cell::new(false);
        let handler_error: RefCell<Option<DownloadError>> = RefCell::new(None);

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        let line = s.trim_end();
                        let mut lines = header_lines.borrow_mut();
                        // Each redirect hop starts a new header block.
                        if line.starts_with("HTTP/") {
                            lines.clear();
                        }
                        lines.push(line.to_string());
                    }
                    true
                })
                .map_err(transport_error)?;
            transfer
                .write_function(|data| {
                    let mut result = Ok(());
                    if !head_sent.get() {
                        head_sent.set(true);
                        let head = parse_head(&header_lines.borrow());
                        result = handler.on_head(&head);
                    }
                    match result.and_then(|()| handler.on_chunk(data)) {
                        Ok(()) => Ok(data.len()),
                        Err(e) => {
                            handler_error.borrow_mut().replace(e);
                            // Short write makes libcurl abort the transfer.
                            Ok(0)
                        }
                    }
                })
                .map_err(transport_error)?;
            transfer.perform()
        };

        if let Some(e) = handler_error.into_inner() {
            return Err(e);
        }
        perform_result.map_err(transport_error)?;

        if !head_sent.get() {
            // Empty body: the write callback never ran.
            let mut head = parse_head(&header_lines.borrow());
            if head.status == 0 {
                head.status = easy.response_code().map_err(transport_error)?;
            }
            handler.on_head(&head)?;
        }
        Ok(())
    }
}
