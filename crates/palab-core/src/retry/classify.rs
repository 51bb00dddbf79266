//! Classify HTTP status and download errors into retry policy error kinds.

use crate::downloader::{DownloadError, TransportKind};
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::ServerError(code as u16),
        _ => ErrorKind::Permanent,
    }
}

/// Classify a download error into an ErrorKind.
pub fn classify(e: &DownloadError) -> ErrorKind {
    match e {
        DownloadError::Http { status, .. } => classify_http_status(*status),
        DownloadError::Transport { kind, .. } => match kind {
            TransportKind::Timeout => ErrorKind::Timeout,
            TransportKind::Connection => ErrorKind::Connection,
            TransportKind::Other => ErrorKind::Permanent,
        },
        // Server closed early; a fresh attempt usually completes.
        DownloadError::PartialTransfer { .. } => ErrorKind::Connection,
        DownloadError::SizeLimitExceeded { .. }
        | DownloadError::Cancelled
        | DownloadError::Io { .. } => ErrorKind::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::ServerError(500)));
        assert!(matches!(classify_http_status(502), ErrorKind::ServerError(502)));
    }

    #[test]
    fn http_4xx_other() {
        assert_eq!(classify_http_status(404), ErrorKind::Permanent);
        assert_eq!(classify_http_status(401), ErrorKind::Permanent);
    }

    #[test]
    fn size_limit_and_cancel_are_final() {
        let e = DownloadError::SizeLimitExceeded { limit: 1, actual: 2 };
        assert_eq!(classify(&e), ErrorKind::Permanent);
        assert_eq!(classify(&DownloadError::Cancelled), ErrorKind::Permanent);
    }

    #[test]
    fn transport_kinds_map_through() {
        let e = DownloadError::transport(TransportKind::Timeout, "timed out");
        assert_eq!(classify(&e), ErrorKind::Timeout);
        let e = DownloadError::transport(TransportKind::Connection, "refused");
        assert_eq!(classify(&e), ErrorKind::Connection);
        let e = DownloadError::PartialTransfer { expected: 10, received: 3 };
        assert_eq!(classify(&e), ErrorKind::Connection);
    }
}
