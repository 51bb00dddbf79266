//! Typed download failures.

use std::io;

/// Network-level failure category, used for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Connect or transfer timed out (including low-speed aborts).
    Timeout,
    /// DNS, refused connection, reset, or a server that sent nothing.
    Connection,
    /// Anything else reported by the HTTP client (bad URL, TLS setup, ...).
    Other,
}

/// Error returned by a single file download.
///
/// Kept typed (rather than `anyhow`) so the retry policy can classify it and
/// the bootstrap can record a precise message on the failing asset.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Final response status was not 2xx.
    #[error("GET {url} returned HTTP {status}")]
    Http { status: u32, url: String },

    /// Declared `content-length` or streamed bytes went over the byte limit.
    #[error("size limit exceeded: {actual} bytes over a limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64, actual: u64 },

    /// Body ended before the declared `content-length` was reached.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },

    /// HTTP client failure below the response level.
    #[error("transport error: {message}")]
    Transport { kind: TransportKind, message: String },

    /// Stopped through a `CancelToken`.
    #[error("download cancelled")]
    Cancelled,

    /// Filesystem failure (permission, disk full, missing path).
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        DownloadError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        DownloadError::Transport {
            kind,
            message: message.into(),
        }
    }
}
