use std::time::Duration;

/// Errors that can occur in the transport layer.
///
/// A `TransportError` means no usable HTTP reply came back. Replies with a
/// non-200 status are *not* errors here; they are returned as
/// [`HttpReply`](crate::HttpReply) and classified by the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Building, sending, or reading the request failed.
    #[error("request failed: {0}")]
    Request(String),

    /// Reading an upload payload from disk failed.
    #[error("upload payload unreadable: {0}")]
    Io(#[source] std::io::Error),
}
