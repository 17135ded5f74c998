//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the problem is in turning values into
//! text or text back into values, never in networking.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON text).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (turning JSON text into a Rust value).
    ///
    /// Common causes: a body that is not JSON at all, or JSON whose shape
    /// is not a response envelope.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
