//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust types and the text the
//! DeployR server speaks. Request parameters such as `inputs` carry JSON
//! text, and every `format=json` reply is a JSON envelope, so the
//! transaction layer only needs something implementing [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to text and decode text back.
///
/// `Send + Sync + 'static` because the codec is shared by every in-flight
/// transaction task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into text.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented
    /// in this format (e.g. a map with non-string keys).
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes text back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ## Example
///
/// ```rust
/// use deployr_protocol::{Codec, JsonCodec, ResponseEnvelope};
///
/// let codec = JsonCodec;
/// let body = r#"{"deployr":{"response":{"success":true,"call":"/r/user/whoami"}}}"#;
///
/// let envelope: ResponseEnvelope = codec.decode(body).unwrap();
/// assert!(envelope.is_success());
/// assert_eq!(envelope.call(), "/r/user/whoami");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
