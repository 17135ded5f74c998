use deployr_protocol::ResponseEnvelope;
use serde_json::Value;

/// A successful reply, as handed to the `success` handler.
///
/// `Json` always holds the complete envelope; narrowing it to the part an
/// operation cares about is left to the façade layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(ResponseEnvelope),
    Text(String),
}

impl Response {
    /// The envelope, for `format=json` replies.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Json(envelope) => Some(envelope),
            Self::Text(_) => None,
        }
    }

    /// The raw body, for `format=text` replies.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Shorthand for `envelope().and_then(|e| e.field(key))`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.envelope().and_then(|envelope| envelope.field(key))
    }
}
