//! Core protocol types for the DeployR reply format.
//!
//! Every `format=json` reply from the server is wrapped in the same
//! two-level envelope:
//!
//! ```text
//! { "deployr": { "response": { "success": true, "call": "/r/session/create", ... } } }
//! ```
//!
//! The inner object always carries `success` and `call`; everything else
//! depends on the operation and is kept as raw JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// How the server should shape its reply, sent as the `format` parameter.
///
/// The format also decides how the transaction layer reads the body:
/// `Json` bodies are parsed as a [`ResponseEnvelope`], `Text` bodies are
/// handed to the caller untouched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Text,
}

impl Format {
    /// The literal value of the `format` request parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The inner `response` object of an envelope.
///
/// `success` defaults to `false` when the server leaves it out, so a
/// reply without the flag is never mistaken for a success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResponse {
    /// Application-level outcome of the call.
    #[serde(default)]
    pub success: bool,

    /// The API path the server executed, e.g. `/r/session/create`.
    #[serde(default)]
    pub call: String,

    /// Human-readable reason, present when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Operation-specific fields (`session`, `console`, `files`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The `deployr` wrapper object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeBody {
    pub response: ServerResponse,
}

/// A complete `format=json` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub deployr: EnvelopeBody,
}

impl ResponseEnvelope {
    /// Wraps a response object in the envelope.
    pub fn new(response: ServerResponse) -> Self {
        Self {
            deployr: EnvelopeBody { response },
        }
    }

    /// The inner response object.
    pub fn response(&self) -> &ServerResponse {
        &self.deployr.response
    }

    /// Returns the application-level success flag.
    pub fn is_success(&self) -> bool {
        self.deployr.response.success
    }

    /// The API path echoed back by the server.
    pub fn call(&self) -> &str {
        &self.deployr.response.call
    }

    /// The server's error message, if it sent one.
    pub fn error(&self) -> Option<&str> {
        self.deployr.response.error.as_deref()
    }

    /// Looks up an operation-specific field such as `session` or `console`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.deployr.response.fields.get(key)
    }

    /// Like [`field`](Self::field), but falls back to `default` when the
    /// server omitted the key.
    pub fn field_or(&self, key: &str, default: Value) -> Value {
        self.field(key).cloned().unwrap_or(default)
    }
}
