//! HTTP transport abstraction for the DeployR client.
//!
//! Provides the [`HttpTransport`] trait the transaction layer dispatches
//! through, plus the request/reply types that cross it. The transport is
//! deliberately dumb: it moves bytes and reports status codes, and never
//! looks inside a reply body.
//!
//! # Feature Flags
//!
//! - `http` (default): [`ReqwestTransport`] built on `reqwest`

#[cfg(feature = "http")]
mod http;
mod error;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::ReqwestTransport;

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// HTTP method of a request. The DeployR API only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A fully prepared request.
///
/// `uri` is relative to the transport's base URL and already contains the
/// query string for GET requests. `fields` are the POST body pairs, still
/// unencoded: encoding them is the transport's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: String,
    pub fields: Vec<(String, String)>,
    pub timeout: Duration,
    /// When `false`, the transport must defeat intermediate caches.
    pub cache: bool,
}

/// What came back from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    /// Returns `true` for the only status the API treats as success.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A file captured for a multipart upload.
///
/// An `UploadForm` is the client-side stand-in for an HTML form with a
/// file input: the file is sent under `field_name`, and the request's
/// fields travel alongside it as plain text parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub field_name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl UploadForm {
    /// Creates a form that sends `bytes` as `file_name` in the `file` field.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            field_name: "file".to_string(),
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    /// Reads a file from disk into a form, named after the file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(TransportError::Io)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    /// Overrides the multipart field the file is sent under.
    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Sets the MIME type of the file part.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Sends requests to the DeployR server.
///
/// Implementations must be shareable across tasks (`Send + Sync +
/// 'static`) because every in-flight transaction holds a handle to the
/// same transport.
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends a request and returns the reply, whatever its status.
    ///
    /// # Errors
    /// Returns a [`TransportError`] only when no reply was received.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpReply, TransportError>> + Send;

    /// Submits `form` as a multipart POST, with the request's fields as
    /// extra text parts, and returns the reply body.
    ///
    /// Form submissions report only the body: like a browser posting into
    /// a hidden frame, the caller never sees the status code.
    fn submit_form(
        &self,
        request: HttpRequest,
        form: UploadForm,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}
