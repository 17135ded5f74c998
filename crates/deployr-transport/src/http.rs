//! HTTP transport implementation using `reqwest`.

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::multipart::{Form, Part};

use crate::{HttpReply, HttpRequest, HttpTransport, Method, TransportError, UploadForm};

/// An [`HttpTransport`] that talks to a DeployR server over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport for the server at `base_url`
    /// (e.g. `http://localhost:8000`). Trailing slashes are stripped.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Uses an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The server root every request URI is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, uri: &str) -> String {
        format!("{}{}", self.base_url, uri)
    }

    fn no_cache(builder: reqwest::RequestBuilder, cache: bool) -> reqwest::RequestBuilder {
        if cache {
            builder
        } else {
            builder
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache")
        }
    }
}

/// Maps a reqwest error (network/timeout) to a `TransportError`.
fn map_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(timeout)
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        let url = self.url(&request.uri);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url).form(&request.fields),
        };
        let builder = Self::no_cache(builder.timeout(request.timeout), request.cache);

        tracing::trace!(method = %request.method, %url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| map_error(e, request.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_error(e, request.timeout))?;

        Ok(HttpReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }

    async fn submit_form(
        &self,
        request: HttpRequest,
        form: UploadForm,
    ) -> Result<String, TransportError> {
        let url = self.url(&request.uri);

        let mut multipart = Form::new();
        for (name, value) in request.fields {
            multipart = multipart.text(name, value);
        }
        let mut part = Part::bytes(form.bytes).file_name(form.file_name);
        if let Some(mime) = form.mime_type.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|e| TransportError::Request(e.to_string()))?;
        }
        multipart = multipart.part(form.field_name, part);

        let builder = self
            .client
            .post(&url)
            .multipart(multipart)
            .timeout(request.timeout);
        let builder = Self::no_cache(builder, request.cache);

        tracing::trace!(%url, "submitting upload form");
        let response = builder
            .send()
            .await
            .map_err(|e| map_error(e, request.timeout))?;

        // Only the body is reported back; see `HttpTransport::submit_form`.
        response
            .text()
            .await
            .map_err(|e| map_error(e, request.timeout))
    }
}
