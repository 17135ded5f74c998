//! Terse and verbose replies.
//!
//! Most operations have a natural "answer": the session id for
//! `create_session`, `true` for `ping_session`, the console text for
//! `session_output`. Unless the caller asks for `verbose`, that answer is
//! all their `success` handler receives.

use deployr_transaction::{Callback, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a façade operation hands to the `success` handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// The complete reply, for callbacks with `verbose(true)`.
    Full(Response),
    /// The operation's narrowed projection of the reply.
    Brief(T),
}

impl<T> Reply<T> {
    pub fn full(&self) -> Option<&Response> {
        match self {
            Self::Full(response) => Some(response),
            Self::Brief(_) => None,
        }
    }

    pub fn brief(&self) -> Option<&T> {
        match self {
            Self::Full(_) => None,
            Self::Brief(value) => Some(value),
        }
    }

    pub fn into_brief(self) -> Option<T> {
        match self {
            Self::Full(_) => None,
            Self::Brief(value) => Some(value),
        }
    }
}

/// A file in a session's working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub name: String,
    /// The file descriptor the server returned (size, type, URL...).
    pub file: Value,
}

/// Reads the `files` object of a session file reply, one entry per file.
pub fn session_files(response: &Response) -> Vec<SessionFile> {
    let Some(Value::Object(files)) = response.field("files") else {
        return Vec::new();
    };
    files
        .iter()
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, file)| SessionFile {
            name: name.clone(),
            file: file.get("value").cloned().unwrap_or(Value::Null),
        })
        .collect()
}

/// Reads a string field, or `""` if it is missing or not a string.
pub(crate) fn string_field(response: &Response, key: &str) -> String {
    response
        .field(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Reads a field, or `default` if it is missing.
pub(crate) fn field_or(response: &Response, key: &str, default: Value) -> Value {
    response.field(key).cloned().unwrap_or(default)
}

/// Adapts a caller's `Callback<Reply<T>>` to the `Callback<Response>` the
/// transaction manager delivers, applying `project` unless the caller
/// asked for `verbose`.
pub(crate) fn narrowed<T>(
    callback: Callback<Reply<T>>,
    project: impl FnOnce(&Response) -> T + Send + 'static,
) -> Callback
where
    T: Send + 'static,
{
    let verbose = callback.is_verbose();
    callback.map_success(move |response: Response| {
        if verbose {
            Reply::Full(response)
        } else {
            Reply::Brief(project(&response))
        }
    })
}
