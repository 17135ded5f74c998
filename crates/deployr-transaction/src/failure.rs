//! What a caller's `failure` handler receives, and the errors raised
//! before a transaction exists.

use std::fmt;

use crate::TransactionId;

/// The status reported alongside a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The HTTP status code the server answered with.
    Http(u16),
    /// The server answered 200 but the outcome is not a plain HTTP result:
    /// an envelope with `success: false`, or an upload (whose status the
    /// client never sees).
    Unknown,
    /// No reply came back at all (timeout, connection refused).
    NoResponse,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Unknown => f.write_str("STATUS-CODE-UNKNOWN"),
            Self::NoResponse => f.write_str("NO-RESPONSE"),
        }
    }
}

/// Which layer a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network error, timeout, or a non-200 status. The body was not read.
    Transport,
    /// HTTP 200 with an envelope reporting `success: false`.
    Application,
    /// An upload came back with an empty body.
    Upload,
    /// HTTP 200 (or an upload reply) whose body could not be interpreted.
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("transport"),
            Self::Application => f.write_str("application"),
            Self::Upload => f.write_str("upload"),
            Self::Parse => f.write_str("parse"),
        }
    }
}

/// A failed transaction, as handed to the `failure` handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} failure in {transaction} [{status}]: {status_text}")]
pub struct Failure {
    pub transaction: TransactionId,
    pub kind: FailureKind,
    pub status: Status,
    pub status_text: String,
}

impl Failure {
    pub(crate) fn new(
        transaction: TransactionId,
        kind: FailureKind,
        status: Status,
        status_text: impl Into<String>,
    ) -> Self {
        Self {
            transaction,
            kind,
            status,
            status_text: status_text.into(),
        }
    }
}

/// A descriptor that cannot be dispatched. No transaction is created and
/// no handler runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The descriptor names a form that has no binding.
    #[error("no form bound under id `{0}`")]
    FormNotBound(String),
}

/// Error returned by [`TransactionManager::execute`](crate::TransactionManager::execute).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Failed(#[from] Failure),
}
