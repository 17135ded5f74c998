//! Unified error type for the DeployR client.

use deployr_protocol::ProtocolError;
use deployr_transaction::{DispatchError, Failure, TransactionError};
use deployr_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `deployr` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DeployrError {
    /// The HTTP client could not be set up, or no reply came back.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request parameter could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The request could not be dispatched (e.g. no form bound for an
    /// upload).
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The server reported a failure.
    #[error(transparent)]
    Failed(#[from] Failure),
}

impl From<TransactionError> for DeployrError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Dispatch(err) => Self::Dispatch(err),
            TransactionError::Failed(failure) => Self::Failed(failure),
        }
    }
}
