//! Manager-wide transaction events.
//!
//! Independently of each transaction's own callback, a manager can report
//! every transaction's lifecycle to a single [`TransactionEvents`]
//! observer. Registration happens at most once per manager.

use std::sync::Arc;

use crate::failure::Status;
use crate::state::TransactionId;

/// Observer of every transaction a manager runs. All hooks default to
/// no-ops.
///
/// Hooks run on the transaction's task and must not block.
///
/// Per plain transaction: `start`, then `complete`, then one of
/// `success`/`failure`. A timeout adds `abort` before `complete`.
/// Per upload: `start`, then `upload`; the HTTP status of an upload is
/// never known, so the other hooks are not fired.
pub trait TransactionEvents: Send + Sync + 'static {
    fn start(&self, _id: TransactionId) {}

    fn complete(&self, _id: TransactionId, _status: &Status) {}

    fn success(&self, _id: TransactionId, _status: &Status) {}

    fn failure(&self, _id: TransactionId, _status: &Status) {}

    fn upload(&self, _id: TransactionId) {}

    fn abort(&self, _id: TransactionId) {}
}

/// Whether a manager has had its event observer registered.
#[derive(Clone, Default)]
pub enum EventRegistration {
    #[default]
    Unregistered,
    Registered(Arc<dyn TransactionEvents>),
}

impl EventRegistration {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    /// The registered observer, if any.
    pub fn observer(&self) -> Option<Arc<dyn TransactionEvents>> {
        match self {
            Self::Unregistered => None,
            Self::Registered(observer) => Some(Arc::clone(observer)),
        }
    }
}

impl std::fmt::Debug for EventRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unregistered => f.write_str("Unregistered"),
            Self::Registered(_) => f.write_str("Registered"),
        }
    }
}
