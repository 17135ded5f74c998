//! Transaction identity and lifecycle.

use std::fmt;

/// Opaque, per-manager identifier of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Creates a `TransactionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// The lifecycle state of a transaction.
///
/// Transitions are strictly ordered, with one branch after dispatch:
///
/// ```text
/// Created → Dispatched → CompletedSuccess ┐
///                      → CompletedFailure ┴→ Notified → Terminal
/// ```
///
/// There is no way back and no way to skip a state: no retries, no
/// cancellation, no reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Created,
    Dispatched,
    CompletedSuccess,
    CompletedFailure,
    Notified,
    Terminal,
}

impl TransactionState {
    /// Returns the state that follows this one. `succeeded` only matters
    /// when leaving `Dispatched`.
    pub fn next(self, succeeded: bool) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Dispatched),
            Self::Dispatched if succeeded => Some(Self::CompletedSuccess),
            Self::Dispatched => Some(Self::CompletedFailure),
            Self::CompletedSuccess | Self::CompletedFailure => Some(Self::Notified),
            Self::Notified => Some(Self::Terminal),
            Self::Terminal => None,
        }
    }

    /// Returns `true` if moving to `target` is a valid single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next(true) == Some(target) || self.next(false) == Some(target)
    }

    /// Returns `true` once a reply (or its absence) has been classified.
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            Self::CompletedSuccess | Self::CompletedFailure | Self::Notified | Self::Terminal
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Dispatched => write!(f, "Dispatched"),
            Self::CompletedSuccess => write!(f, "CompletedSuccess"),
            Self::CompletedFailure => write!(f, "CompletedFailure"),
            Self::Notified => write!(f, "Notified"),
            Self::Terminal => write!(f, "Terminal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_display_and_inner() {
        let id = TransactionId::new(7);
        assert_eq!(id.to_string(), "tx-7");
        assert_eq!(id.into_inner(), 7);
    }

    #[test]
    fn test_state_next_follows_strict_order() {
        use TransactionState::*;
        assert_eq!(Created.next(true), Some(Dispatched));
        assert_eq!(Dispatched.next(true), Some(CompletedSuccess));
        assert_eq!(Dispatched.next(false), Some(CompletedFailure));
        assert_eq!(CompletedSuccess.next(true), Some(Notified));
        assert_eq!(CompletedFailure.next(false), Some(Notified));
        assert_eq!(Notified.next(true), Some(Terminal));
        assert_eq!(Terminal.next(true), None);
    }

    #[test]
    fn test_state_can_transition_to() {
        use TransactionState::*;
        assert!(Dispatched.can_transition_to(CompletedFailure));
        assert!(Dispatched.can_transition_to(CompletedSuccess));
        assert!(!Created.can_transition_to(Notified));
        assert!(!Terminal.can_transition_to(Created));
        assert!(!CompletedSuccess.can_transition_to(CompletedFailure));
    }

    #[test]
    fn test_state_is_completed() {
        use TransactionState::*;
        assert!(!Created.is_completed());
        assert!(!Dispatched.is_completed());
        assert!(CompletedFailure.is_completed());
        assert!(Terminal.is_completed());
    }
}
