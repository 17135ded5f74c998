//! Caller-supplied handlers for one transaction.
//!
//! A [`Callback`] bundles up to three handlers:
//!
//! - `success` receives the reply when the transaction succeeded
//! - `failure` receives a [`Failure`] otherwise
//! - `notify` runs after whichever of the two ran, or after neither if
//!   the caller supplied none
//!
//! Exactly one of `success`/`failure` is eligible per transaction, and
//! `notify` runs exactly once. It is driven by a drop guard, so it still
//! runs if a handler panics.
//!
//! The handler type for `success` is generic: façade methods hand out a
//! `Callback<Reply<T>>` and adapt it to the `Callback<Response>` the
//! manager delivers with [`Callback::map_success`].

use std::fmt;

use crate::failure::{Failure, Status};
use crate::response::Response;
use crate::state::TransactionId;

type SuccessFn<S> = Box<dyn FnOnce(S) + Send + 'static>;
type FailureFn = Box<dyn FnOnce(Failure) + Send + 'static>;
type NotifyFn = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Summary handed to `notify` and returned by
/// [`TransactionHandle::wait`](crate::TransactionHandle::wait).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub transaction: TransactionId,
    pub succeeded: bool,
    /// `Http(200)` for a successful plain request, `Unknown` for uploads
    /// and application failures, otherwise the failure's status.
    pub status: Status,
}

/// Handlers for one transaction. All of them are optional.
pub struct Callback<S = Response> {
    success: Option<SuccessFn<S>>,
    failure: Option<FailureFn>,
    notify: Option<NotifyFn>,
    verbose: bool,
}

impl<S: Send + 'static> Callback<S> {
    /// A callback with no handlers and `verbose` off.
    pub fn new() -> Self {
        Self {
            success: None,
            failure: None,
            notify: None,
            verbose: false,
        }
    }

    pub fn on_success(mut self, handler: impl FnOnce(S) + Send + 'static) -> Self {
        self.success = Some(Box::new(handler));
        self
    }

    pub fn on_failure(mut self, handler: impl FnOnce(Failure) + Send + 'static) -> Self {
        self.failure = Some(Box::new(handler));
        self
    }

    pub fn on_notify(mut self, handler: impl FnOnce(Completion) + Send + 'static) -> Self {
        self.notify = Some(Box::new(handler));
        self
    }

    /// Asks for the full envelope instead of the operation's narrowed
    /// projection. Only façade methods look at this flag.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Adapts the success handler to accept a `U`, converting it with `f`
    /// first. `f` only runs if a success handler is present.
    pub fn map_success<U>(self, f: impl FnOnce(U) -> S + Send + 'static) -> Callback<U>
    where
        U: Send + 'static,
    {
        let success = self.success.map(|handler| -> SuccessFn<U> {
            Box::new(move |value: U| handler(f(value)))
        });
        Callback {
            success,
            failure: self.failure,
            notify: self.notify,
            verbose: self.verbose,
        }
    }

    /// Runs the eligible handler for `outcome`, then `notify`.
    ///
    /// The manager calls this once per transaction. It is public so that
    /// operations chaining several transactions can hand an early failure
    /// to the caller's callback.
    pub fn deliver(self, outcome: Result<S, Failure>, completion: Completion) {
        let _guard = NotifyGuard {
            notify: self.notify,
            completion,
        };
        match outcome {
            Ok(value) => {
                if let Some(success) = self.success {
                    success(value);
                }
            }
            Err(failure) => {
                if let Some(handler) = self.failure {
                    handler(failure);
                }
            }
        }
    }
}

impl<S: Send + 'static> Default for Callback<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Callback<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("success", &self.success.is_some())
            .field("failure", &self.failure.is_some())
            .field("notify", &self.notify.is_some())
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Runs `notify` when dropped, including during unwinding.
struct NotifyGuard {
    notify: Option<NotifyFn>,
    completion: Completion,
}

impl Drop for NotifyGuard {
    fn drop(&mut self) {
        if let Some(notify) = self.notify.take() {
            notify(self.completion);
        }
    }
}
