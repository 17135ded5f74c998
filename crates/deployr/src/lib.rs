//! # DeployR
//!
//! Client SDK for the DeployR statistical computing server.
//!
//! Every server operation (sessions, R code and scripts, objects, files,
//! repository, projects, users) is a method on [`DeployrClient`]. Methods
//! dispatch an HTTP transaction and report back through a [`Callback`]:
//! one of `success`/`failure`, then `notify`.
//!
//! Values travelling to and from R go through the wire codec in
//! [`deployr_protocol`]: [`encode_native`] for inputs, [`decode_wire`] for
//! the R objects a reply carries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deployr::prelude::*;
//!
//! # async fn run() -> Result<(), DeployrError> {
//! let client = DeployrClient::builder()
//!     .base_url("http://localhost:8000")
//!     .build()?;
//!
//! let handle = client.create_session(
//!     Callback::new()
//!         .on_success(|reply: Reply<String>| {
//!             if let Reply::Brief(session) = reply {
//!                 println!("session {session} created");
//!             }
//!         })
//!         .on_failure(|failure| eprintln!("{failure}")),
//! )?;
//! handle.wait().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod credentials;
pub mod endpoints;
mod error;
mod options;
mod reply;

pub use client::{DEFAULT_BASE_URL, DeployrClient, DeployrClientBuilder};
pub use credentials::hash_password;
pub use error::DeployrError;
pub use options::{ExecOptions, inputs_param};
pub use reply::{Reply, SessionFile, session_files};

pub use deployr_protocol::{self, decode_wire, encode_native};
pub use deployr_transaction::{self, Callback, Response};
pub use deployr_transport::{self, ReqwestTransport, UploadForm};

/// Re-exports of the most commonly used types.
///
/// ```rust
/// use deployr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{DeployrClient, DeployrClientBuilder, DeployrError, ExecOptions, Reply, SessionFile};
    pub use deployr_protocol::{Format, ResponseEnvelope, WireValue, decode_wire, encode_native};
    pub use deployr_transaction::{
        Callback, Completion, Failure, FailureKind, Response, Status, TransactionEvents,
        TransactionHandle, TransactionId,
    };
    pub use deployr_transport::{HttpTransport, ReqwestTransport, UploadForm};
}
