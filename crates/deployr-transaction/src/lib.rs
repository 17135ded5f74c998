//! Asynchronous transactions for the DeployR client.
//!
//! Every API call the client makes is one *transaction*: a
//! [`RequestDescriptor`] goes in, exactly one of the caller's
//! `success`/`failure` handlers comes out, followed by `notify`.
//!
//! # How a reply is classified
//!
//! | Reply | Outcome |
//! |---|---|
//! | non-200 status, or no reply at all | `failure`, [`FailureKind::Transport`] |
//! | 200, `format=text` | `success` with [`Response::Text`] |
//! | 200, envelope with `success: true` | `success` with [`Response::Json`] |
//! | 200, envelope with `success: false` | `failure`, [`FailureKind::Application`] |
//! | 200, body is not an envelope | `failure`, [`FailureKind::Parse`] |
//! | upload, empty body | `failure`, [`FailureKind::Upload`] |
//! | upload, envelope body | `success` with [`Response::Json`] |
//!
//! `notify` runs after every one of them.
//!
//! # Example
//!
//! ```no_run
//! use deployr_transaction::{
//!     Callback, RequestDescriptor, Response, TransactionConfig, TransactionManager,
//! };
//! use deployr_transport::ReqwestTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::new("http://localhost:8000")?;
//! let manager = TransactionManager::new(transport, TransactionConfig::default());
//!
//! let handle = manager.dispatch(
//!     RequestDescriptor::post("/r/session/create"),
//!     Callback::new()
//!         .on_success(|response: Response| println!("{:?}", response.field("session")))
//!         .on_failure(|failure| eprintln!("{failure}"))
//!         .on_notify(|_| println!("done")),
//! )?;
//! handle.wait().await;
//! # Ok(())
//! # }
//! ```

mod callback;
mod config;
mod descriptor;
mod events;
mod failure;
mod manager;
mod response;
mod state;

pub use callback::{Callback, Completion};
pub use config::{DEFAULT_BASE_PATH, DEFAULT_TIMEOUT, TransactionConfig};
pub use descriptor::{RequestDescriptor, flatten_params, query_string};
pub use events::{EventRegistration, TransactionEvents};
pub use failure::{DispatchError, Failure, FailureKind, Status, TransactionError};
pub use manager::{TransactionHandle, TransactionManager};
pub use response::Response;
pub use state::{TransactionId, TransactionState};
