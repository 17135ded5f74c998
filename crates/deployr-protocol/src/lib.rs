//! Wire protocol for the DeployR client.
//!
//! This crate defines the "language" the client and the DeployR server
//! speak:
//!
//! - **Types** ([`ResponseEnvelope`], [`Format`]): the reply envelope
//!   every `format=json` call comes back in.
//! - **Wire values** ([`WireValue`], [`encode_native`], [`decode_wire`]):
//!   the tagged representation of R objects.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): text encoding of the above.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (HTTP bodies) → Protocol (envelopes, wire values) → Transaction (callbacks)
//! ```

mod codec;
mod error;
mod types;
mod wire;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{EnvelopeBody, Format, ResponseEnvelope, ServerResponse};
pub use wire::{WireValue, decode_wire, encode_native, encode_optional, to_wire};
