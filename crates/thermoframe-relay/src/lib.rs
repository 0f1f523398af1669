//! Thermoframe relay.
//!
//! Sits between a thermostat and its cloud endpoint, transparently
//! decrypting, optionally inspecting or rewriting, and re-encrypting the
//! traffic in both directions.
//!
//! # Architecture
//!
//! [`RelayPipeline`] is the transport-agnostic orchestrator: it consumes raw
//! request bytes and produces an [`ExchangeReply`], one exchange at a time.
//! The HTTP pieces around it are thin glue — [`router`] adapts the pipeline
//! to an axum listener, [`HttpBackend`] adapts the cloud endpoint to the
//! [`Backend`] seam.
//!
//! # Components
//!
//! - [`Keyring`]: identity → derived key set, provisioned once at startup
//! - [`RelayPipeline`]: decrypt → optional backend round trip → encrypt
//! - [`TrafficHooks`]: injectable plaintext transforms, identity by default
//! - [`Backend`] / [`HttpBackend`]: the cloud endpoint collaborator

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backend;
mod error;
mod hooks;
mod http;
mod keyring;
mod pipeline;

pub use backend::{Backend, BackendReply, HttpBackend};
pub use error::RelayError;
pub use hooks::{IdentityHooks, TrafficHooks};
pub use http::router;
pub use keyring::Keyring;
pub use pipeline::{ExchangeReply, IGNORE_REPLY, RelayPipeline, ReplyBody};
