//! Thermoframe Wire Protocol
//!
//! Frame codec for the thermostat cloud protocol. The wire unit is a
//! plaintext JSON header glued directly to an opaque ciphertext body:
//!
//! ```text
//! {"uuid":"aabbccddeeff","format_ver":"102","eiv":"<32 hex>"}<ciphertext>
//! ```
//!
//! Both directions of the protocol use the same framing. This crate only
//! parses and validates the header; sealing and opening the body is the
//! job of `thermoframe-crypto`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod frame;

pub use errors::FrameError;
pub use frame::{FORMAT_VERSION, Frame, FrameHeader, encode_frame};
