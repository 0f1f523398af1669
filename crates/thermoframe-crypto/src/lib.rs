//! Thermoframe Cryptographic Primitives
//!
//! The fixed cryptographic construction of the thermostat cloud protocol.
//! Pure functions with deterministic outputs; nothing here touches an RNG,
//! the device supplies the per-exchange IV.
//!
//! # Key Lifecycle
//!
//! Both transport keys are derived once per device from its identity and the
//! provisioning secret, and never rotate:
//!
//! ```text
//! Device Identity ──┐
//!                   ├─▶ HMAC-SHA1 fold ──▶ Cipher Key (AES-128-CBC)
//! Shared Secret ────┤
//!                   └─▶ MD5(secret[..8]) ─▶ Auth Key (HMAC-MD5 tags)
//! ```
//!
//! A [`DerivedKeySet`] is immutable after derivation and can be shared
//! read-only across every exchange with that device.
//!
//! # Compatibility
//!
//! This is a bespoke MAC-then-encrypt construction fixed by the device
//! firmware, not a general-purpose design. Byte-exact interoperation takes
//! precedence over hardening: the zero padding, the NUL trim on decrypt, and
//! the plain tag comparison all match the peer and must stay that way.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod encryption;
mod error;
mod kdf;

pub use encryption::{decrypt_payload, encrypt_payload};
pub use error::CryptoError;
pub use kdf::{
    DEFAULT_KDF_ITERATIONS, DerivedKeySet, derive_auth_key, derive_cipher_key, derive_salt,
};
