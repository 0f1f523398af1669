//! Crypto error types.
//!
//! Defines the failure modes of key derivation and the authenticated
//! payload codec:
//! - `IdentityTooShort`: device identity has fewer than 8 bytes of salt
//!   material
//! - `KeyLength` / `IvLength` / `CiphertextLength`: caller-supplied buffer
//!   has the wrong size
//! - `MalformedPlaintext`: decrypted bytes are not valid text
//! - `AuthenticationFailed`: payload tag does not match

use thiserror::Error;

/// Errors that can occur during key derivation or payload sealing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Device identity too short to extract an 8-byte salt
    #[error("identity too short for salt: {len} bytes, need at least 8")]
    IdentityTooShort {
        /// Length of the identity that was supplied
        len: usize,
    },

    /// Cipher key is not exactly 16 bytes
    #[error("cipher key must be 16 bytes, got {len}")]
    KeyLength {
        /// Length of the key that was supplied
        len: usize,
    },

    /// Initialization vector is not exactly 16 bytes
    #[error("iv must be 16 bytes, got {len}")]
    IvLength {
        /// Length of the IV that was supplied
        len: usize,
    },

    /// Ciphertext length is not a whole number of cipher blocks
    #[error("ciphertext length {len} is not a multiple of 16")]
    CiphertextLength {
        /// Length of the ciphertext that was supplied
        len: usize,
    },

    /// Decrypted payload is not valid UTF-8 text
    ///
    /// The device protocol carries JSON text; anything else after stripping
    /// the padding means the keys or the IV are wrong.
    #[error("decrypted payload is not valid text")]
    MalformedPlaintext,

    /// Recomputed payload tag does not match the transmitted one
    #[error("payload authentication failed")]
    AuthenticationFailed,
}
