//! Key derivation from a device identity and a shared secret.
//!
//! The device derives two independent 16-byte keys from its provisioning
//! secret:
//!
//! ```text
//! identity ──▶ salt (last 8 bytes)
//!                  │
//!                  ▼
//! secret ──▶ HMAC-SHA1 fold (1000 rounds) ──▶ cipher key (16 bytes)
//!
//! secret[..8] ──▶ MD5 ──▶ auth key (16 bytes)
//! ```
//!
//! The cipher-key fold is a single-block PBKDF2-HMAC-SHA1 with the block
//! counter fixed at 1 and the 20-byte output truncated to 16. The iteration
//! count is a parameter so compatibility vectors with other counts can be
//! checked; the device uses [`DEFAULT_KDF_ITERATIONS`].
//!
//! Derivation is pure: same inputs always produce the same keys.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use zeroize::Zeroize;

use crate::error::CryptoError;

type HmacSha1 = Hmac<Sha1>;

/// Iteration count the device firmware uses for the cipher-key fold.
pub const DEFAULT_KDF_ITERATIONS: u32 = 1000;

/// Extract the 8-byte KDF salt from a device identity.
///
/// An identity of exactly 8 bytes is the salt; longer identities contribute
/// their last 8 bytes.
///
/// # Errors
///
/// - `IdentityTooShort` if the identity has fewer than 8 bytes
pub fn derive_salt(identity: &[u8]) -> Result<[u8; 8], CryptoError> {
    let tail = identity
        .len()
        .checked_sub(8)
        .ok_or(CryptoError::IdentityTooShort { len: identity.len() })?;

    let mut salt = [0u8; 8];
    salt.copy_from_slice(&identity[tail..]);
    Ok(salt)
}

/// Derive the 16-byte AES key from a device identity and the shared secret.
///
/// Computes `U1 = HMAC-SHA1(secret, salt || 0x00000001)` and XOR-folds
/// `U_{i+1} = HMAC-SHA1(secret, U_i)` into it for `iterations` rounds total,
/// then truncates to 16 bytes. An iteration count of 0 or 1 yields `U1[..16]`
/// unchanged.
///
/// # Errors
///
/// - `IdentityTooShort` if the identity has fewer than 8 bytes
pub fn derive_cipher_key(
    identity: &[u8],
    secret: &[u8],
    iterations: u32,
) -> Result<[u8; 16], CryptoError> {
    let salt = derive_salt(identity)?;

    // salt || big-endian block counter, fixed at block 1
    let mut block = [0u8; 12];
    block[..8].copy_from_slice(&salt);
    block[8..].copy_from_slice(&1u32.to_be_bytes());

    let mut acc = prf(secret, &block);
    let mut round = acc;

    for _ in 1..iterations {
        round = prf(secret, &round);
        for (a, r) in acc.iter_mut().zip(round.iter()) {
            *a ^= *r;
        }
    }

    let mut key = [0u8; 16];
    key.copy_from_slice(&acc[..16]);

    acc.zeroize();
    round.zeroize();

    Ok(key)
}

/// Derive the 16-byte payload-authentication key from the shared secret.
///
/// The digest input is the first 8 bytes of the secret; a shorter secret is
/// hashed whole. No salt, no iteration.
pub fn derive_auth_key(secret: &[u8]) -> [u8; 16] {
    let head = secret.get(..8).unwrap_or(secret);

    let mut md5 = Md5::new();
    md5.update(head);
    md5.finalize().into()
}

fn prf(secret: &[u8], message: &[u8]) -> [u8; 20] {
    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// The two keys derived for one device identity.
///
/// Computed once per (identity, secret) pair and immutable afterwards, so a
/// key set can be shared read-only across all exchanges with that device.
/// Key material is zeroized on drop.
#[derive(Clone)]
pub struct DerivedKeySet {
    /// AES-128 key for the payload cipher
    cipher_key: [u8; 16],
    /// HMAC-MD5 key for the payload tag
    auth_key: [u8; 16],
}

impl DerivedKeySet {
    /// Derive both keys for a device using the firmware iteration count.
    ///
    /// # Errors
    ///
    /// - `IdentityTooShort` if the identity has fewer than 8 bytes
    pub fn derive(identity: &[u8], secret: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            cipher_key: derive_cipher_key(identity, secret, DEFAULT_KDF_ITERATIONS)?,
            auth_key: derive_auth_key(secret),
        })
    }

    /// 16-byte AES-128 key for the payload cipher.
    pub fn cipher_key(&self) -> &[u8; 16] {
        &self.cipher_key
    }

    /// 16-byte HMAC-MD5 key for the payload tag.
    pub fn auth_key(&self) -> &[u8; 16] {
        &self.auth_key
    }
}

// Key material never appears in logs
impl std::fmt::Debug for DerivedKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKeySet(..)")
    }
}

impl Drop for DerivedKeySet {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
        self.auth_key.zeroize();
    }
}
