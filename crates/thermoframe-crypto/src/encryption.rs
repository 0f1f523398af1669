//! Authenticated payload sealing for the device transport.
//!
//! The device speaks a fixed MAC-then-encrypt construction:
//!
//! ```text
//! tag = HMAC-MD5(auth_key, plaintext)          (16 bytes)
//! block = tag || plaintext || zero padding     (multiple of 16)
//! ciphertext = AES-128-CBC(cipher_key, iv, block)
//! ```
//!
//! The padding is plain zero bytes, not a reversible scheme: on decrypt the
//! payload text is trimmed of NUL characters at both ends, so plaintext that
//! itself starts or ends with NUL cannot survive a round trip. Interoperating
//! with the fixed-function device firmware requires keeping this exactly as
//! is, including the plain byte-wise tag comparison.
//!
//! The IV is supplied by the device per exchange and is reused for both
//! directions of that exchange; nothing here generates one.

use aes::Aes128;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use md5::Md5;

use crate::error::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacMd5 = Hmac<Md5>;

/// AES block size (16 bytes)
const BLOCK_SIZE: usize = 16;

/// HMAC-MD5 tag size (16 bytes)
const TAG_SIZE: usize = 16;

/// Seal a plaintext payload for one exchange.
///
/// Returns the CBC ciphertext of `tag || plaintext` zero-padded to a whole
/// number of blocks. Sealing the same plaintext under the same keys and IV
/// always produces the same bytes.
///
/// # Errors
///
/// - `KeyLength` if `cipher_key` is not 16 bytes
/// - `IvLength` if `iv` is not 16 bytes
pub fn encrypt_payload(
    cipher_key: &[u8],
    auth_key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let (key, iv) = cipher_params(cipher_key, iv)?;
    let tag = payload_tag(auth_key, plaintext);

    let padded_len = (TAG_SIZE + plaintext.len()).div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    let mut buf = vec![0u8; padded_len];
    buf[..TAG_SIZE].copy_from_slice(&tag);
    buf[TAG_SIZE..TAG_SIZE + plaintext.len()].copy_from_slice(plaintext);

    let msg_len = buf.len();
    let cipher = Aes128CbcEnc::new(&key.into(), &iv.into());
    let Ok(_) = cipher.encrypt_padded_mut::<NoPadding>(&mut buf, msg_len) else {
        unreachable!("buffer length is block-aligned");
    };

    Ok(buf)
}

/// Open a sealed payload and verify its tag.
///
/// Splits the decrypted block into the 16-byte tag and the payload text,
/// trims the zero padding, and recomputes the tag over the trimmed bytes.
///
/// # Errors
///
/// - `KeyLength` / `IvLength` as for [`encrypt_payload`]
/// - `CiphertextLength` if the ciphertext is not a whole number of blocks
/// - `MalformedPlaintext` if the decrypted payload is not valid UTF-8
/// - `AuthenticationFailed` if the recomputed tag differs
pub fn decrypt_payload(
    cipher_key: &[u8],
    auth_key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let (key, iv) = cipher_params(cipher_key, iv)?;

    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::CiphertextLength { len: ciphertext.len() });
    }

    let mut buf = ciphertext.to_vec();
    let cipher = Aes128CbcDec::new(&key.into(), &iv.into());
    let Ok(plain) = cipher.decrypt_padded_mut::<NoPadding>(&mut buf) else {
        unreachable!("ciphertext length is block-aligned");
    };

    // A ciphertext shorter than one block leaves a truncated tag, which can
    // never match the full recomputed one.
    let (tag, rest) = plain.split_at(plain.len().min(TAG_SIZE));

    let text = std::str::from_utf8(rest).map_err(|_| CryptoError::MalformedPlaintext)?;
    let recovered = text.trim_matches('\0').as_bytes();

    // Byte-wise comparison, as the device performs it
    if payload_tag(auth_key, recovered).as_slice() != tag {
        return Err(CryptoError::AuthenticationFailed);
    }

    Ok(recovered.to_vec())
}

fn cipher_params(cipher_key: &[u8], iv: &[u8]) -> Result<([u8; 16], [u8; 16]), CryptoError> {
    let key: [u8; 16] =
        cipher_key.try_into().map_err(|_| CryptoError::KeyLength { len: cipher_key.len() })?;
    let iv: [u8; 16] = iv.try_into().map_err(|_| CryptoError::IvLength { len: iv.len() })?;
    Ok((key, iv))
}

fn payload_tag(auth_key: &[u8], payload: &[u8]) -> [u8; 16] {
    let Ok(mut mac) = HmacMd5::new_from_slice(auth_key) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(payload);
    mac.finalize().into_bytes().into()
}
