//! Fuzz target for decrypt_payload
//!
//! This fuzzer tests payload opening with arbitrary ciphertext to find:
//! - Panics on ragged or short inputs
//! - Tag/padding handling bugs
//! - Inputs that authenticate without a valid tag
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermoframe_crypto::decrypt_payload;

fuzz_target!(|data: &[u8]| {
    let cipher_key = [0x07u8; 16];
    let auth_key = [0xd5u8; 16];
    let iv = [0x42u8; 16];

    // This should never panic, only return Err for invalid ciphertext
    let _ = decrypt_payload(&cipher_key, &auth_key, &iv, data);
});
