//! Identity-to-key-set registry.

use std::collections::HashMap;

use thermoframe_crypto::{CryptoError, DerivedKeySet};

/// Registry of derived key sets, one per provisioned device identity.
///
/// Provisioned once at startup and read-only afterwards, so the keyring can
/// be shared across concurrently handled exchanges without synchronization:
/// no field of a [`DerivedKeySet`] is ever mutated after derivation.
///
/// Derivation runs the full HMAC fold (1000 rounds per device), which is why
/// it happens here once and not per exchange.
#[derive(Debug, Default)]
pub struct Keyring {
    devices: HashMap<String, DerivedKeySet>,
}

impl Keyring {
    /// Create an empty keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive and store the key set for a device.
    ///
    /// The identity is the uuid exactly as the device transmits it; the salt
    /// comes from its text bytes. Provisioning the same uuid twice replaces
    /// the earlier key set.
    ///
    /// # Errors
    ///
    /// - `IdentityTooShort` if the uuid has fewer than 8 bytes of text
    pub fn provision(&mut self, uuid: &str, secret: &[u8]) -> Result<(), CryptoError> {
        let keys = DerivedKeySet::derive(uuid.as_bytes(), secret)?;
        self.devices.insert(uuid.to_owned(), keys);
        Ok(())
    }

    /// Look up the key set for a frame's identity.
    pub fn resolve(&self, uuid: &str) -> Option<&DerivedKeySet> {
        self.devices.get(uuid)
    }

    /// Number of provisioned devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device has been provisioned.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
