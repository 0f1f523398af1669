//! The relay pipeline: one exchange from inbound frame to outbound
//! ciphertext.
//!
//! Each exchange runs strictly sequentially: validate, decrypt, optional
//! backend round trip, encrypt, respond. The per-exchange IV arrives in the
//! frame header and is reused verbatim for every sealing step of that
//! exchange, including the outbound reply. That reuse is a device-protocol
//! invariant, not an oversight.
//!
//! The pipeline owns no mutable state. The keyring is derived before the
//! first exchange and only ever read, so one pipeline value serves any
//! number of concurrent exchanges.

use std::sync::Arc;

use bytes::Bytes;
use thermoframe_crypto::{DerivedKeySet, decrypt_payload, encrypt_payload};
use thermoframe_proto::{FORMAT_VERSION, Frame, encode_frame};

use crate::backend::Backend;
use crate::error::RelayError;
use crate::hooks::{IdentityHooks, TrafficHooks};
use crate::keyring::Keyring;

/// Reply payload used when no backend is configured.
///
/// The device treats it as a well-formed cloud answer and carries on.
pub const IGNORE_REPLY: &[u8] = br#"{"ignore":0}"#;

/// Body of a finished exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// Sealed payload for the device (binary content type)
    Ciphertext(Bytes),
    /// Human-readable reason the exchange ended (text content type)
    Diagnostic(String),
}

/// Outcome of one exchange, ready for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReply {
    /// HTTP status code to answer with
    pub status: u16,
    /// Response body
    pub body: ReplyBody,
}

/// Orchestrates exchanges between a device and its optional backend.
pub struct RelayPipeline {
    keyring: Keyring,
    backend: Option<Arc<dyn Backend>>,
    hooks: Arc<dyn TrafficHooks>,
}

impl RelayPipeline {
    /// Create a pipeline that answers every exchange locally.
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring, backend: None, hooks: Arc::new(IdentityHooks) }
    }

    /// Forward decrypted exchanges to a backend instead of answering
    /// locally.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the identity transforms with custom hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn TrafficHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Run one exchange over raw request bytes.
    ///
    /// Never fails outward: every error becomes a diagnostic reply, and the
    /// relay is ready for the next exchange regardless of what happened in
    /// this one.
    pub async fn handle(&self, raw: &[u8]) -> ExchangeReply {
        match self.process(raw).await {
            Ok(ciphertext) => ExchangeReply { status: 200, body: ReplyBody::Ciphertext(ciphertext) },
            Err(err) => {
                let status = err.status();
                tracing::warn!(status, error = %err, "exchange failed");
                ExchangeReply { status, body: ReplyBody::Diagnostic(err.to_string()) }
            },
        }
    }

    async fn process(&self, raw: &[u8]) -> Result<Bytes, RelayError> {
        let frame = Frame::decode(raw)?;

        let keys = self
            .keyring
            .resolve(&frame.header.uuid)
            .ok_or_else(|| RelayError::UnknownDevice { uuid: frame.header.uuid.clone() })?;
        let iv = frame.header.eiv;

        let request = decrypt_payload(keys.cipher_key(), keys.auth_key(), &iv, &frame.body)
            .map_err(RelayError::MalformedPayload)?;
        tracing::info!(payload = %String::from_utf8_lossy(&request), "device -> relay");

        let response = match &self.backend {
            None => IGNORE_REPLY.to_vec(),
            Some(backend) => {
                self.round_trip(backend.as_ref(), &frame.header.uuid, keys, &iv, &request).await?
            },
        };

        tracing::info!(payload = %String::from_utf8_lossy(&response), "relay -> device");

        let ciphertext = encrypt_payload(keys.cipher_key(), keys.auth_key(), &iv, &response)
            .map_err(|err| RelayError::Internal(err.to_string()))?;
        Ok(ciphertext.into())
    }

    /// Re-seal the request, POST it to the backend, open the reply.
    ///
    /// The outbound frame carries the relay's fixed format version, not
    /// whatever the device sent; the device firmware does the same.
    async fn round_trip(
        &self,
        backend: &dyn Backend,
        uuid: &str,
        keys: &DerivedKeySet,
        iv: &[u8; 16],
        request: &[u8],
    ) -> Result<Vec<u8>, RelayError> {
        let patched = self.hooks.transform_inbound(request);
        if patched != request {
            tracing::info!(
                before = %String::from_utf8_lossy(request),
                after = %String::from_utf8_lossy(&patched),
                "inbound hook rewrote payload"
            );
        }

        let body = encrypt_payload(keys.cipher_key(), keys.auth_key(), iv, &patched)
            .map_err(|err| RelayError::Internal(err.to_string()))?;
        let forward = encode_frame(uuid, FORMAT_VERSION, iv, &body);

        let reply = backend.forward(forward).await?;
        if !(200..300).contains(&reply.status) {
            return Err(RelayError::BackendStatus { status: reply.status });
        }

        let plaintext = decrypt_payload(keys.cipher_key(), keys.auth_key(), iv, &reply.body)
            .map_err(RelayError::BackendMalformedResponse)?;

        let patched = self.hooks.transform_outbound(&plaintext);
        if patched != plaintext {
            tracing::info!(
                before = %String::from_utf8_lossy(&plaintext),
                after = %String::from_utf8_lossy(&patched),
                "outbound hook rewrote payload"
            );
        }

        Ok(patched)
    }
}
