//! Relay error types.

use thermoframe_crypto::CryptoError;
use thermoframe_proto::FrameError;
use thiserror::Error;

/// Errors that can terminate one exchange.
///
/// Every variant surfaces to the device as a short diagnostic; none of them
/// is retried and none of them stops the relay from serving the next
/// exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The inbound bytes are not a valid frame.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// No shared secret is provisioned for the frame's identity.
    #[error("no key material to serve uuid \"{uuid}\"")]
    UnknownDevice {
        /// Identity the frame named
        uuid: String,
    },

    /// The frame body did not decrypt and authenticate under the device
    /// keys.
    #[error("malformed payload after frame header")]
    MalformedPayload(#[source] CryptoError),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    BackendStatus {
        /// HTTP status the backend answered with
        status: u16,
    },

    /// The backend could not be reached at all.
    ///
    /// Not part of the device protocol proper; reported like every other
    /// exchange failure instead of being dropped.
    #[error("backend unreachable: {reason}")]
    BackendUnreachable {
        /// Transport-level failure description
        reason: String,
    },

    /// The backend answered 200 but its body did not decrypt.
    #[error("backend returned a malformed response")]
    BackendMalformedResponse(#[source] CryptoError),

    /// Sealing the outbound payload failed.
    ///
    /// Cannot happen with keys and IV that already passed validation;
    /// indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// HTTP status this failure is reported with.
    ///
    /// A frame without a `uuid` is informational (devices probe their cloud
    /// endpoint that way) and answered 200; everything else is a 400.
    pub fn status(&self) -> u16 {
        match self {
            Self::Frame(FrameError::MissingUuid) => 200,
            _ => 400,
        }
    }
}
