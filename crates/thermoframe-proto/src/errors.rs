//! Frame parsing error types.
//!
//! One variant per validation branch so the relay can answer each failure
//! with its own diagnostic. The variants are listed in the order the checks
//! run during [`crate::Frame::decode`].

use thiserror::Error;

/// Errors that can occur while parsing a wire frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No `}` byte anywhere, so the frame has no complete JSON header
    #[error("frame has no JSON header")]
    Truncated,

    /// The bytes up to the first `}` are not a valid JSON object
    #[error("frame header is not valid JSON")]
    MalformedHeader,

    /// Header parsed but carries no `uuid` field
    ///
    /// The relay reports this case as informational, not as a hard
    /// failure: devices probe their cloud endpoint with uuid-less frames.
    #[error("no uuid in frame header")]
    MissingUuid,

    /// Header parsed but carries no `eiv` field
    #[error("no eiv in frame header")]
    MissingEiv,

    /// `eiv` is not exactly 32 hex characters (16 bytes)
    #[error("eiv must be 32 hex characters, got {len}")]
    IvLength {
        /// Character count of the `eiv` value that was supplied
        len: usize,
    },

    /// `uuid` is not a hex string
    #[error("uuid is not a hex string")]
    UuidNotHex,

    /// `eiv` is not a hex string
    #[error("eiv is not a hex string")]
    IvNotHex,
}
