//! Frame type and wire codec.
//!
//! A frame is the wire unit of the cloud protocol:
//!
//! ```text
//! {"uuid":"<hex>","format_ver":"<text>","eiv":"<32 hex chars>"}<ciphertext>
//! ```
//!
//! A plaintext JSON header immediately followed by the opaque ciphertext
//! body. There is no length field and no delimiter; the receiver scans for
//! the first `}` byte to find the header boundary. The header values are
//! written verbatim with no JSON string escaping, which the device never
//! needs: `uuid` and `eiv` are hex text and `format_ver` is a short decimal
//! literal.
//!
//! # Invariants
//!
//! - `eiv` is always exactly 16 bytes (32 hex characters on the wire).
//! - Decoding validates the header only; the body stays opaque bytes and is
//!   authenticated later by the payload codec.

use bytes::Bytes;
use hex::FromHex;
use serde::Deserialize;

use crate::errors::FrameError;

/// Format version literal stamped on every frame this side builds.
pub const FORMAT_VERSION: &str = "102";

/// Wire length of the `eiv` header field in hex characters.
const EIV_HEX_LEN: usize = 32;

/// Parsed frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Device identity, hex text as transmitted
    pub uuid: String,
    /// Protocol format version, carried opaquely when present
    pub format_ver: Option<String>,
    /// Per-exchange initialization vector
    pub eiv: [u8; 16],
}

/// Complete wire frame: parsed header plus opaque ciphertext body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,
    /// Raw ciphertext bytes (everything after the header's `}`)
    pub body: Bytes,
}

/// Header fields as they appear in the JSON text.
///
/// Values are kept as raw JSON so a field of the wrong type fails its own
/// validation step instead of failing the whole parse.
#[derive(Debug, Deserialize)]
struct RawHeader {
    uuid: Option<serde_json::Value>,
    format_ver: Option<serde_json::Value>,
    eiv: Option<serde_json::Value>,
}

/// Serialize a frame for the wire.
///
/// Emits the literal header with its fixed key order (`uuid`, `format_ver`,
/// `eiv`), the IV as lower-case hex, and the body appended directly after
/// the closing brace.
pub fn encode_frame(uuid: &str, format_ver: &str, eiv: &[u8; 16], body: &[u8]) -> Vec<u8> {
    let header = format!(
        r#"{{"uuid":"{uuid}","format_ver":"{format_ver}","eiv":"{eiv}"}}"#,
        eiv = hex::encode(eiv),
    );

    let mut frame = Vec::with_capacity(header.len() + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(body);
    frame
}

impl Frame {
    /// Parse a frame from wire bytes.
    ///
    /// Validation runs in a fixed order so every malformed frame maps to one
    /// stable diagnostic: header boundary, JSON syntax, `uuid` presence,
    /// `eiv` presence, `eiv` length, `uuid` hex, `eiv` hex.
    ///
    /// # Errors
    ///
    /// One [`FrameError`] variant per failed check; see [`crate::FrameError`].
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let close = bytes.iter().position(|&b| b == b'}').ok_or(FrameError::Truncated)?;
        let boundary = close + 1;

        let raw: RawHeader =
            serde_json::from_slice(&bytes[..boundary]).map_err(|_| FrameError::MalformedHeader)?;

        let uuid_field = raw.uuid.ok_or(FrameError::MissingUuid)?;
        let eiv_field = raw.eiv.ok_or(FrameError::MissingEiv)?;

        let eiv_text = eiv_field.as_str().ok_or(FrameError::IvNotHex)?;
        if eiv_text.len() != EIV_HEX_LEN {
            return Err(FrameError::IvLength { len: eiv_text.len() });
        }

        let uuid = uuid_field.as_str().ok_or(FrameError::UuidNotHex)?;
        hex::decode(uuid).map_err(|_| FrameError::UuidNotHex)?;

        let eiv = <[u8; 16]>::from_hex(eiv_text).map_err(|_| FrameError::IvNotHex)?;

        let format_ver =
            raw.format_ver.as_ref().and_then(serde_json::Value::as_str).map(str::to_owned);

        Ok(Self {
            header: FrameHeader { uuid: uuid.to_owned(), format_ver, eiv },
            body: Bytes::copy_from_slice(&bytes[boundary..]),
        })
    }
}
