///
/// Cursor codec helpers.
///
/// This module owns the opaque wire-token format used for connection
/// cursors: standard base64 over the JSON array
/// `[entity_type, entity_id, sort_key, sort_value]`.
/// It contains only token encoding/decoding logic and no query semantics.
///
use crate::{key::Key, value::Value};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

// Decode bound for untrusted cursor token input.
pub(crate) const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

///
/// CursorDecodeError
///

#[derive(Debug, Eq, ThisError, PartialEq)]
pub enum CursorDecodeError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token is not valid base64")]
    InvalidBase64,

    #[error("cursor payload is malformed: {reason}")]
    InvalidPayload { reason: String },
}

///
/// CursorWire
/// Positional tuple so the serialized form stays field-order stable.
///

#[derive(Deserialize, Serialize)]
pub(super) struct CursorWire(
    pub(super) String,
    pub(super) Key,
    pub(super) String,
    pub(super) Value,
);

pub(super) fn encode_wire(wire: &CursorWire) -> String {
    // Serializing owned strings, keys, and values into a Vec cannot fail.
    let payload = serde_json::to_vec(wire).unwrap_or_default();
    STANDARD.encode(payload)
}

/// Decode a cursor token into its wire tuple.
///
/// The token may include surrounding whitespace, which is trimmed.
pub(super) fn decode_wire(token: &str) -> Result<CursorWire, CursorDecodeError> {
    let token = token.trim();

    if token.is_empty() {
        return Err(CursorDecodeError::Empty);
    }

    if token.len() > MAX_CURSOR_TOKEN_LEN {
        return Err(CursorDecodeError::TooLong {
            len: token.len(),
            max: MAX_CURSOR_TOKEN_LEN,
        });
    }

    let bytes = STANDARD
        .decode(token)
        .map_err(|_| CursorDecodeError::InvalidBase64)?;

    serde_json::from_slice(&bytes).map_err(|err| CursorDecodeError::InvalidPayload {
        reason: err.to_string(),
    })
}
