//! Module: cursor
//! Responsibility: opaque resume tokens for connection pagination.
//! Does not own: how a resume point is applied to a query.
//! Boundary: minted per edge by the connection layer, replayed by clients.

mod codec;


pub use codec::CursorDecodeError;

use crate::{
    key::Key,
    obs::sink::{CursorOutcome, MetricsEvent, record},
    value::Value,
};
use codec::{CursorWire, decode_wire, encode_wire};

///
/// Cursor
///
/// Immutable resume point in a sorted collection. Valid only for the
/// `(entity_type, sort_key)` pair it was minted for.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cursor {
    entity_type: String,
    entity_id: Key,
    sort_key: String,
    sort_value: Value,
}

impl Cursor {
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: Key,
        sort_key: impl Into<String>,
        sort_value: Value,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
            sort_key: sort_key.into(),
            sort_value,
        }
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub const fn entity_id(&self) -> &Key {
        &self.entity_id
    }

    #[must_use]
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    #[must_use]
    pub const fn sort_value(&self) -> &Value {
        &self.sort_value
    }

    /// Serialize into an opaque token. Identical cursors yield byte-identical tokens.
    #[must_use]
    pub fn encode(&self) -> String {
        encode_wire(&CursorWire(
            self.entity_type.clone(),
            self.entity_id.clone(),
            self.sort_key.clone(),
            self.sort_value.clone(),
        ))
    }

    /// Strict decode, reporting why a token was refused.
    pub fn try_decode(token: &str) -> Result<Self, CursorDecodeError> {
        let CursorWire(entity_type, entity_id, sort_key, sort_value) = decode_wire(token)?;

        Ok(Self {
            entity_type,
            entity_id,
            sort_key,
            sort_value,
        })
    }

    /// Lenient decode: malformed tokens yield `None` so callers fall back
    /// to the first page instead of failing the request.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        match Self::try_decode(token) {
            Ok(cursor) => Some(cursor),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring undecodable cursor");
                record(MetricsEvent::Cursor {
                    outcome: CursorOutcome::Rejected,
                });
                None
            }
        }
    }

    #[must_use]
    pub fn is_valid_for(&self, sort_key: &str, entity_type: &str) -> bool {
        self.sort_key == sort_key && self.entity_type == entity_type
    }
}

/// Decode a client token and keep it only if it belongs to this collection and sort.
#[must_use]
pub fn decode_for(token: Option<&str>, sort_key: &str, entity_type: &str) -> Option<Cursor> {
    let cursor = Cursor::decode(token?)?;

    if cursor.is_valid_for(sort_key, entity_type) {
        record(MetricsEvent::Cursor {
            outcome: CursorOutcome::Accepted,
        });
        Some(cursor)
    } else {
        tracing::debug!(
            cursor_entity_type = cursor.entity_type(),
            cursor_sort_key = cursor.sort_key(),
            entity_type,
            sort_key,
            "ignoring cursor minted for another collection"
        );
        record(MetricsEvent::Cursor {
            outcome: CursorOutcome::Incompatible,
        });
        None
    }
}
