use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification.
/// Module-level errors convert into this at the crate boundary.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a connection-origin unsupported error.
    pub(crate) fn connection_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Connection, message)
    }

    /// Construct a connection-origin invalid-input error.
    pub(crate) fn connection_input(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Connection, message)
    }

    /// Construct a config-origin invalid-input error.
    pub(crate) fn config_input(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Config, message)
    }

    /// Construct a store-origin internal error.
    pub(crate) fn store_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Store, message)
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.class, ErrorClass::Unsupported)
    }

    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self.class, ErrorClass::InvalidInput)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// A code path asked for something nobody registered (e.g. a sort key).
    Unsupported,
    /// Caller-supplied arguments are malformed or contradictory.
    InvalidInput,
    InvariantViolation,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsupported => "unsupported",
            Self::InvalidInput => "invalid_input",
            Self::InvariantViolation => "invariant_violation",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Cursor,
    Connection,
    Store,
    Access,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Cursor => "cursor",
            Self::Connection => "connection",
            Self::Store => "store",
            Self::Access => "access",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
