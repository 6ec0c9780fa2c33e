use hearth_core::{
    config::ConfigError,
    db::{
        DbError,
        connection::{ConnectionError, RegistryError},
        store::StoreError,
    },
    error::{ErrorOrigin as CoreErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(ErrorKind::Internal, err.origin.into(), err.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        if matches!(err, ConnectionError::Store(_)) {
            return InternalError::from(err).into();
        }

        let kind = match &err {
            ConnectionError::UnsupportedSortKey { .. } => ConnectionErrorKind::UnsupportedSortKey,
            ConnectionError::MissingParent(_) | ConnectionError::UnexpectedParent(_) => {
                ConnectionErrorKind::InvalidTarget
            }
            _ => ConnectionErrorKind::InvalidArguments,
        };

        Self::new(
            ErrorKind::Connection(kind),
            ErrorOrigin::Connection,
            err.to_string(),
        )
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ConnectionNotFound(_) => Self::new(
                ErrorKind::Connection(ConnectionErrorKind::NotFound),
                ErrorOrigin::Connection,
                err.to_string(),
            ),
            RegistryError::ConnectionAlreadyRegistered(_) => {
                Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
            }
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        InternalError::from(err).into()
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(e) => e.into(),
            DbError::RegistryError(e) => e.into(),
            DbError::StoreError(e) => e.into(),
        }
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Connection(ConnectionErrorKind),

    /// Configuration could not be read, parsed, or validated.
    Config,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ConnectionErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ConnectionErrorKind {
    /// No connection is registered under the requested name.
    NotFound,

    /// The connection does not define the requested sort key.
    UnsupportedSortKey,

    /// Pagination arguments are contradictory or out of bounds.
    InvalidArguments,

    /// Parent scope does not match the connection definition.
    InvalidTarget,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Access,
    Config,
    Connection,
    Cursor,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Access => Self::Access,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Connection => Self::Connection,
            CoreErrorOrigin::Cursor => Self::Cursor,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

///
/// TESTS
///
