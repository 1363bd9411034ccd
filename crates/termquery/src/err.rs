//! Helper module with this crate's error type.
//!
//! Query errors come in two flavors. Recoverable errors, i.e., timeouts,
//! unparseable replies, and pathologically long replies, affect one query only
//! and are tallied by the session's error counter. All other errors are fatal
//! for the session. Errors seamlessly convert to and from I/O errors.

/// The enumeration of error kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raw mode could not be applied and verified.
    SetupFailure,
    /// The guard query's reply did not arrive in time.
    Timeout,
    /// A reply arrived but matches neither color grammar.
    Unparseable,
    /// A query was issued without an open session.
    Uninitialized,
    /// The accumulated reply grew beyond the configured limit without
    /// completing the guard.
    PathologicalResponse,
    /// An error reading from or writing to the terminal.
    Unreadable,
}

impl ErrorKind {
    /// Turn the error kind to an error message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetupFailure => "could not put terminal into query mode",
            Self::Timeout => "terminal did not reply before the timeout",
            Self::Unparseable => "terminal reply is not a color",
            Self::Uninitialized => "terminal session is not open",
            Self::PathologicalResponse => "terminal reply is pathologically long",
            Self::Unreadable => "error accessing terminal",
        }
    }

    /// Determine whether the error affects a single query only.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Unparseable | Self::PathologicalResponse
        )
    }
}

impl From<ErrorKind> for std::io::Error {
    fn from(value: ErrorKind) -> Self {
        Error::from(value).into()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { kind, source: None }
    }
}

/// A terminal query error.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<std::io::Error>,
}

impl Error {
    /// Create a new unreadable error.
    pub fn unreadable(source: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Unreadable,
            source: Some(source),
        }
    }

    /// Create a new setup failure that wraps the causing I/O error.
    pub fn setup(source: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::SetupFailure,
            source: Some(source),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Determine whether the error affects a single query only.
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind.as_str())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.source {
            Some(ref error) => Some(error),
            None => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::unreadable(value)
    }
}

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        use self::ErrorKind::*;

        match value.kind {
            Unparseable | PathologicalResponse => Self::new(std::io::ErrorKind::InvalidData, value),
            Timeout => Self::new(std::io::ErrorKind::TimedOut, value),
            SetupFailure => Self::new(std::io::ErrorKind::Unsupported, value),
            Uninitialized => Self::new(std::io::ErrorKind::NotConnected, value),
            Unreadable => {
                if let Some(error) = value.source {
                    error
                } else {
                    Self::new(std::io::ErrorKind::Other, value)
                }
            }
        }
    }
}

/// The result type for terminal queries.
pub type Result<T> = std::result::Result<T, Error>;
