//! Error types shared across the storage engine and the CLI.

use std::fmt;

/// Every failure mode the engine and its CLI can surface.
///
/// `Parse` and `Db` are recoverable: the REPL prints a message and keeps
/// reading commands. `Io` and `Storage` are fatal: they indicate a corrupt
/// file or a broken invariant and the process exits non-zero after logging
/// a diagnostic.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Storage(String),
    Parse(String),
    Db(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Storage(msg) => write!(f, "{}", msg),
            Error::Parse(msg) => write!(f, "{}", msg),
            Error::Db(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

/// Builds an `Error` variant from a format string, e.g. `err!(Storage, "bad
/// page {}", n)`.
#[macro_export]
macro_rules! err {
    ($variant:ident, $($arg:tt)*) => {
        $crate::errors::Error::$variant(format!($($arg)*))
    };
}
