use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::model::UnknownSession;

/// The command frame could not be turned into a verb and argument.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed before the {0} frame was received")]
    ConnectionClosed(&'static str),
    #[error("command frame is empty")]
    EmptyCommand,
    #[error("command frame is not text (got a JSON {0})")]
    NotText(&'static str),
    #[error("command frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),
    #[error("command frame is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog line {line}: expected 3 tab-separated fields, found {found}")]
    MalformedLine { line: usize, found: usize },
    #[error("catalog line {line}: {source}")]
    UnknownSession {
        line: usize,
        #[source]
        source: UnknownSession,
    },
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{field} contains a tab or line break")]
    SeparatorInField { field: &'static str },
    #[error("failed to append to registration log: {0}")]
    Io(#[from] io::Error),
}

/// Everything that can end a connection early.
///
/// None of these are reported to the client: the server logs the error and
/// closes the connection without writing a response.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("could not decode {what} frame: {source}")]
    Deserialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("no frame received within {0:?}")]
    Timeout(Duration),
}
