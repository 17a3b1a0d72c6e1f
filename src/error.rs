use std::io;

use crate::message::PartialMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid octet count: {0}")]
    Framing(&'static str),
    #[error("frame of {length} octets exceeds the limit of {limit}")]
    FrameTooLarge { length: usize, limit: usize },
    #[error("expected character {0:?}")]
    ExpectedChar(char),
    #[error("empty {0} field")]
    EmptyField(&'static str),
    #[error("invalid priority")]
    InvalidPriority,
    #[error("invalid protocol version")]
    InvalidProtocolVersion,
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(&'static str),
    #[error("invalid structured data: {0}")]
    InvalidStructuredData(&'static str),
    #[error("unexpected end of stream")]
    PrematureEndOfStream,
    #[error("unicode error: {0}")]
    Unicode(#[from] std::string::FromUtf8Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of [`Error`], for callers that only care which
/// stage of the decode rejected a message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Framing,
    Format,
    InvalidPriority,
    InvalidProtocolVersion,
    InvalidTimestamp,
    InvalidStructuredData,
    PrematureEndOfStream,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Framing(_) | Error::FrameTooLarge { .. } => ErrorKind::Framing,
            Error::ExpectedChar(_) | Error::EmptyField(_) | Error::Unicode(_) => ErrorKind::Format,
            Error::InvalidPriority => ErrorKind::InvalidPriority,
            Error::InvalidProtocolVersion => ErrorKind::InvalidProtocolVersion,
            Error::InvalidTimestamp(_) => ErrorKind::InvalidTimestamp,
            Error::InvalidStructuredData(_) => ErrorKind::InvalidStructuredData,
            Error::PrematureEndOfStream => ErrorKind::PrematureEndOfStream,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Reading from the source failed, as opposed to the bytes being malformed.
    pub(crate) fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::PrematureEndOfStream,
            _ => Error::Io(err),
        }
    }
}

/// A rejected message: the error that stopped the decode, plus every field
/// decoded before it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ParseError {
    pub error: Error,
    pub partial: Box<PartialMessage>,
}

impl ParseError {
    pub(crate) fn new(error: Error, partial: PartialMessage) -> Self {
        Self {
            error,
            partial: Box::new(partial),
        }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl From<Error> for ParseError {
    fn from(error: Error) -> Self {
        Self::new(error, PartialMessage::default())
    }
}
