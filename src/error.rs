//! Errors surfaced by the codec.

use std::fmt;

use thiserror::Error;

use crate::spec::ElementType;

/// Alias for `Result<T, mongo_bson::error::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised while encoding, decoding or accessing BSON data.
#[derive(Debug)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

/// The failure classes of the codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A key violated the restricted-key rules requested by the caller.
    #[error("invalid key: {message}")]
    InvalidKey { message: String },

    /// Invalid UTF-8 bytes were encountered where a string was required.
    #[error("invalid UTF-8")]
    Utf8Encoding,

    /// The document cannot be represented as BSON.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// An integer fell outside the 64-bit range BSON can carry.
    #[error("integer out of range: {value}")]
    IntegerOutOfRange { value: i128 },

    /// Structurally malformed BSON bytes were encountered while decoding.
    #[error("malformed BSON: {message}")]
    MalformedBytes { message: String },

    /// A tag byte named no known element type.
    #[error("unrecognized element type for key \"{key}\": 0x{element_type:02x}")]
    UnrecognizedElementType { key: String, element_type: u8 },

    /// The input ended before the declared contents did.
    #[error("end of stream")]
    EndOfStream,

    /// A typed document accessor did not find what it expected.
    #[error("an error occurred when attempting to access a document value: {kind}")]
    ValueAccess { kind: ValueAccessErrorKind },

    /// The output buffer could not grow. Fatal to the call.
    #[error("out of memory: buffer allocation failed")]
    OutOfMemory,

    /// A value could not be mapped into BSON through serde.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// A BSON value could not be mapped back out through serde.
    #[error("deserialization error: {message}")]
    Deserialization { message: String },
}

/// The ways a typed accessor like [`Document::get_str`](crate::Document::get_str)
/// can fail.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// No value for the specified key was present in the document.
    #[error("the key was not present in the document")]
    NotPresent,

    /// The value for the specified key did not have the expected type.
    #[error("expected type {expected:?}, got type {actual:?}")]
    UnexpectedType {
        actual: ElementType,
        expected: ElementType,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn invalid_key(message: impl ToString) -> Self {
        ErrorKind::InvalidKey {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_document(message: impl ToString) -> Self {
        ErrorKind::InvalidDocument {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn document_too_large(size: usize) -> Self {
        Self::invalid_document(format!(
            "document is too large: {} bytes exceed the {} byte limit",
            size,
            crate::spec::MAX_DOCUMENT_SIZE
        ))
    }

    pub(crate) fn malformed(message: impl ToString) -> Self {
        ErrorKind::MalformedBytes {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn value_access_not_present() -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent,
        }
        .into()
    }

    pub(crate) fn value_access_unexpected_type(actual: ElementType, expected: ElementType) -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { actual, expected },
        }
        .into()
    }

    /// Whether this error carries the given key context.
    #[cfg(test)]
    pub(crate) fn is_at_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ErrorKind::Serialization {
            message: msg.to_string(),
        }
        .into()
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ErrorKind::Deserialization {
            message: msg.to_string(),
        }
        .into()
    }
}
