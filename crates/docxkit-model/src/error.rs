//! Error types for document model operations

use thiserror::Error;

/// Broad classification of a [`DocxError`], stable across context wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad argument, out-of-range value or cross-field conflict
    Validation,
    /// Lookup miss by ID or key
    NotFound,
    /// Operation attempted on a structurally empty or inconsistent document
    InvalidState,
    /// Byte read/write failure
    Io,
    /// Feature intentionally not implemented
    Unsupported,
    /// Unexpected failure from a lower layer
    Internal,
}

/// Errors that can occur while building or inspecting a document
#[derive(Error, Debug)]
pub enum DocxError {
    /// Invalid argument or value
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field or argument
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// Entity or key not found
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind of entity looked up ("relationship", "media", "style", ...)
        kind: &'static str,
        /// The key that missed
        key: String,
    },

    /// Document is not in a state that permits the operation
    #[error("invalid document state: {0}")]
    InvalidState(String),

    /// Error reading or writing bytes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported feature
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// Image decoding failed
    #[error("image decoding failed: {0}")]
    Image(#[from] ::image::ImageError),

    /// Unexpected lower-layer failure
    #[error("internal error: {0}")]
    Internal(String),

    /// A failure annotated with the operation that produced it
    #[error("{operation}: {source}")]
    Context {
        /// Name of the failing operation (e.g. "add_image")
        operation: &'static str,
        /// The original failure
        #[source]
        source: Box<DocxError>,
    },
}

impl DocxError {
    /// Shorthand for a validation failure
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a lookup miss
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Classify this error, looking through any context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Io(_) => ErrorKind::Io,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Image(_) | Self::Internal(_) => ErrorKind::Internal,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// The innermost error beneath any context wrappers
    pub fn root(&self) -> &DocxError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Wrap this error with the name of the failing operation
    pub fn context(self, operation: &'static str) -> Self {
        Self::Context {
            operation,
            source: Box::new(self),
        }
    }
}

/// Attach operation names to fallible results
pub trait ResultExt<T> {
    /// Wrap the error (if any) with the failing operation's name
    fn context(self, operation: &'static str) -> Result<T>;
}

impl<T, E: Into<DocxError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, operation: &'static str) -> Result<T> {
        self.map_err(|e| e.into().context(operation))
    }
}

/// Result type for document model operations
pub type Result<T> = std::result::Result<T, DocxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kind_looks_through_context() {
        let err = DocxError::not_found("media", "media7")
            .context("register_image")
            .context("add_image");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err.root(), DocxError::NotFound { key, .. } if key == "media7"));
    }

    #[test]
    fn test_context_preserves_source_chain() {
        let result: Result<()> = Err(DocxError::validation("size", "too small"));
        let err = result.context("set_size").unwrap_err();

        assert_eq!(err.to_string(), "set_size: invalid size: too small");
        let source = err.source().expect("context should expose its cause");
        assert_eq!(source.to_string(), "invalid size: too small");
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let result: std::result::Result<(), std::io::Error> = Err(io);
        let err = result.context("read_image").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
