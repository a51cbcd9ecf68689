//! Error types for OOXML operations

use docxkit_model::{DocxError, ErrorKind};
use thiserror::Error;

/// Errors that can occur while packaging or reading a package
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing or writing XML content
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Rejected by the document model
    #[error(transparent)]
    Model(#[from] DocxError),

    /// Invalid configuration file
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Required part not found in the package
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Part content does not have the expected shape
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Content this library does not re-hydrate
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

impl OoxmlError {
    /// Coarse classification shared with the model crate
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Archive(_) | Self::Io(_) => ErrorKind::Io,
            Self::Xml(_) | Self::XmlAttribute(_) | Self::InvalidStructure(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Validation,
            Self::Model(err) => err.kind(),
            Self::MissingFile(_) => ErrorKind::NotFound,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let model: OoxmlError = DocxError::not_found("style", "Missing").into();
        assert_eq!(model.kind(), ErrorKind::NotFound);
        assert_eq!(model.to_string(), "style not found: Missing");
        assert_eq!(
            OoxmlError::MissingFile("word/document.xml".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(OoxmlError::Unsupported("altChunk".into()).kind(), ErrorKind::Unsupported);
    }
}
