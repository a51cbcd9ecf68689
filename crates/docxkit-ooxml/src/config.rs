//! TOML configuration
//!
//! ```toml
//! [document]
//! media_dedup = "content-hash"
//!
//! [package]
//! compression = "stored"
//! default_font = "Cambria"
//! ```

use std::path::Path;

use docxkit_model::DocumentOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// ZIP entry compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            Self::Deflated => zip::CompressionMethod::Deflated,
            Self::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Options applied when writing a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageOptions {
    pub compression: Compression,
    /// `Application` in `docProps/app.xml`
    pub application: String,
    /// Ask consumers to recompute fields when the file opens
    pub update_fields_on_open: bool,
    /// Document default font (`w:docDefaults`)
    pub default_font: String,
    /// Document default size in half-points
    pub default_font_size: u16,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Deflated,
            application: "docxkit".to_string(),
            update_fields_on_open: true,
            default_font: "Calibri".to_string(),
            default_font_size: 22,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub document: DocumentOptions,
    pub package: PackageOptions,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_toml_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docxkit_model::MediaDedup;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.package.default_font_size, 22);
        assert_eq!(config.document.fallback_image_px, 96);
    }

    #[test]
    fn test_partial_tables() {
        let config = Config::from_toml_str(
            r#"
            [document]
            media_dedup = "content-hash"

            [package]
            compression = "stored"
            application = "Reports"
            "#,
        )
        .unwrap();
        assert_eq!(config.document.media_dedup, MediaDedup::ContentHash);
        assert_eq!(config.package.compression, Compression::Stored);
        assert_eq!(config.package.application, "Reports");
        assert!(config.package.update_fields_on_open);
        assert_eq!(config.package.default_font, "Calibri");
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(Config::from_toml_str("[package]\ncompression = \"bzip2\"").is_err());
        assert!(Config::from_toml_str("[package]\ndefault_font_size = \"big\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docxkit.toml");
        std::fs::write(&path, "[package]\nupdate_fields_on_open = false\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert!(!config.package.update_fields_on_open);

        let err = Config::load(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.kind(), docxkit_model::ErrorKind::Io);
    }
}
