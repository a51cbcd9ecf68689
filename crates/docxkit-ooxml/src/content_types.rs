//! `[Content_Types].xml` manifest

use crate::error::Result;
use crate::xml::{XmlNode, XmlWriter};

pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_XML: &str = "application/xml";
pub const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const CT_SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
pub const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
pub const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
pub const CT_EXTENDED_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Extension defaults and per-part overrides, in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Manifest with the `rels` and `xml` defaults every package needs
    pub fn new() -> Self {
        let mut types = Self::default();
        types.add_default("rels", CT_RELATIONSHIPS);
        types.add_default("xml", CT_XML);
        types
    }

    /// Register a content type for an extension; the first registration wins
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.to_ascii_lowercase();
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type.to_string()));
        }
    }

    /// Register a content type for one part (`word/document.xml`)
    pub fn add_override(&mut self, part: &str, content_type: &str) {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        match self.overrides.iter_mut().find(|(name, _)| *name == part_name) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((part_name, content_type.to_string())),
        }
    }

    pub fn defaults(&self) -> &[(String, String)] {
        &self.defaults
    }

    pub fn overrides(&self) -> &[(String, String)] {
        &self.overrides
    }

    /// Effective content type of a part: its override, else its extension's default
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if let Some((_, ct)) = self.overrides.iter().find(|(name, _)| *name == part_name) {
            return Some(ct);
        }
        let extension = part.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, ct)| ct.as_str())
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new();
        w.declaration()?;
        w.start("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
        for (extension, content_type) in &self.defaults {
            w.empty("Default", &[("Extension", extension), ("ContentType", content_type)])?;
        }
        for (part_name, content_type) in &self.overrides {
            w.empty("Override", &[("PartName", part_name), ("ContentType", content_type)])?;
        }
        w.end("Types")?;
        Ok(w.into_bytes())
    }

    pub fn parse(xml: &[u8]) -> Result<Self> {
        let root = XmlNode::parse(xml)?;
        let mut types = Self::default();
        for node in root.elements() {
            match node.local_name() {
                "Default" => {
                    if let (Some(ext), Some(ct)) = (node.attr("Extension"), node.attr("ContentType")) {
                        types.add_default(ext, ct);
                    }
                }
                "Override" => {
                    if let (Some(part), Some(ct)) = (node.attr("PartName"), node.attr("ContentType")) {
                        types.add_override(part, ct);
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }
}
