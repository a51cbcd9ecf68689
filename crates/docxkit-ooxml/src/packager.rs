//! Document to `.docx` package
//!
//! One linear pass over a validated document. The document is only read;
//! everything is buffered before the first byte reaches the destination.

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use docxkit_model::{Document, RelationshipTable, ResultExt};
use log::debug;
use tempfile::NamedTempFile;

use crate::archive::PackageArchive;
use crate::config::PackageOptions;
use crate::content_types::{
    ContentTypes, CONTENT_TYPES_PART, CT_CORE_PROPERTIES, CT_DOCUMENT, CT_EXTENDED_PROPERTIES,
    CT_FOOTER, CT_HEADER, CT_NUMBERING, CT_SETTINGS, CT_STYLES,
};
use crate::error::{OoxmlError, Result};
use crate::properties::{self, APP_PART, CORE_PART};
use crate::relationships::{self, rels_path_for};
use crate::schema::part_bytes;
use crate::serializer;

pub const PACKAGE_RELS_PART: &str = "_rels/.rels";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const SETTINGS_PART: &str = "word/settings.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";
/// Folder of every part the main document references
pub const WORD_DIR: &str = "word";

/// Writes documents as OOXML packages
#[derive(Debug, Clone, Default)]
pub struct Packager {
    options: PackageOptions,
}

impl Packager {
    pub fn new(options: PackageOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    /// Build every part of the package in write order
    pub fn package(&self, doc: &Document) -> Result<PackageArchive> {
        doc.validate().context("package")?;

        let numbering = doc.numbering();
        let media = doc.context().media().all();
        let parts: Vec<_> = doc
            .sections()
            .into_iter()
            .flat_map(|s| s.headers().chain(s.footers()))
            .collect();

        let mut types = ContentTypes::new();
        for file in &media {
            if let Some((_, ext)) = file.name.rsplit_once('.') {
                types.add_default(ext, &file.content_type);
            }
        }
        types.add_override(DOCUMENT_PART, CT_DOCUMENT);
        types.add_override(STYLES_PART, CT_STYLES);
        types.add_override(SETTINGS_PART, CT_SETTINGS);
        if !numbering.is_empty() {
            types.add_override(NUMBERING_PART, CT_NUMBERING);
        }
        types.add_override(CORE_PART, CT_CORE_PROPERTIES);
        types.add_override(APP_PART, CT_EXTENDED_PROPERTIES);
        for part in &parts {
            let content_type = match part.kind() {
                docxkit_model::PartKind::Header => CT_HEADER,
                docxkit_model::PartKind::Footer => CT_FOOTER,
            };
            types.add_override(&word_part(part.target()), content_type);
        }

        // a numbering relationship without lists would point at a missing part
        let document_rels: Vec<_> = doc
            .relationships()
            .all()
            .into_iter()
            .filter(|rel| !numbering.is_empty() || rel.rel_type != RelationshipTable::TYPE_NUMBERING)
            .collect();

        let mut archive = PackageArchive::new();
        archive.set(CONTENT_TYPES_PART, types.to_xml()?);
        archive.set(
            PACKAGE_RELS_PART,
            relationships::to_xml(&relationships::package_relationships())?,
        );
        archive.set(DOCUMENT_PART, part_bytes(&serializer::document_xml(doc))?);
        archive.set(rels_path_for(DOCUMENT_PART), relationships::to_xml(&document_rels)?);
        archive.set(
            STYLES_PART,
            part_bytes(&serializer::styles_xml(doc.styles(), &self.options))?,
        );
        archive.set(
            SETTINGS_PART,
            part_bytes(&serializer::settings_xml(doc, &self.options))?,
        );
        if !numbering.is_empty() {
            archive.set(NUMBERING_PART, part_bytes(&serializer::numbering_xml(numbering))?);
        }
        archive.set(CORE_PART, properties::core_xml(doc.metadata(), Utc::now())?);
        archive.set(
            APP_PART,
            properties::app_xml(doc.metadata(), &self.options.application)?,
        );

        for part in &parts {
            let name = word_part(part.target());
            archive.set(name.clone(), part_bytes(&serializer::header_footer_xml(part))?);
            let rels = part.relationships();
            if !rels.is_empty() {
                archive.set(rels_path_for(&name), relationships::to_xml(&rels.all())?);
            }
        }

        for file in &media {
            archive.set(word_part(&file.path), file.data.to_vec());
        }

        debug!(
            "packaged {} parts ({} media, {} header/footer)",
            archive.len(),
            media.len(),
            parts.len()
        );
        Ok(archive)
    }

    pub fn to_bytes(&self, doc: &Document) -> Result<Vec<u8>> {
        self.package(doc)?.to_bytes(self.options.compression)
    }

    /// Write the finished package to `writer`
    pub fn write_to<W: Write>(&self, doc: &Document, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes(doc)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Write to `path` through a sibling temporary file
    ///
    /// The destination is replaced only once the package is complete.
    pub fn save(&self, doc: &Document, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(doc)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| OoxmlError::Io(err.error))?;
        debug!("saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Part name of a target relative to `word/`
fn word_part(target: &str) -> String {
    format!("{WORD_DIR}/{}", target.trim_start_matches('/'))
}

/// Packaging entry points on [`Document`] with default options
pub trait DocumentPackageExt {
    fn save(&self, path: impl AsRef<Path>) -> Result<()>;
    fn write_to<W: Write>(&self, writer: W) -> Result<()>;
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

impl DocumentPackageExt for Document {
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        Packager::default().save(self, path)
    }

    fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        Packager::default().write_to(self, writer)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Packager::default().to_bytes(self)
    }
}
