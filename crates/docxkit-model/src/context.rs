//! Shared per-document services

use std::sync::Arc;

use crate::error::Result;
use crate::ids::IdGenerator;
use crate::image::{DimensionProbe, ImageCrateProbe};
use crate::media::MediaStore;
use crate::options::DocumentOptions;
use crate::paragraph::Paragraph;
use crate::relationships::RelationshipTable;
use crate::styles::StyleRegistry;
use crate::table::Table;

/// Handle to the services of one document
///
/// Cloning is cheap. Entities built from a context (directly or on another
/// thread) draw their IDs from the same generator, so they can later be
/// attached to the owning document without renumbering. Paragraphs inside a
/// header or footer use a context whose relationship table is scoped to that
/// part.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    ids: Arc<IdGenerator>,
    relationships: Arc<RelationshipTable>,
    media: Arc<MediaStore>,
    styles: Arc<StyleRegistry>,
    probe: Arc<dyn DimensionProbe>,
    options: Arc<DocumentOptions>,
}

impl DocumentContext {
    pub(crate) fn new(options: DocumentOptions, probe: Arc<dyn DimensionProbe>) -> Self {
        let ids = Arc::new(IdGenerator::new());
        Self {
            relationships: Arc::new(RelationshipTable::new(Arc::clone(&ids))),
            media: Arc::new(MediaStore::new(options.media_dedup)),
            styles: Arc::new(StyleRegistry::new()),
            ids,
            probe,
            options: Arc::new(options),
        }
    }

    pub(crate) fn with_default_probe(options: DocumentOptions) -> Self {
        Self::new(options, Arc::new(ImageCrateProbe))
    }

    /// Same document services, different relationship scope
    pub(crate) fn for_part(&self, relationships: Arc<RelationshipTable>) -> Self {
        Self {
            relationships,
            ..self.clone()
        }
    }

    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    /// Relationship table of the part this context writes into
    pub fn relationships(&self) -> &Arc<RelationshipTable> {
        &self.relationships
    }

    pub fn media(&self) -> &Arc<MediaStore> {
        &self.media
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    pub fn probe(&self) -> &dyn DimensionProbe {
        self.probe.as_ref()
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Whether both handles belong to the same document
    pub fn same_document(&self, other: &DocumentContext) -> bool {
        Arc::ptr_eq(&self.ids, &other.ids)
    }

    /// Same document and same relationship scope
    pub(crate) fn same_part(&self, other: &DocumentContext) -> bool {
        self.same_document(other) && Arc::ptr_eq(&self.relationships, &other.relationships)
    }

    /// A detached paragraph, to be attached with `Document::attach_paragraph`
    pub fn new_paragraph(&self) -> Paragraph {
        Paragraph::new(self.clone())
    }

    /// A detached table, to be attached with `Document::attach_table`
    pub fn new_table(&self, rows: usize, cols: usize) -> Result<Table> {
        Table::new(self.clone(), rows, cols)
    }
}
