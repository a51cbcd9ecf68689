//! Relationship bookkeeping for a document part
//!
//! OOXML parts reference images, hyperlinks, headers and footers through
//! relationship IDs (`r:id="rId4"`). The table keeps every ID that content
//! hands out so that the packager can emit a `.rels` part in which each
//! reference has exactly one entry.
//!
//! ```
//! use std::sync::Arc;
//! use docxkit_model::{IdGenerator, RelationshipTable, TargetMode};
//!
//! let table = RelationshipTable::new(Arc::new(IdGenerator::new()));
//! let id = table
//!     .add(RelationshipTable::TYPE_IMAGE, "media/image1.png", TargetMode::Internal)
//!     .unwrap();
//! assert_eq!(id, "rId1");
//! assert_eq!(table.get(&id).unwrap().target, "media/image1.png");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::error::{DocxError, Result};
use crate::ids::{IdGenerator, IdKind};

/// Whether a relationship points inside the package or to an external URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

impl TargetMode {
    /// Value of the `TargetMode` attribute, if any is written
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            Self::Internal => None,
            Self::External => Some("External"),
        }
    }
}

/// A single relationship entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the owning part's folder) or external URI
    pub target: String,
    pub mode: TargetMode,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        self.mode == TargetMode::External
    }
}

#[derive(Debug, Default)]
struct Entries {
    /// IDs in insertion order, for deterministic output
    order: Vec<String>,
    map: HashMap<String, Relationship>,
}

/// Relationship table scoped to one package part
#[derive(Debug)]
pub struct RelationshipTable {
    ids: Arc<IdGenerator>,
    entries: RwLock<Entries>,
}

/// Common relationship type URIs
impl RelationshipTable {
    pub const TYPE_OFFICE_DOCUMENT: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const TYPE_CORE_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const TYPE_EXTENDED_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const TYPE_STYLES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const TYPE_SETTINGS: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const TYPE_NUMBERING: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const TYPE_IMAGE: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const TYPE_HYPERLINK: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const TYPE_HEADER: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const TYPE_FOOTER: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
}

impl RelationshipTable {
    /// Create an empty table drawing IDs from `ids`
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        Self {
            ids,
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Add a relationship, minting a fresh ID
    pub fn add(&self, rel_type: &str, target: &str, mode: TargetMode) -> Result<String> {
        if rel_type.trim().is_empty() {
            return Err(DocxError::validation(
                "rel_type",
                "relationship type must not be empty",
            ));
        }
        if target.trim().is_empty() {
            return Err(DocxError::validation(
                "target",
                "relationship target must not be empty",
            ));
        }

        Ok(self.insert(rel_type, target, mode))
    }

    /// Add a relationship to a fixed, known-valid internal part
    pub(crate) fn add_part(&self, rel_type: &'static str, target: &'static str) -> String {
        self.insert(rel_type, target, TargetMode::Internal)
    }

    fn insert(&self, rel_type: &str, target: &str, mode: TargetMode) -> String {
        let id = self.ids.next(IdKind::Relationship);
        let relationship = Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            mode,
        };

        let mut entries = self.entries.write();
        entries.order.push(id.clone());
        entries.map.insert(id.clone(), relationship);
        debug!("registered relationship {id} -> {target}");
        id
    }

    /// Register a relationship whose ID is already fixed (re-hydration)
    ///
    /// Repeating an ID that is already present is a no-op. The ID generator is
    /// advanced past the numeric suffix so newly minted IDs never collide.
    pub fn register_existing(
        &self,
        id: &str,
        rel_type: &str,
        target: &str,
        mode: TargetMode,
    ) -> Result<()> {
        if id.trim().is_empty() {
            return Err(DocxError::validation("id", "relationship id must not be empty"));
        }
        if target.trim().is_empty() {
            return Err(DocxError::validation(
                "target",
                "relationship target must not be empty",
            ));
        }

        let mut entries = self.entries.write();
        if entries.map.contains_key(id) {
            return Ok(());
        }
        self.ids.observe(IdKind::Relationship, id);
        entries.order.push(id.to_string());
        entries.map.insert(
            id.to_string(),
            Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
                mode,
            },
        );
        Ok(())
    }

    /// Look up a relationship by ID
    pub fn get(&self, id: &str) -> Result<Relationship> {
        self.entries
            .read()
            .map
            .get(id)
            .cloned()
            .ok_or_else(|| DocxError::not_found("relationship", id))
    }

    /// First relationship pointing at `target`
    pub fn get_by_target(&self, target: &str) -> Option<Relationship> {
        let entries = self.entries.read();
        entries
            .order
            .iter()
            .filter_map(|id| entries.map.get(id))
            .find(|rel| rel.target == target)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().map.contains_key(id)
    }

    /// Snapshot of all relationships in insertion order
    pub fn all(&self) -> Vec<Relationship> {
        let entries = self.entries.read();
        entries
            .order
            .iter()
            .filter_map(|id| entries.map.get(id).cloned())
            .collect()
    }

    /// Remove a relationship; its ID is never reissued
    pub fn delete(&self, id: &str) -> Result<Relationship> {
        let mut entries = self.entries.write();
        let removed = entries
            .map
            .remove(id)
            .ok_or_else(|| DocxError::not_found("relationship", id))?;
        entries.order.retain(|existing| existing != id);
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn table() -> RelationshipTable {
        RelationshipTable::new(Arc::new(IdGenerator::new()))
    }

    #[test]
    fn test_add_relationships() {
        let rels = table();
        let image = rels
            .add(RelationshipTable::TYPE_IMAGE, "media/image1.png", TargetMode::Internal)
            .unwrap();
        let link = rels
            .add(
                RelationshipTable::TYPE_HYPERLINK,
                "https://example.com",
                TargetMode::External,
            )
            .unwrap();

        assert_eq!(image, "rId1");
        assert_eq!(link, "rId2");
        assert!(rels.get(&link).unwrap().is_external());
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_add_rejects_empty_fields() {
        let rels = table();
        let err = rels.add("", "media/a.png", TargetMode::Internal).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(rels
            .add(RelationshipTable::TYPE_IMAGE, " ", TargetMode::Internal)
            .is_err());
        assert!(rels.is_empty());
    }

    #[test]
    fn test_get_by_target() {
        let rels = table();
        rels.add(RelationshipTable::TYPE_STYLES, "styles.xml", TargetMode::Internal)
            .unwrap();
        let found = rels.get_by_target("styles.xml").unwrap();
        assert_eq!(found.rel_type, RelationshipTable::TYPE_STYLES);
        assert!(rels.get_by_target("missing.xml").is_none());
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let rels = table();
        assert_eq!(rels.get("rId9").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(rels.delete("rId9").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let rels = table();
        let first = rels
            .add(RelationshipTable::TYPE_IMAGE, "media/image1.png", TargetMode::Internal)
            .unwrap();
        rels.delete(&first).unwrap();
        let second = rels
            .add(RelationshipTable::TYPE_IMAGE, "media/image2.png", TargetMode::Internal)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(second, "rId2");
    }

    #[test]
    fn test_register_existing_is_idempotent_and_advances() {
        let rels = table();
        rels.register_existing("rId7", RelationshipTable::TYPE_STYLES, "styles.xml", TargetMode::Internal)
            .unwrap();
        rels.register_existing("rId7", RelationshipTable::TYPE_IMAGE, "other.png", TargetMode::Internal)
            .unwrap();

        assert_eq!(rels.len(), 1);
        assert_eq!(rels.get("rId7").unwrap().target, "styles.xml");

        let fresh = rels
            .add(RelationshipTable::TYPE_IMAGE, "media/image1.png", TargetMode::Internal)
            .unwrap();
        assert_eq!(fresh, "rId8");
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let rels = table();
        for target in ["a.xml", "b.xml", "c.xml"] {
            rels.add(RelationshipTable::TYPE_STYLES, target, TargetMode::Internal)
                .unwrap();
        }
        rels.delete("rId2").unwrap();
        let targets: Vec<_> = rels.all().into_iter().map(|r| r.target).collect();
        assert_eq!(targets, ["a.xml", "c.xml"]);
    }
}
