//! Binary media storage
//!
//! Every image embedded in a document is stored once here under a canonical
//! path relative to the `word/` folder (`media/image3.png`). Names come from a
//! counter owned by the store so they never collide within a package.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DocxError, Result};
use crate::ids::numeric_suffix;
use crate::image::{content_type_for_extension, ImageFormat};

/// Folder (relative to `word/`) holding media parts
pub const MEDIA_DIR: &str = "media";

/// How repeated payloads are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaDedup {
    /// Every add produces a new part
    #[default]
    None,
    /// Identical bytes share a single part (SHA-256 of the payload)
    ContentHash,
}

/// A stored media part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub id: String,
    /// File name inside the media folder (`image1.png`)
    pub name: String,
    /// Path relative to `word/` (`media/image1.png`)
    pub path: String,
    pub content_type: String,
    pub data: Arc<[u8]>,
}

/// Handle returned by [`MediaStore::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub id: String,
    pub path: String,
    /// False when the payload matched an existing entry
    pub created: bool,
}

#[derive(Debug, Default)]
struct Entries {
    counter: u64,
    order: Vec<String>,
    map: HashMap<String, MediaFile>,
    by_hash: HashMap<[u8; 32], String>,
}

/// Store of media payloads for one document
#[derive(Debug, Default)]
pub struct MediaStore {
    dedup: MediaDedup,
    entries: RwLock<Entries>,
}

impl MediaStore {
    pub fn new(dedup: MediaDedup) -> Self {
        Self {
            dedup,
            entries: RwLock::new(Entries::default()),
        }
    }

    pub fn dedup(&self) -> MediaDedup {
        self.dedup
    }

    /// Store `data` under a freshly generated name
    ///
    /// The extension of `filename` selects the content type; when it is missing
    /// or unknown the payload signature is used instead.
    pub fn add(&self, data: impl Into<Arc<[u8]>>, filename: &str) -> Result<MediaRef> {
        let data = data.into();
        if data.is_empty() {
            return Err(DocxError::validation("data", "media payload must not be empty"));
        }
        if filename.trim().is_empty() {
            return Err(DocxError::validation("filename", "filename must not be empty"));
        }

        let (extension, content_type) = resolve_type(filename, &data);
        let digest = match self.dedup {
            MediaDedup::ContentHash => Some(content_hash(&data)),
            MediaDedup::None => None,
        };

        let mut entries = self.entries.write();
        if let Some(existing) = digest
            .as_ref()
            .and_then(|hash| entries.by_hash.get(hash))
            .and_then(|id| entries.map.get(id))
        {
            debug!("reusing media {} for {filename}", existing.path);
            return Ok(MediaRef {
                id: existing.id.clone(),
                path: existing.path.clone(),
                created: false,
            });
        }

        entries.counter += 1;
        let n = entries.counter;
        let name = format!("image{n}.{extension}");
        let file = MediaFile {
            id: format!("media{n}"),
            path: format!("{MEDIA_DIR}/{name}"),
            name,
            content_type,
            data,
        };
        let handle = MediaRef {
            id: file.id.clone(),
            path: file.path.clone(),
            created: true,
        };

        if let Some(hash) = digest {
            entries.by_hash.insert(hash, file.id.clone());
        }
        debug!("stored media {} ({} bytes)", file.path, file.data.len());
        entries.order.push(file.id.clone());
        entries.map.insert(file.id.clone(), file);
        Ok(handle)
    }

    /// Register a part that already has a fixed path (re-hydration)
    ///
    /// The original name is kept and the internal counter is advanced past
    /// it. Repeating an ID already present is a no-op.
    pub fn register_existing(
        &self,
        id: &str,
        path: &str,
        content_type: &str,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<()> {
        if id.trim().is_empty() {
            return Err(DocxError::validation("id", "media id must not be empty"));
        }
        let path = normalize_path(path);
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        if name.is_empty() {
            return Err(DocxError::validation("path", "media path must name a file"));
        }

        let mut entries = self.entries.write();
        if entries.map.contains_key(id) {
            return Ok(());
        }

        let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
        let used = [numeric_suffix(stem), numeric_suffix(id)]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(0);
        entries.counter = entries.counter.max(used);

        let file = MediaFile {
            id: id.to_string(),
            name,
            path: path.to_string(),
            content_type: content_type.to_string(),
            data: data.into(),
        };
        if self.dedup == MediaDedup::ContentHash {
            let hash = content_hash(&file.data);
            entries.by_hash.entry(hash).or_insert_with(|| file.id.clone());
        }
        entries.order.push(file.id.clone());
        entries.map.insert(file.id.clone(), file);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<MediaFile> {
        self.entries
            .read()
            .map
            .get(id)
            .cloned()
            .ok_or_else(|| DocxError::not_found("media", id))
    }

    /// Look up by path; accepts `media/x.png` or `word/media/x.png`
    pub fn get_by_path(&self, path: &str) -> Result<MediaFile> {
        let path = normalize_path(path);
        let entries = self.entries.read();
        entries
            .map
            .values()
            .find(|file| file.path == path)
            .cloned()
            .ok_or_else(|| DocxError::not_found("media", path))
    }

    /// Snapshot of all files in insertion order
    pub fn all(&self) -> Vec<MediaFile> {
        let entries = self.entries.read();
        entries
            .order
            .iter()
            .filter_map(|id| entries.map.get(id).cloned())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn delete(&self, id: &str) -> Result<MediaFile> {
        let mut entries = self.entries.write();
        let removed = entries
            .map
            .remove(id)
            .ok_or_else(|| DocxError::not_found("media", id))?;
        entries.order.retain(|existing| existing != id);
        entries.by_hash.retain(|_, owner| owner != id);
        Ok(removed)
    }
}

fn content_hash(data: &[u8]) -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}

fn normalize_path(path: &str) -> &str {
    let path = path.trim_start_matches('/');
    path.strip_prefix("word/").unwrap_or(path)
}

fn resolve_type(filename: &str, data: &[u8]) -> (String, String) {
    let declared = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match declared {
        Some(ext) if ImageFormat::from_extension(&ext).is_some() => {
            let content_type = content_type_for_extension(&ext).to_string();
            (ext, content_type)
        }
        declared => match ImageFormat::detect_from_bytes(data) {
            Some(format) => (
                format.extension().to_string(),
                format.content_type().to_string(),
            ),
            None => (
                declared.unwrap_or_else(|| "bin".to_string()),
                "application/octet-stream".to_string(),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_add_generates_unique_paths() {
        let store = MediaStore::default();
        let a = store.add(PNG_MAGIC.to_vec(), "logo.png").unwrap();
        let b = store.add(PNG_MAGIC.to_vec(), "logo.png").unwrap();

        assert_eq!(a.path, "media/image1.png");
        assert_eq!(b.path, "media/image2.png");
        assert_ne!(a.id, b.id);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_add_rejects_empty_input() {
        let store = MediaStore::default();
        assert_eq!(
            store.add(Vec::new(), "a.png").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(store.add(PNG_MAGIC.to_vec(), "").is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_content_type_from_extension_then_signature() {
        let store = MediaStore::default();
        let jpg = store.add(vec![1, 2, 3], "photo.JPG").unwrap();
        assert_eq!(store.get(&jpg.id).unwrap().content_type, "image/jpeg");
        assert!(jpg.path.ends_with(".jpg"));

        let sniffed = store.add(PNG_MAGIC.to_vec(), "upload").unwrap();
        assert_eq!(sniffed.path, "media/image2.png");
        assert_eq!(store.get(&sniffed.id).unwrap().content_type, "image/png");

        let opaque = store.add(vec![0, 1], "blob.dat").unwrap();
        assert_eq!(store.get(&opaque.id).unwrap().content_type, "application/octet-stream");
    }

    #[test]
    fn test_content_hash_dedup() {
        let store = MediaStore::new(MediaDedup::ContentHash);
        let a = store.add(PNG_MAGIC.to_vec(), "a.png").unwrap();
        let b = store.add(PNG_MAGIC.to_vec(), "b.png").unwrap();
        assert!(a.created);
        assert!(!b.created);
        assert_eq!(a.path, b.path);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_register_existing_keeps_path_and_advances() {
        let store = MediaStore::default();
        store
            .register_existing("media4", "word/media/image4.gif", "image/gif", vec![1u8])
            .unwrap();
        store
            .register_existing("media4", "media/other.gif", "image/gif", vec![2u8])
            .unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get_by_path("media/image4.gif").unwrap().id, "media4");

        let next = store.add(PNG_MAGIC.to_vec(), "new.png").unwrap();
        assert_eq!(next.path, "media/image5.png");
    }

    #[test]
    fn test_missing_entries_are_not_found() {
        let store = MediaStore::default();
        assert_eq!(store.get("media1").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            store.get_by_path("media/none.png").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(store.delete("media1").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_removes_entry() {
        let store = MediaStore::new(MediaDedup::ContentHash);
        let a = store.add(PNG_MAGIC.to_vec(), "a.png").unwrap();
        store.delete(&a.id).unwrap();
        assert_eq!(store.count(), 0);

        let again = store.add(PNG_MAGIC.to_vec(), "a.png").unwrap();
        assert!(again.created);
        assert_eq!(again.path, "media/image2.png");
    }
}
