//! ZIP container for package parts
//!
//! A `.docx` file is a ZIP archive of XML parts and media. Parts are kept in
//! insertion order so that `[Content_Types].xml` is always the first entry.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::config::Compression;
use crate::error::{OoxmlError, Result};

/// Parts of an OOXML package, keyed by part name
#[derive(Debug, Clone, Default)]
pub struct PackageArchive {
    order: Vec<String>,
    files: HashMap<String, Vec<u8>>,
}

impl PackageArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and unpack a `.docx` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Self::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            parts.set(name, contents);
        }

        Ok(parts)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// A part that must be present
    pub fn require(&self, path: &str) -> Result<&[u8]> {
        self.get(path)
            .ok_or_else(|| OoxmlError::MissingFile(path.to_string()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Part names in archive order
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Add or replace a part; a replaced part keeps its position
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        let path = path.into();
        if !self.files.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.files.insert(path, contents);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Write the archive to any seekable writer
    pub fn write_to<W: Write + Seek>(&self, writer: W, compression: Compression) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(compression.method());

        for path in &self.order {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(&self.files[path])?;
        }

        zip.finish()?;
        Ok(())
    }

    pub fn to_bytes(&self, compression: Compression) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer, compression)?;
        Ok(buffer.into_inner())
    }
}
