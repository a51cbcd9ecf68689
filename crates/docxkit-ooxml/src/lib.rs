//! # docxkit-ooxml
//!
//! OOXML (Office Open XML) packaging for docxkit documents.
//!
//! This crate provides functionality to:
//! - Serialize a [`docxkit_model::Document`] into WordprocessingML parts
//! - Package the parts as a `.docx` ZIP archive
//! - Read a package back into a document
//!
//! ## Example: Writing and Re-reading
//!
//! ```no_run
//! use docxkit_model::Document;
//! use docxkit_ooxml::{DocumentPackageExt, DocxReader};
//!
//! let mut doc = Document::new();
//! doc.add_paragraph().add_run("Hello").set_bold(true);
//! doc.save("hello.docx")?;
//!
//! let reopened = DocxReader::open("hello.docx")?.read()?;
//! assert_eq!(reopened.text(), "Hello");
//! # Ok::<(), docxkit_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod config;
pub mod content_types;
pub mod error;
pub mod packager;
pub mod properties;
pub mod reader;
pub mod relationships;
pub mod schema;
pub mod serializer;
pub mod xml;

pub use archive::PackageArchive;
pub use config::{Compression, Config, PackageOptions};
pub use content_types::ContentTypes;
pub use error::{OoxmlError, Result};
pub use packager::{DocumentPackageExt, Packager};
pub use reader::DocxReader;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
