//! # docxkit-model
//!
//! In-memory object model for word-processing documents.
//!
//! This crate provides:
//! - The entity graph (document, sections, paragraphs, runs, tables, images, fields)
//! - Per-document ID generation and relationship bookkeeping
//! - A media store for embedded binary parts
//! - The style registry with Word's built-in catalog
//!
//! It knows nothing about ZIP or XML; `docxkit-ooxml` turns a [`Document`]
//! into a `.docx` package.
//!
//! ## Example
//!
//! ```
//! use docxkit_model::{Alignment, Document, Metadata};
//!
//! let mut doc = Document::new();
//! doc.set_metadata(Metadata::new().with_title("Report"));
//! doc.add_heading("Summary", 1)?;
//! doc.add_paragraph()
//!     .set_alignment(Alignment::Center)
//!     .add_run("Hello")
//!     .set_bold(true);
//!
//! let table = doc.add_table(2, 3)?;
//! table.cell_mut(0, 0).unwrap().set_text("A1");
//! doc.validate()?;
//! # Ok::<(), docxkit_model::DocxError>(())
//! ```

pub mod context;
pub mod document;
pub mod error;
pub mod field;
pub mod format;
pub mod ids;
pub mod image;
pub mod media;
pub mod metadata;
pub mod numbering;
pub mod options;
pub mod paragraph;
pub mod relationships;
pub mod run;
pub mod section;
pub mod styles;
pub mod table;
pub mod traits;
pub mod units;

pub use crate::context::DocumentContext;
pub use crate::document::{BodyElement, Document};
pub use crate::error::{DocxError, ErrorKind, Result, ResultExt};
pub use crate::field::{Field, FieldType};
pub use crate::format::{
    Alignment, Border, BorderStyle, Borders, Color, Font, HighlightColor, LineSpacing,
    LineSpacingRule, Shading, ShadingPattern, UnderlineStyle, VerticalAlignment, VerticalPosition,
};
pub use crate::ids::{IdGenerator, IdKind};
pub use crate::image::{
    AxisPosition, DimensionProbe, FloatingPosition, Image, ImageCrateProbe, ImageFormat,
    ImagePosition, ImageSize, PositionAlign, RelativeFrom, WrapType,
};
pub use crate::media::{MediaDedup, MediaFile, MediaRef, MediaStore};
pub use crate::metadata::Metadata;
pub use crate::numbering::{ListDefinition, ListKind, ListLevel, NumberFormat, NumberingCatalog};
pub use crate::options::DocumentOptions;
pub use crate::paragraph::{
    Bookmark, Hyperlink, HyperlinkTarget, Indentation, NumberingRef, Paragraph, ParagraphChild,
    ParagraphProperties,
};
pub use crate::relationships::{Relationship, RelationshipTable, TargetMode};
pub use crate::run::{BreakType, Run, RunContent, RunProperties};
pub use crate::section::{
    FooterType, HeaderFooter, HeaderFooterType, HeaderType, Margins, Orientation, PageSize,
    PartKind, Section,
};
pub use crate::styles::{Style, StyleRegistry, StyleType};
pub use crate::table::{
    CellContent, HeightRule, Table, TableCell, TableRow, TableWidth, VerticalMerge,
};
pub use crate::traits::{ContentHolder, Styled};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
