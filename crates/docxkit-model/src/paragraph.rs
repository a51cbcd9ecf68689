//! Paragraphs and their inline children

use std::sync::Arc;

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::context::DocumentContext;
use crate::error::{DocxError, Result, ResultExt};
use crate::field::Field;
use crate::format::{Alignment, Borders, LineSpacing, Shading};
use crate::ids::{numeric_suffix, IdGenerator, IdKind};
use crate::image::{Image, ImageFormat, ImagePosition, ImageSize};
use crate::relationships::{RelationshipTable, TargetMode};
use crate::run::{BreakType, Run, RunContent};
use crate::units::{check_positive_twips, check_twips};

/// Deepest numbering level
pub const MAX_LIST_LEVEL: u8 = 8;

/// Paragraph indentation in twips
///
/// `first_line` and `hanging` are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indentation {
    pub left: i32,
    pub right: i32,
    pub first_line: i32,
    pub hanging: i32,
}

impl Indentation {
    /// Left indent only
    pub fn left(twips: i32) -> Self {
        Self {
            left: twips,
            ..Self::default()
        }
    }

    /// Left indent with a hanging first line (list layout)
    pub fn hanging(left: i32, hanging: i32) -> Self {
        Self {
            left,
            hanging,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_twips("indent_left", self.left)?;
        check_twips("indent_right", self.right)?;
        check_positive_twips("indent_first_line", self.first_line)?;
        check_positive_twips("indent_hanging", self.hanging)?;
        if self.first_line > 0 && self.hanging > 0 {
            return Err(DocxError::validation(
                "indent",
                "first-line and hanging indents are mutually exclusive",
            ));
        }
        Ok(())
    }
}

/// Reference into the numbering catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberingRef {
    pub num_id: u32,
    /// 0..=8
    pub level: u8,
}

/// Paragraph formatting (`w:pPr`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphProperties {
    /// Paragraph style ID; not checked against the registry
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    pub indentation: Indentation,
    /// Twips
    pub spacing_before: Option<i32>,
    /// Twips
    pub spacing_after: Option<i32>,
    pub line_spacing: Option<LineSpacing>,
    pub numbering: Option<NumberingRef>,
    /// 0..=8, where 0 is the top outline level
    pub outline_level: Option<u8>,
    pub borders: Borders,
    pub shading: Option<Shading>,
    pub keep_next: bool,
    pub keep_lines: bool,
    pub page_break_before: bool,
}

impl ParagraphProperties {
    pub(crate) fn validate(&self) -> Result<()> {
        if matches!(&self.style, Some(style) if style.trim().is_empty()) {
            return Err(DocxError::validation("style", "style id must not be empty"));
        }
        self.indentation.validate()?;
        if let Some(before) = self.spacing_before {
            check_positive_twips("spacing_before", before)?;
        }
        if let Some(after) = self.spacing_after {
            check_positive_twips("spacing_after", after)?;
        }
        if let Some(line) = &self.line_spacing {
            line.validate()?;
        }
        if let Some(numbering) = &self.numbering {
            check_level("numbering_level", numbering.level)?;
        }
        if let Some(level) = self.outline_level {
            check_level("outline_level", level)?;
        }
        self.borders.validate()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn check_level(field: &'static str, level: u8) -> Result<()> {
    if level > MAX_LIST_LEVEL {
        return Err(DocxError::validation(
            field,
            format!("level {level} is outside 0..={MAX_LIST_LEVEL}"),
        ));
    }
    Ok(())
}

/// Where a hyperlink points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyperlinkTarget {
    /// External URI through a relationship
    External { relationship_id: String, url: String },
    /// Bookmark inside the document
    Anchor(String),
}

/// A hyperlink wrapping one or more runs
#[derive(Debug, Clone)]
pub struct Hyperlink {
    id: String,
    ids: Arc<IdGenerator>,
    target: HyperlinkTarget,
    tooltip: Option<String>,
    runs: Vec<Run>,
}

impl Hyperlink {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> &HyperlinkTarget {
        &self.target
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    pub fn set_tooltip(&mut self, tooltip: impl Into<String>) -> &mut Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    pub fn add_run(&mut self, text: impl Into<String>) -> &mut Run {
        self.runs
            .push(Run::new(Arc::clone(&self.ids), RunContent::Text(text.into())));
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// A named point in the text (`w:bookmarkStart` + `w:bookmarkEnd`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    id: String,
    name: String,
}

impl Bookmark {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Numeric `w:id` value
    pub fn numeric_id(&self) -> u64 {
        numeric_suffix(&self.id).unwrap_or(0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Inline content of a paragraph, in document order
#[derive(Debug, Clone)]
pub enum ParagraphChild {
    Run(Run),
    Field(Field),
    Hyperlink(Hyperlink),
    Bookmark(Bookmark),
}

/// A paragraph (`w:p`)
#[derive(Debug, Clone)]
pub struct Paragraph {
    id: String,
    ctx: DocumentContext,
    properties: ParagraphProperties,
    children: Vec<ParagraphChild>,
}

impl Paragraph {
    pub(crate) fn new(ctx: DocumentContext) -> Self {
        Self {
            id: ctx.ids().next(IdKind::Paragraph),
            ctx,
            properties: ParagraphProperties::default(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &DocumentContext {
        &self.ctx
    }

    pub fn properties(&self) -> &ParagraphProperties {
        &self.properties
    }

    pub fn children(&self) -> &[ParagraphChild] {
        &self.children
    }

    /// Runs directly inside the paragraph (not inside hyperlinks)
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(run),
            _ => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.children.iter_mut().filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(run),
            _ => None,
        })
    }

    pub fn hyperlinks(&self) -> impl Iterator<Item = &Hyperlink> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Hyperlink(link) => Some(link),
            _ => None,
        })
    }

    /// Standalone fields (fields embedded in runs are on the run)
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Field(field) => Some(field),
            _ => None,
        })
    }

    /// Recompute every field result in the paragraph, including run fields
    pub fn update_fields_at(&mut self, now: NaiveDateTime) {
        for child in &mut self.children {
            match child {
                ParagraphChild::Field(field) => field.update_at(now),
                ParagraphChild::Run(run) => run.fields_mut().iter_mut().for_each(|f| f.update_at(now)),
                ParagraphChild::Hyperlink(link) => link
                    .runs
                    .iter_mut()
                    .flat_map(|run| run.fields_mut().iter_mut())
                    .for_each(|f| f.update_at(now)),
                ParagraphChild::Bookmark(_) => {}
            }
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.runs().filter_map(Run::image)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenated text of runs and hyperlinks
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                ParagraphChild::Run(run) => push_run_text(&mut text, run),
                ParagraphChild::Hyperlink(link) => {
                    link.runs.iter().for_each(|run| push_run_text(&mut text, run))
                }
                ParagraphChild::Field(_) | ParagraphChild::Bookmark(_) => {}
            }
        }
        text
    }

    fn push_child(&mut self, child: ParagraphChild) -> &mut ParagraphChild {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    fn push_run(&mut self, run: Run) -> &mut Run {
        match self.push_child(ParagraphChild::Run(run)) {
            ParagraphChild::Run(run) => run,
            _ => unreachable!("just pushed a run"),
        }
    }

    /// Append a text run
    pub fn add_run(&mut self, text: impl Into<String>) -> &mut Run {
        let run = Run::new(Arc::clone(self.ctx.ids()), RunContent::Text(text.into()));
        self.push_run(run)
    }

    pub fn add_break(&mut self, kind: BreakType) -> &mut Run {
        let run = Run::new(Arc::clone(self.ctx.ids()), RunContent::Break(kind));
        self.push_run(run)
    }

    pub fn add_page_break(&mut self) -> &mut Run {
        self.add_break(BreakType::Page)
    }

    pub fn add_tab(&mut self) -> &mut Run {
        let run = Run::new(Arc::clone(self.ctx.ids()), RunContent::Tab);
        self.push_run(run)
    }

    /// Append a standalone field
    pub fn add_field(&mut self, mut field: Field) -> &mut Field {
        field.assign_id(self.ctx.ids().next(IdKind::Field));
        match self.push_child(ParagraphChild::Field(field)) {
            ParagraphChild::Field(field) => field,
            _ => unreachable!("just pushed a field"),
        }
    }

    /// Append a hyperlink to an external URL
    pub fn add_hyperlink(&mut self, url: &str, text: &str) -> Result<&mut Hyperlink> {
        let relationship_id = self
            .ctx
            .relationships()
            .add(RelationshipTable::TYPE_HYPERLINK, url, TargetMode::External)
            .context("add_hyperlink")?;
        Ok(self.push_hyperlink(
            HyperlinkTarget::External {
                relationship_id,
                url: url.to_string(),
            },
            Some(text),
        ))
    }

    /// Append a hyperlink to a bookmark in this document
    pub fn add_internal_link(&mut self, bookmark: &str, text: &str) -> Result<&mut Hyperlink> {
        if bookmark.trim().is_empty() {
            return Err(DocxError::validation("anchor", "bookmark name must not be empty"));
        }
        Ok(self.push_hyperlink(HyperlinkTarget::Anchor(bookmark.to_string()), Some(text)))
    }

    /// Append a hyperlink through a relationship already in this part's table
    ///
    /// The link starts without runs.
    pub fn link_existing_hyperlink(&mut self, relationship_id: &str) -> Result<&mut Hyperlink> {
        let rel = self
            .ctx
            .relationships()
            .get(relationship_id)
            .context("link_existing_hyperlink")?;
        if rel.rel_type != RelationshipTable::TYPE_HYPERLINK {
            return Err(DocxError::validation(
                "relationship_id",
                format!("{relationship_id} is not a hyperlink relationship"),
            ));
        }
        Ok(self.push_hyperlink(
            HyperlinkTarget::External {
                relationship_id: rel.id,
                url: rel.target,
            },
            None,
        ))
    }

    fn push_hyperlink(&mut self, target: HyperlinkTarget, text: Option<&str>) -> &mut Hyperlink {
        let mut link = Hyperlink {
            id: self.ctx.ids().next(IdKind::Hyperlink),
            ids: Arc::clone(self.ctx.ids()),
            target,
            tooltip: None,
            runs: Vec::new(),
        };
        if let Some(text) = text {
            link.add_run(text).properties_mut().style = Some("Hyperlink".to_string());
        }
        match self.push_child(ParagraphChild::Hyperlink(link)) {
            ParagraphChild::Hyperlink(link) => link,
            _ => unreachable!("just pushed a hyperlink"),
        }
    }

    /// Append a bookmark; names are at most 40 characters without spaces
    pub fn add_bookmark(&mut self, name: &str) -> Result<&Bookmark> {
        if name.is_empty() || name.chars().count() > 40 || name.contains(char::is_whitespace) {
            return Err(DocxError::validation(
                "bookmark",
                format!("{name:?} must be 1..=40 characters without whitespace"),
            ));
        }
        let bookmark = Bookmark {
            id: self.ctx.ids().next(IdKind::Bookmark),
            name: name.to_string(),
        };
        match self.push_child(ParagraphChild::Bookmark(bookmark)) {
            ParagraphChild::Bookmark(bookmark) => Ok(bookmark),
            _ => unreachable!("just pushed a bookmark"),
        }
    }

    /// Append an inline image sized from its decoded dimensions
    ///
    /// `filename` selects the format by extension; the byte signature is used
    /// when the extension is missing or unknown.
    pub fn add_image(&mut self, data: impl Into<Arc<[u8]>>, filename: &str) -> Result<&mut Run> {
        self.attach_image(data.into(), filename, None, ImagePosition::Inline)
    }

    /// Append an inline image with an explicit display size
    pub fn add_image_with_size(
        &mut self,
        data: impl Into<Arc<[u8]>>,
        filename: &str,
        size: ImageSize,
    ) -> Result<&mut Run> {
        self.attach_image(data.into(), filename, Some(size), ImagePosition::Inline)
    }

    /// Append an image with explicit placement and optional size
    pub fn add_image_with_position(
        &mut self,
        data: impl Into<Arc<[u8]>>,
        filename: &str,
        size: Option<ImageSize>,
        position: ImagePosition,
    ) -> Result<&mut Run> {
        self.attach_image(data.into(), filename, size, position)
    }

    fn attach_image(
        &mut self,
        data: Arc<[u8]>,
        filename: &str,
        size: Option<ImageSize>,
        position: ImagePosition,
    ) -> Result<&mut Run> {
        let run = self
            .build_image_run(data, filename, size, position)
            .context("add_image")?;
        Ok(self.push_run(run))
    }

    /// Measure, register and wrap an image; on failure nothing stays registered
    fn build_image_run(
        &self,
        data: Arc<[u8]>,
        filename: &str,
        size: Option<ImageSize>,
        position: ImagePosition,
    ) -> Result<Run> {
        if data.is_empty() {
            return Err(DocxError::validation("data", "image data must not be empty"));
        }
        if filename.trim().is_empty() {
            return Err(DocxError::validation("filename", "filename must not be empty"));
        }
        let format = ImageFormat::from_filename(filename)
            .or_else(|| ImageFormat::detect_from_bytes(&data))
            .ok_or_else(|| {
                DocxError::validation("filename", format!("{filename}: unrecognised image format"))
            })?;
        if let Some(size) = &size {
            size.validate()?;
        }

        let original = match self.ctx.probe().probe(&data, format)? {
            Some((width, height)) if width > 0 && height > 0 => ImageSize::new(width, height),
            _ => {
                let px = self.ctx.options().fallback_image_px.max(1);
                warn!("{filename}: {format} dimensions not decoded, assuming {px}x{px}px");
                ImageSize::new(px, px)
            }
        };

        let ids = self.ctx.ids();
        let mut image = Image::new(
            ids.next(IdKind::Image),
            ids.next_number(IdKind::Drawing),
            Arc::clone(&data),
            format,
            original,
        );
        if let Some(size) = size {
            image.set_size(size)?;
        }
        image.set_position(position);

        let media = self.ctx.media();
        let stored = media.add(data, filename)?;
        let relationships = self.ctx.relationships();
        let existing = (!stored.created)
            .then(|| relationships.get_by_target(&stored.path))
            .flatten()
            .filter(|rel| rel.rel_type == RelationshipTable::TYPE_IMAGE);
        let relationship_id = match existing {
            Some(rel) => rel.id,
            None => match relationships.add(
                RelationshipTable::TYPE_IMAGE,
                &stored.path,
                TargetMode::Internal,
            ) {
                Ok(id) => id,
                Err(err) => {
                    if stored.created {
                        // the payload was registered by this call only
                        let _ = media.delete(&stored.id);
                    }
                    return Err(err);
                }
            },
        };
        debug!("attached {} as {relationship_id}", stored.path);

        image.bind(relationship_id, stored.path);
        let mut run = Run::new(Arc::clone(ids), RunContent::default());
        run.set_image(image);
        Ok(run)
    }

    /// Append an image whose media part and relationship are already registered
    ///
    /// Used when re-opening a package: nothing new is added to the media store
    /// or the relationship table.
    pub fn link_existing_image(
        &mut self,
        relationship_id: &str,
        size: ImageSize,
        position: ImagePosition,
    ) -> Result<&mut Run> {
        let run = self
            .build_linked_image_run(relationship_id, size, position)
            .context("link_existing_image")?;
        Ok(self.push_run(run))
    }

    fn build_linked_image_run(
        &self,
        relationship_id: &str,
        size: ImageSize,
        position: ImagePosition,
    ) -> Result<Run> {
        let rel = self.ctx.relationships().get(relationship_id)?;
        if rel.rel_type != RelationshipTable::TYPE_IMAGE {
            return Err(DocxError::validation(
                "relationship_id",
                format!("{relationship_id} is not an image relationship"),
            ));
        }
        let media = self.ctx.media().get_by_path(&rel.target)?;
        let format = ImageFormat::from_filename(&media.name)
            .or_else(|| ImageFormat::detect_from_bytes(&media.data))
            .ok_or_else(|| {
                DocxError::validation("media", format!("{}: unrecognised image format", media.path))
            })?;
        let original = match self.ctx.probe().probe(&media.data, format) {
            Ok(Some((width, height))) if width > 0 && height > 0 => ImageSize::new(width, height),
            _ => size,
        };

        let ids = self.ctx.ids();
        let mut image = Image::new(
            ids.next(IdKind::Image),
            ids.next_number(IdKind::Drawing),
            Arc::clone(&media.data),
            format,
            original,
        );
        image.set_size(size)?;
        image.set_position(position);
        image.bind(rel.id, media.path);
        let mut run = Run::new(Arc::clone(ids), RunContent::default());
        run.set_image(image);
        Ok(run)
    }

    /// Replace all formatting at once
    pub fn set_properties(&mut self, properties: ParagraphProperties) -> Result<&mut Self> {
        properties.validate()?;
        self.properties = properties;
        Ok(self)
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.properties.alignment = Some(alignment);
        self
    }

    pub fn indent(&self) -> Indentation {
        self.properties.indentation
    }

    pub fn set_indent(&mut self, indentation: Indentation) -> Result<&mut Self> {
        indentation.validate()?;
        self.properties.indentation = indentation;
        Ok(self)
    }

    pub fn set_spacing_before(&mut self, twips: i32) -> Result<&mut Self> {
        check_positive_twips("spacing_before", twips)?;
        self.properties.spacing_before = Some(twips);
        Ok(self)
    }

    pub fn set_spacing_after(&mut self, twips: i32) -> Result<&mut Self> {
        check_positive_twips("spacing_after", twips)?;
        self.properties.spacing_after = Some(twips);
        Ok(self)
    }

    pub fn set_line_spacing(&mut self, spacing: LineSpacing) -> Result<&mut Self> {
        spacing.validate()?;
        self.properties.line_spacing = Some(spacing);
        Ok(self)
    }

    /// Paragraph style ID (resolved by the consumer)
    pub fn set_style(&mut self, style: &str) -> Result<&mut Self> {
        if style.trim().is_empty() {
            return Err(DocxError::validation("style", "style id must not be empty"));
        }
        self.properties.style = Some(style.to_string());
        Ok(self)
    }

    pub fn style(&self) -> Option<&str> {
        self.properties.style.as_deref()
    }

    pub(crate) fn properties_style_unchecked(&mut self, style: &'static str) {
        self.properties.style = Some(style.to_string());
    }

    pub fn set_numbering(&mut self, num_id: u32, level: u8) -> Result<&mut Self> {
        if num_id == 0 {
            return Err(DocxError::validation("num_id", "numbering id 0 means no list"));
        }
        check_level("numbering_level", level)?;
        self.properties.numbering = Some(NumberingRef { num_id, level });
        Ok(self)
    }

    pub fn clear_numbering(&mut self) -> &mut Self {
        self.properties.numbering = None;
        self
    }

    pub fn set_outline_level(&mut self, level: u8) -> Result<&mut Self> {
        check_level("outline_level", level)?;
        self.properties.outline_level = Some(level);
        Ok(self)
    }

    pub fn set_borders(&mut self, borders: Borders) -> Result<&mut Self> {
        borders.validate()?;
        self.properties.borders = borders;
        Ok(self)
    }

    pub fn set_shading(&mut self, shading: Shading) -> &mut Self {
        self.properties.shading = Some(shading);
        self
    }

    pub fn set_keep_next(&mut self, keep: bool) -> &mut Self {
        self.properties.keep_next = keep;
        self
    }

    pub fn set_keep_lines(&mut self, keep: bool) -> &mut Self {
        self.properties.keep_lines = keep;
        self
    }

    pub fn set_page_break_before(&mut self, page_break: bool) -> &mut Self {
        self.properties.page_break_before = page_break;
        self
    }
}

fn push_run_text(out: &mut String, run: &Run) {
    match run.content() {
        RunContent::Text(text) => out.push_str(text),
        RunContent::Tab => out.push('\t'),
        RunContent::Break(BreakType::Line) => out.push('\n'),
        RunContent::Break(_) | RunContent::Image(_) => {}
    }
}
