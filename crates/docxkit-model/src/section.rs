//! Page layout sections with their headers and footers

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::context::DocumentContext;
use crate::error::{DocxError, Result, ResultExt};
use crate::field::Field;
use crate::format::Alignment;
use crate::ids::IdKind;
use crate::paragraph::Paragraph;
use crate::relationships::{RelationshipTable, TargetMode};
use crate::units::{check_positive_twips, MAX_TWIPS};

/// Highest column count of a section
pub const MAX_COLUMNS: u8 = 10;

/// Page dimensions in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: i32,
    pub height: i32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize { width: 12_240, height: 15_840 };
    pub const LEGAL: PageSize = PageSize { width: 12_240, height: 20_160 };
    pub const A4: PageSize = PageSize { width: 11_906, height: 16_838 };
    pub const A5: PageSize = PageSize { width: 8_391, height: 11_906 };

    fn validate(&self) -> Result<()> {
        check_page_extent("page_width", self.width)?;
        check_page_extent("page_height", self.height)
    }

    fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "portrait" => Some(Self::Portrait),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }
}

/// Page margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
    /// Distance from the page edge to the header
    pub header: i32,
    /// Distance from the page edge to the footer
    pub footer: i32,
    pub gutter: i32,
}

impl Margins {
    /// Same margin on all four sides
    pub fn uniform(twips: i32) -> Self {
        Self {
            top: twips,
            right: twips,
            bottom: twips,
            left: twips,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        check_positive_twips("margin_top", self.top)?;
        check_positive_twips("margin_right", self.right)?;
        check_positive_twips("margin_bottom", self.bottom)?;
        check_positive_twips("margin_left", self.left)?;
        check_positive_twips("margin_header", self.header)?;
        check_positive_twips("margin_footer", self.footer)?;
        check_positive_twips("margin_gutter", self.gutter)
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 1440,
            right: 1440,
            bottom: 1440,
            left: 1440,
            header: 720,
            footer: 720,
            gutter: 0,
        }
    }
}

/// Which pages a header or footer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderFooterType {
    Default,
    /// First page (enables the title-page flag)
    First,
    Even,
}

pub type HeaderType = HeaderFooterType;
pub type FooterType = HeaderFooterType;

impl HeaderFooterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::First => "first",
            Self::Even => "even",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "default" => Some(Self::Default),
            "first" => Some(Self::First),
            "even" => Some(Self::Even),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Header,
    Footer,
}

impl PartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
        }
    }
}

/// Header or footer part content
#[derive(Debug, Clone)]
pub struct HeaderFooter {
    kind: PartKind,
    scope: HeaderFooterType,
    relationship_id: String,
    target: String,
    ctx: DocumentContext,
    paragraphs: Vec<Paragraph>,
}

impl HeaderFooter {
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn scope(&self) -> HeaderFooterType {
        self.scope
    }

    /// ID of the relationship from `document.xml` to this part
    pub fn relationship_id(&self) -> &str {
        &self.relationship_id
    }

    /// Part file name relative to `word/` (`header1.xml`)
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Relationships of this part (images, hyperlinks inside it)
    pub fn relationships(&self) -> &Arc<RelationshipTable> {
        self.ctx.relationships()
    }

    pub fn context(&self) -> &DocumentContext {
        &self.ctx
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    pub fn add_paragraph(&mut self) -> &mut Paragraph {
        self.paragraphs.push(Paragraph::new(self.ctx.clone()));
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Paragraph holding `text`
    pub fn add_text(&mut self, text: &str) -> &mut Paragraph {
        let paragraph = self.add_paragraph();
        paragraph.add_run(text);
        paragraph
    }

    /// "Page N of M" line built from PAGE and NUMPAGES fields
    pub fn add_page_number(&mut self, alignment: Alignment) -> &mut Paragraph {
        let paragraph = self.add_paragraph();
        paragraph.set_alignment(alignment);
        paragraph.add_run("Page ");
        paragraph.add_field(Field::page_number());
        paragraph.add_run(" of ");
        paragraph.add_field(Field::page_count());
        paragraph
    }

    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Page layout for a span of the body (`w:sectPr`)
#[derive(Debug, Clone)]
pub struct Section {
    id: String,
    ctx: DocumentContext,
    page_size: PageSize,
    orientation: Orientation,
    margins: Margins,
    columns: u8,
    column_spacing: i32,
    title_page: bool,
    headers: BTreeMap<HeaderType, HeaderFooter>,
    footers: BTreeMap<FooterType, HeaderFooter>,
}

impl Section {
    pub(crate) fn new(ctx: DocumentContext) -> Self {
        Self {
            id: ctx.ids().next(IdKind::Section),
            ctx,
            page_size: PageSize::default(),
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            columns: 1,
            column_spacing: 720,
            title_page: false,
            headers: BTreeMap::new(),
            footers: BTreeMap::new(),
        }
    }

    /// A new section with this section's page layout and no headers or footers
    pub(crate) fn next_section(&self) -> Self {
        Self {
            page_size: self.page_size,
            orientation: self.orientation,
            margins: self.margins,
            columns: self.columns,
            column_spacing: self.column_spacing,
            ..Self::new(self.ctx.clone())
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Page size as given; orientation is not re-derived from it
    pub fn set_page_size(&mut self, size: PageSize) -> Result<&mut Self> {
        size.validate()?;
        self.page_size = size;
        Ok(self)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Switch orientation, swapping width and height when it changes
    pub fn set_orientation(&mut self, orientation: Orientation) -> &mut Self {
        if orientation != self.orientation {
            self.page_size = self.page_size.swapped();
            self.orientation = orientation;
        }
        self
    }

    /// Set size and orientation together; dimensions are taken as given
    pub fn set_layout(&mut self, size: PageSize, orientation: Orientation) -> Result<&mut Self> {
        size.validate()?;
        self.page_size = size;
        self.orientation = orientation;
        Ok(self)
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn set_margins(&mut self, margins: Margins) -> Result<&mut Self> {
        margins.validate()?;
        self.margins = margins;
        Ok(self)
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn column_spacing(&self) -> i32 {
        self.column_spacing
    }

    /// Column count in 1..=10 with the gap between columns in twips
    pub fn set_columns(&mut self, count: u8, spacing: i32) -> Result<&mut Self> {
        if !(1..=MAX_COLUMNS).contains(&count) {
            return Err(DocxError::validation(
                "columns",
                format!("{count} is outside 1..={MAX_COLUMNS}"),
            ));
        }
        check_positive_twips("column_spacing", spacing)?;
        self.columns = count;
        self.column_spacing = spacing;
        Ok(self)
    }

    /// Whether the first page uses the `First` header and footer
    pub fn title_page(&self) -> bool {
        self.title_page
    }

    pub fn set_title_page(&mut self, title_page: bool) -> &mut Self {
        self.title_page = title_page;
        self
    }

    /// Header of the given type, created on first access
    pub fn header(&mut self, scope: HeaderType) -> Result<&mut HeaderFooter> {
        self.part(PartKind::Header, scope)
    }

    /// Footer of the given type, created on first access
    pub fn footer(&mut self, scope: FooterType) -> Result<&mut HeaderFooter> {
        self.part(PartKind::Footer, scope)
    }

    pub fn get_header(&self, scope: HeaderType) -> Option<&HeaderFooter> {
        self.headers.get(&scope)
    }

    pub fn get_footer(&self, scope: FooterType) -> Option<&HeaderFooter> {
        self.footers.get(&scope)
    }

    pub fn headers(&self) -> impl Iterator<Item = &HeaderFooter> {
        self.headers.values()
    }

    pub fn footers(&self) -> impl Iterator<Item = &HeaderFooter> {
        self.footers.values()
    }

    pub(crate) fn parts_mut(&mut self) -> impl Iterator<Item = &mut HeaderFooter> {
        self.headers.values_mut().chain(self.footers.values_mut())
    }

    fn part(&mut self, kind: PartKind, scope: HeaderFooterType) -> Result<&mut HeaderFooter> {
        let parts = match kind {
            PartKind::Header => &mut self.headers,
            PartKind::Footer => &mut self.footers,
        };
        if !parts.contains_key(&scope) {
            let (id_kind, rel_type) = match kind {
                PartKind::Header => (IdKind::Header, RelationshipTable::TYPE_HEADER),
                PartKind::Footer => (IdKind::Footer, RelationshipTable::TYPE_FOOTER),
            };
            let target = format!(
                "{}{}.xml",
                kind.as_str(),
                self.ctx.ids().next_number(id_kind)
            );
            let relationship_id = self
                .ctx
                .relationships()
                .add(rel_type, &target, TargetMode::Internal)
                .context("create_header_footer")?;
            debug!("created {} {target} as {relationship_id}", scope.as_str());
            let part_rels = Arc::new(RelationshipTable::new(Arc::clone(self.ctx.ids())));
            parts.insert(
                scope,
                HeaderFooter {
                    kind,
                    scope,
                    relationship_id,
                    target,
                    ctx: self.ctx.for_part(part_rels),
                    paragraphs: Vec::new(),
                },
            );
            if scope == HeaderFooterType::First {
                self.title_page = true;
            }
        }
        match parts.get_mut(&scope) {
            Some(part) => Ok(part),
            None => Err(DocxError::Internal(format!(
                "{} {} missing after creation",
                scope.as_str(),
                kind.as_str()
            ))),
        }
    }
}

fn check_page_extent(field: &'static str, value: i32) -> Result<()> {
    if value <= 0 || value > MAX_TWIPS {
        return Err(DocxError::validation(
            field,
            format!("{value} twips is outside 1..={MAX_TWIPS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DocumentOptions;

    fn section() -> Section {
        Section::new(DocumentContext::with_default_probe(DocumentOptions::default()))
    }

    #[test]
    fn test_defaults() {
        let s = section();
        assert_eq!(s.page_size(), PageSize::LETTER);
        assert_eq!(s.margins().left, 1440);
        assert_eq!(s.margins().header, 720);
        assert_eq!(s.columns(), 1);
        assert!(!s.title_page());
    }

    #[test]
    fn test_orientation_swaps_dimensions() {
        let mut s = section();
        s.set_page_size(PageSize::A4).unwrap();
        s.set_orientation(Orientation::Landscape);
        assert_eq!(s.page_size(), PageSize { width: 16_838, height: 11_906 });
        s.set_orientation(Orientation::Landscape);
        assert_eq!(s.page_size().width, 16_838);
        s.set_orientation(Orientation::Portrait);
        assert_eq!(s.page_size(), PageSize::A4);
    }

    #[test]
    fn test_layout_bounds() {
        let mut s = section();
        assert!(s.set_page_size(PageSize { width: 0, height: 100 }).is_err());
        assert!(s.set_page_size(PageSize { width: 31_681, height: 100 }).is_err());
        assert!(s.set_margins(Margins::uniform(-1)).is_err());
        assert!(s.set_columns(0, 720).is_err());
        assert!(s.set_columns(11, 720).is_err());
        s.set_columns(3, 360).unwrap();
        assert_eq!((s.columns(), s.column_spacing()), (3, 360));
        assert_eq!(s.page_size(), PageSize::LETTER);
    }

    #[test]
    fn test_headers_created_once() {
        let mut s = section();
        let rel_id = s.header(HeaderType::Default).unwrap().relationship_id().to_string();
        s.header(HeaderType::Default).unwrap().add_text("Title");
        assert_eq!(s.headers().count(), 1);
        assert_eq!(s.get_header(HeaderType::Default).unwrap().relationship_id(), rel_id);
        assert_eq!(s.get_header(HeaderType::Default).unwrap().target(), "header1.xml");

        let rel = s.ctx.relationships().get(&rel_id).unwrap();
        assert_eq!(rel.rel_type, RelationshipTable::TYPE_HEADER);
        assert_eq!(rel.target, "header1.xml");
    }

    #[test]
    fn test_first_page_footer_sets_title_page() {
        let mut s = section();
        let footer = s.footer(FooterType::First).unwrap();
        footer.add_page_number(Alignment::Center);
        assert_eq!(footer.target(), "footer1.xml");
        assert_eq!(footer.text(), "Page  of ");
        assert!(s.title_page());
    }

    #[test]
    fn test_part_relationships_are_scoped() {
        let mut s = section();
        let header = s.header(HeaderType::Even).unwrap();
        header
            .add_paragraph()
            .add_hyperlink("https://example.com", "site")
            .unwrap();
        assert_eq!(header.relationships().len(), 1);
        // the document table only holds the header relationship itself
        assert_eq!(s.ctx.relationships().len(), 1);
    }
}
