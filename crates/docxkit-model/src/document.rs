//! Document root: body, sections, metadata and lists

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use log::debug;

use crate::context::DocumentContext;
use crate::error::{DocxError, Result};
use crate::field::Field;
use crate::image::DimensionProbe;
use crate::metadata::Metadata;
use crate::numbering::{ListKind, ListLevel, NumberingCatalog};
use crate::options::DocumentOptions;
use crate::paragraph::{HyperlinkTarget, Paragraph};
use crate::relationships::RelationshipTable;
use crate::section::{HeaderFooter, Section};
use crate::styles::StyleRegistry;
use crate::table::{CellContent, Table};

/// Top-level block of the body, in document order
#[derive(Debug)]
pub enum BodyElement {
    Paragraph(Paragraph),
    Table(Table),
    /// Ends the section it carries; content after it belongs to the next one
    SectionBreak(Section),
}

/// A word-processing document
///
/// A document is the sole owner of its ID generator, relationship table,
/// media store and style registry, so it is not `Clone`: a copy would keep
/// registering parts in the original's package. Write it out and read it back
/// to get an independent document.
///
/// ```compile_fail
/// let doc = docxkit_model::Document::new();
/// let copy = doc.clone();
/// ```
#[derive(Debug)]
pub struct Document {
    ctx: DocumentContext,
    body: Vec<BodyElement>,
    /// Section of the content after the last break
    section: Section,
    metadata: Metadata,
    numbering: NumberingCatalog,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    pub fn with_options(options: DocumentOptions) -> Self {
        Self::from_context(DocumentContext::with_default_probe(options))
    }

    /// Use a custom image dimension probe
    pub fn with_probe(options: DocumentOptions, probe: Arc<dyn DimensionProbe>) -> Self {
        Self::from_context(DocumentContext::new(options, probe))
    }

    fn from_context(ctx: DocumentContext) -> Self {
        let rels = ctx.relationships();
        rels.add_part(RelationshipTable::TYPE_STYLES, "styles.xml");
        rels.add_part(RelationshipTable::TYPE_SETTINGS, "settings.xml");
        Self {
            section: Section::new(ctx.clone()),
            ctx,
            body: Vec::new(),
            metadata: Metadata::default(),
            numbering: NumberingCatalog::new(),
        }
    }

    /// Shared services; clone it to build subtrees elsewhere
    pub fn context(&self) -> &DocumentContext {
        &self.ctx
    }

    pub fn styles(&self) -> &StyleRegistry {
        self.ctx.styles()
    }

    pub fn relationships(&self) -> &RelationshipTable {
        self.ctx.relationships()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Metadata) -> &mut Self {
        self.metadata = metadata;
        self
    }

    pub fn body(&self) -> &[BodyElement] {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        !self
            .body
            .iter()
            .any(|e| !matches!(e, BodyElement::SectionBreak(_)))
    }

    pub fn add_paragraph(&mut self) -> &mut Paragraph {
        let paragraph = Paragraph::new(self.ctx.clone());
        self.push_paragraph(paragraph)
    }

    fn push_paragraph(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        self.body.push(BodyElement::Paragraph(paragraph));
        match self.body.last_mut() {
            Some(BodyElement::Paragraph(p)) => p,
            _ => unreachable!("just pushed a paragraph"),
        }
    }

    fn push_table(&mut self, table: Table) -> &mut Table {
        self.body.push(BodyElement::Table(table));
        match self.body.last_mut() {
            Some(BodyElement::Table(t)) => t,
            _ => unreachable!("just pushed a table"),
        }
    }

    /// Heading paragraph styled `Heading<level>`, level in 1..=9
    pub fn add_heading(&mut self, text: &str, level: u8) -> Result<&mut Paragraph> {
        let style = StyleRegistry::heading_id(level).ok_or_else(|| {
            DocxError::validation("level", format!("heading level {level} is outside 1..=9"))
        })?;
        let paragraph = self.add_paragraph();
        paragraph.set_style(&style)?.set_outline_level(level - 1)?;
        paragraph.add_run(text);
        Ok(paragraph)
    }

    /// Paragraph styled `Title`
    pub fn add_title(&mut self, text: &str) -> &mut Paragraph {
        let mut paragraph = Paragraph::new(self.ctx.clone());
        paragraph.properties_style_unchecked("Title");
        paragraph.add_run(text);
        self.push_paragraph(paragraph)
    }

    /// Table of `rows` x `cols` empty cells (rows in 1..=1000, cols in 1..=63)
    pub fn add_table(&mut self, rows: usize, cols: usize) -> Result<&mut Table> {
        let table = Table::new(self.ctx.clone(), rows, cols)?;
        Ok(self.push_table(table))
    }

    /// Paragraph holding only a page break
    pub fn add_page_break(&mut self) -> &mut Paragraph {
        let paragraph = self.add_paragraph();
        paragraph.add_page_break();
        paragraph
    }

    /// TOC field covering heading levels `1..=levels`
    ///
    /// The field is left dirty so Word rebuilds it when the file is opened.
    pub fn add_table_of_contents(&mut self, levels: u8) -> Result<&mut Paragraph> {
        let field = Field::table_of_contents(levels)?;
        let paragraph = self.add_paragraph();
        paragraph.add_field(field);
        Ok(paragraph)
    }

    /// Attach a paragraph built from this document's context
    pub fn attach_paragraph(&mut self, paragraph: Paragraph) -> Result<&mut Paragraph> {
        self.check_owned(paragraph.context(), "paragraph")?;
        Ok(self.push_paragraph(paragraph))
    }

    /// Attach a table built from this document's context
    pub fn attach_table(&mut self, table: Table) -> Result<&mut Table> {
        self.check_owned(table.context(), "table")?;
        Ok(self.push_table(table))
    }

    fn check_owned(&self, ctx: &DocumentContext, what: &'static str) -> Result<()> {
        if !ctx.same_part(&self.ctx) {
            return Err(DocxError::validation(
                what,
                format!("{what} was built for another document or part"),
            ));
        }
        Ok(())
    }

    /// Preset list; returns the num id for `add_list_item`
    pub fn add_list(&mut self, kind: ListKind) -> u32 {
        self.ensure_numbering_part();
        self.numbering.add_list(kind)
    }

    pub fn add_custom_list(&mut self, levels: Vec<ListLevel>) -> Result<u32> {
        let num_id = self.numbering.add_custom(levels)?;
        self.ensure_numbering_part();
        Ok(num_id)
    }

    fn ensure_numbering_part(&self) {
        let rels = self.ctx.relationships();
        let present = rels
            .all()
            .iter()
            .any(|r| r.rel_type == RelationshipTable::TYPE_NUMBERING);
        if !present {
            rels.add_part(RelationshipTable::TYPE_NUMBERING, "numbering.xml");
        }
    }

    /// Paragraph in list `num_id` at `level` (0..=8)
    pub fn add_list_item(&mut self, num_id: u32, level: u8, text: &str) -> Result<&mut Paragraph> {
        if !self.numbering.contains(num_id) {
            return Err(DocxError::not_found("list", num_id.to_string()));
        }
        let mut paragraph = Paragraph::new(self.ctx.clone());
        paragraph.set_numbering(num_id, level)?;
        paragraph.properties_style_unchecked("ListParagraph");
        paragraph.add_run(text);
        Ok(self.push_paragraph(paragraph))
    }

    pub fn numbering(&self) -> &NumberingCatalog {
        &self.numbering
    }

    /// End the current section; returns the new one, which copies its layout
    pub fn add_section(&mut self) -> &mut Section {
        let next = self.section.next_section();
        let finished = std::mem::replace(&mut self.section, next);
        debug!("section {} closed", finished.id());
        self.body.push(BodyElement::SectionBreak(finished));
        &mut self.section
    }

    /// All sections in order; the last one is never absent
    pub fn sections(&self) -> Vec<&Section> {
        self.body
            .iter()
            .filter_map(|e| match e {
                BodyElement::SectionBreak(s) => Some(s),
                _ => None,
            })
            .chain(std::iter::once(&self.section))
            .collect()
    }

    pub fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        let mut breaks = self.body.iter_mut().filter_map(|e| match e {
            BodyElement::SectionBreak(s) => Some(s),
            _ => None,
        });
        let mut count = 0;
        for section in breaks.by_ref() {
            if count == index {
                return Some(section);
            }
            count += 1;
        }
        (count == index).then_some(&mut self.section)
    }

    pub fn last_section(&self) -> &Section {
        &self.section
    }

    pub fn last_section_mut(&mut self) -> &mut Section {
        &mut self.section
    }

    /// Top-level paragraphs of the body
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.iter_mut().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Top-level tables of the body
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.body.iter_mut().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Every body paragraph, including those inside (nested) table cells
    pub fn all_paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        for element in &self.body {
            match element {
                BodyElement::Paragraph(p) => out.push(p),
                BodyElement::Table(t) => collect_table_paragraphs(t, &mut out),
                BodyElement::SectionBreak(_) => {}
            }
        }
        out
    }

    /// Text of the top-level paragraphs, one per line
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Recompute field results everywhere, using the local clock
    pub fn update_fields(&mut self) {
        self.update_fields_at(Local::now().naive_local());
    }

    pub fn update_fields_at(&mut self, now: NaiveDateTime) {
        let mut update = |p: &mut Paragraph| p.update_fields_at(now);
        for element in &mut self.body {
            match element {
                BodyElement::Paragraph(p) => update(p),
                BodyElement::Table(t) => visit_table_paragraphs_mut(t, &mut update),
                BodyElement::SectionBreak(s) => visit_section_paragraphs_mut(s, &mut update),
            }
        }
        visit_section_paragraphs_mut(&mut self.section, &mut update);
    }

    /// Pre-flight check before packaging
    ///
    /// The body must have content, and every image, hyperlink, header, footer
    /// and list reference must resolve.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(DocxError::InvalidState("document has no content".into()));
        }
        for paragraph in self.all_paragraphs() {
            self.validate_paragraph(paragraph, self.ctx.relationships())?;
        }
        let rels = self.ctx.relationships();
        for section in self.sections() {
            for part in section.headers().chain(section.footers()) {
                validate_part_reference(rels, part)?;
                for paragraph in part.paragraphs() {
                    self.validate_paragraph(paragraph, part.relationships())?;
                }
            }
        }
        Ok(())
    }

    fn validate_paragraph(&self, paragraph: &Paragraph, rels: &RelationshipTable) -> Result<()> {
        for image in paragraph.images() {
            let rel_id = image.relationship_id().ok_or_else(|| {
                DocxError::InvalidState(format!("image {} has no relationship", image.id()))
            })?;
            let rel = rels.get(rel_id)?;
            self.ctx.media().get_by_path(&rel.target)?;
        }
        for link in paragraph.hyperlinks() {
            if let HyperlinkTarget::External { relationship_id, .. } = link.target() {
                rels.get(relationship_id)?;
            }
        }
        if let Some(numbering) = &paragraph.properties().numbering {
            if !self.numbering.contains(numbering.num_id) {
                return Err(DocxError::not_found("list", numbering.num_id.to_string()));
            }
        }
        Ok(())
    }
}

fn validate_part_reference(rels: &RelationshipTable, part: &HeaderFooter) -> Result<()> {
    let rel = rels.get(part.relationship_id())?;
    if rel.target != part.target() {
        return Err(DocxError::InvalidState(format!(
            "{} points at {} instead of {}",
            rel.id,
            rel.target,
            part.target()
        )));
    }
    Ok(())
}

fn collect_table_paragraphs<'a>(table: &'a Table, out: &mut Vec<&'a Paragraph>) {
    for cell in table.cells() {
        for item in cell.content() {
            match item {
                CellContent::Paragraph(p) => out.push(p),
                CellContent::Table(t) => collect_table_paragraphs(t, out),
            }
        }
    }
}

fn visit_table_paragraphs_mut(table: &mut Table, f: &mut dyn FnMut(&mut Paragraph)) {
    for row in table.rows_mut() {
        for cell in row.cells_mut() {
            for item in cell.content_mut() {
                match item {
                    CellContent::Paragraph(p) => f(p),
                    CellContent::Table(t) => visit_table_paragraphs_mut(t, f),
                }
            }
        }
    }
}

fn visit_section_paragraphs_mut(section: &mut Section, f: &mut dyn FnMut(&mut Paragraph)) {
    for part in section.parts_mut() {
        part.paragraphs_mut().iter_mut().for_each(&mut *f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::section::HeaderType;

    #[test]
    fn test_new_document_registers_core_parts() {
        let doc = Document::new();
        let rels = doc.relationships().all();
        let targets: Vec<_> = rels.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, ["styles.xml", "settings.xml"]);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(doc.sections().len(), 1);
    }

    #[test]
    fn test_validate_requires_content() {
        let mut doc = Document::new();
        assert_eq!(doc.validate().unwrap_err().kind(), ErrorKind::InvalidState);
        doc.add_section();
        assert!(doc.validate().is_err());
        doc.add_paragraph().add_run("text");
        doc.validate().unwrap();
    }

    #[test]
    fn test_headings() {
        let mut doc = Document::new();
        let h = doc.add_heading("Intro", 2).unwrap();
        assert_eq!(h.style(), Some("Heading2"));
        assert_eq!(h.properties().outline_level, Some(1));
        assert!(doc.add_heading("x", 0).is_err());
        assert!(doc.add_heading("x", 10).is_err());
        assert_eq!(doc.paragraphs().count(), 1);
    }

    #[test]
    fn test_lists_add_numbering_part_once() {
        let mut doc = Document::new();
        assert!(doc.add_list_item(1, 0, "orphan").is_err());
        let bullets = doc.add_list(ListKind::Bullet);
        let numbers = doc.add_list(ListKind::Decimal);
        doc.add_list_item(bullets, 0, "a").unwrap();
        doc.add_list_item(numbers, 1, "b").unwrap();
        assert!(doc.add_list_item(numbers, 9, "c").is_err());

        let numbering_rels = doc
            .relationships()
            .all()
            .into_iter()
            .filter(|r| r.rel_type == RelationshipTable::TYPE_NUMBERING)
            .count();
        assert_eq!(numbering_rels, 1);
        assert_eq!(doc.paragraphs().count(), 2);
        doc.validate().unwrap();
    }

    #[test]
    fn test_attach_rejects_foreign_entities() {
        let mut doc = Document::new();
        let other = Document::new();
        let foreign = other.context().new_paragraph();
        let err = doc.attach_paragraph(foreign).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(doc.attach_table(other.context().new_table(1, 1).unwrap()).is_err());

        let own = doc.context().new_table(2, 2).unwrap();
        doc.attach_table(own).unwrap();
        assert_eq!(doc.tables().count(), 1);
    }

    #[test]
    fn test_attach_rejects_header_paragraphs() {
        let mut doc = Document::new();
        let header_ctx = doc
            .last_section_mut()
            .header(HeaderType::Default)
            .unwrap()
            .context()
            .clone();
        assert!(doc.attach_paragraph(header_ctx.new_paragraph()).is_err());
    }

    #[test]
    fn test_parallel_table_construction() {
        let mut doc = Document::new();
        let ctx = doc.context().clone();
        let tables: Vec<Table> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let ctx = ctx.clone();
                    scope.spawn(move || {
                        let mut table = ctx.new_table(3, 3).unwrap();
                        table.cell_mut(0, 0).unwrap().set_text(&format!("table {i}"));
                        table
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for table in tables {
            doc.attach_table(table).unwrap();
        }
        let mut ids: Vec<_> = doc
            .tables()
            .flat_map(|t| t.cells().map(|c| c.id().to_string()))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(total, 36);
    }

    #[test]
    fn test_sections_and_layout_inheritance() {
        let mut doc = Document::new();
        doc.add_paragraph().add_run("one");
        doc.last_section_mut()
            .set_orientation(crate::section::Orientation::Landscape);
        let second = doc.add_section();
        assert_eq!(second.orientation(), crate::section::Orientation::Landscape);
        assert!(second.get_header(HeaderType::Default).is_none());
        doc.add_paragraph().add_run("two");

        assert_eq!(doc.sections().len(), 2);
        assert!(doc.section_mut(0).is_some());
        assert!(doc.section_mut(1).is_some());
        assert!(doc.section_mut(2).is_none());
        assert_eq!(doc.text(), "one\ntwo");
    }

    #[test]
    fn test_validate_catches_dangling_hyperlink() {
        let mut doc = Document::new();
        let link_rel = {
            let link = doc
                .add_paragraph()
                .add_hyperlink("https://example.com", "x")
                .unwrap();
            match link.target() {
                HyperlinkTarget::External { relationship_id, .. } => relationship_id.clone(),
                HyperlinkTarget::Anchor(_) => unreachable!(),
            }
        };
        doc.validate().unwrap();
        doc.relationships().delete(&link_rel).unwrap();
        assert_eq!(doc.validate().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_fields_reaches_footers() {
        let mut doc = Document::new();
        doc.add_paragraph().add_field(Field::date("yyyy"));
        doc.last_section_mut()
            .footer(HeaderType::Default)
            .unwrap()
            .add_paragraph()
            .add_field(Field::page_number());
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        doc.update_fields_at(now);

        let body_field = doc.paragraphs().next().unwrap().fields().next().unwrap();
        assert_eq!(body_field.result(), "2024");
        let footer = doc.last_section().get_footer(HeaderType::Default).unwrap();
        let footer_field = footer.paragraphs()[0].fields().next().unwrap();
        assert_eq!(footer_field.result(), "1");
        assert!(!footer_field.is_dirty());
    }
}
