//! `.docx` package to document
//!
//! Re-hydrates packages written by [`crate::Packager`]. Relationship and media
//! IDs are registered as found so that the generator continues past them;
//! content this library never writes is skipped with a warning.

use std::collections::HashMap;
use std::path::Path;

use docxkit_model::ids::numeric_suffix;
use docxkit_model::image::content_type_for_extension;
use docxkit_model::{
    Alignment, AxisPosition, Border, BorderStyle, Borders, BreakType, Color, Document,
    DocumentContext, DocumentOptions, Field, FloatingPosition, Font, HeaderFooter,
    HeaderFooterType, HeightRule, HighlightColor, IdKind, ImagePosition, ImageSize, LineSpacing,
    LineSpacingRule, ListLevel, Margins, NumberFormat, NumberingRef, Orientation, PageSize,
    Paragraph, ParagraphProperties, PartKind, PositionAlign, Relationship, RelationshipTable,
    RelativeFrom, RunProperties, Section, Shading, ShadingPattern, Style, StyleRegistry,
    StyleType, Table, TableWidth, UnderlineStyle, VerticalAlignment, VerticalMerge,
    VerticalPosition, WrapType,
};
use log::{debug, warn};

use crate::archive::PackageArchive;
use crate::content_types::{ContentTypes, CONTENT_TYPES_PART};
use crate::error::{OoxmlError, Result};
use crate::packager::{DOCUMENT_PART, PACKAGE_RELS_PART};
use crate::properties::{self, APP_PART, CORE_PART};
use crate::relationships::{self, rels_path_for};
use crate::xml::XmlNode;

/// Original relationship ID -> ID in the rebuilt table, for IDs that moved
type RelMap = HashMap<String, String>;

/// Reads packages back into [`Document`]s
#[derive(Debug, Clone)]
pub struct DocxReader {
    archive: PackageArchive,
    options: DocumentOptions,
}

impl DocxReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_archive(PackageArchive::open(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_archive(PackageArchive::from_bytes(bytes)?))
    }

    pub fn from_archive(archive: PackageArchive) -> Self {
        Self {
            archive,
            options: DocumentOptions::default(),
        }
    }

    /// Options for the document being rebuilt
    pub fn with_options(mut self, options: DocumentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn archive(&self) -> &PackageArchive {
        &self.archive
    }

    pub fn read(&self) -> Result<Document> {
        let main = self.main_part()?;
        let base_dir = main.rsplit_once('/').map_or("", |(dir, _)| dir).to_string();
        let mut doc = Document::with_options(self.options.clone());

        if let Some(xml) = self.archive.get(CORE_PART) {
            properties::parse_core(xml, doc.metadata_mut())?;
        }
        if let Some(xml) = self.archive.get(APP_PART) {
            properties::parse_app(xml, doc.metadata_mut())?;
        }

        let doc_rels = match self.archive.get(&rels_path_for(&main)) {
            Some(xml) => relationships::parse(xml)?,
            None => Vec::new(),
        };
        // parts minted while rebuilding (numbering, headers) must not take package IDs
        for rel in &doc_rels {
            doc.context().ids().observe(IdKind::Relationship, &rel.id);
        }
        let content_types = match self.archive.get(CONTENT_TYPES_PART) {
            Some(xml) => ContentTypes::parse(xml)?,
            None => ContentTypes::new(),
        };

        let mut hydrator = Hydrator {
            archive: &self.archive,
            content_types,
            base_dir,
            parts: doc_rels.iter().map(|rel| (rel.id.clone(), rel.clone())).collect(),
            rel_map: RelMap::new(),
            numbering: HashMap::new(),
        };

        if let Some(xml) = hydrator.part_of_type(RelationshipTable::TYPE_STYLES) {
            let added = read_styles(doc.styles(), xml)?;
            debug!("re-registered {added} custom styles");
        }
        if let Some(xml) = hydrator.part_of_type(RelationshipTable::TYPE_NUMBERING) {
            hydrator.numbering = read_numbering(&mut doc, xml)?;
        }
        hydrator.rel_map = hydrator.register_rels(doc.context(), &hydrator.base_dir, &doc_rels)?;

        let root = XmlNode::parse(self.archive.require(&main)?)?;
        let body = root
            .child("w:body")
            .ok_or_else(|| OoxmlError::InvalidStructure(format!("{main} has no w:body")))?;
        hydrator.read_body(&mut doc, body)?;

        debug!(
            "re-hydrated {main}: {} body elements, {} sections, {} media",
            doc.body().len(),
            doc.sections().len(),
            doc.context().media().count()
        );
        Ok(doc)
    }

    /// Main document part named by `_rels/.rels`
    fn main_part(&self) -> Result<String> {
        let Some(xml) = self.archive.get(PACKAGE_RELS_PART) else {
            return Ok(DOCUMENT_PART.to_string());
        };
        let main = relationships::parse(xml)?
            .into_iter()
            .find(|rel| rel.rel_type == RelationshipTable::TYPE_OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target));
        Ok(main.unwrap_or_else(|| DOCUMENT_PART.to_string()))
    }
}

/// Read-only state shared by the body walk
struct Hydrator<'a> {
    archive: &'a PackageArchive,
    content_types: ContentTypes,
    /// Folder of the main document part
    base_dir: String,
    /// Relationships of the main document part as found in the package
    parts: HashMap<String, Relationship>,
    rel_map: RelMap,
    /// Package `w:numId` -> rebuilt list
    numbering: HashMap<u32, u32>,
}

impl<'a> Hydrator<'a> {
    fn part_of_type(&self, rel_type: &str) -> Option<&'a [u8]> {
        let rel = self.parts.values().find(|rel| rel.rel_type == rel_type)?;
        self.archive.get(&resolve_target(&self.base_dir, &rel.target))
    }

    /// Register the image and hyperlink relationships of one part
    fn register_rels(
        &self,
        ctx: &DocumentContext,
        dir: &str,
        rels: &[Relationship],
    ) -> Result<RelMap> {
        let table = ctx.relationships();
        let mut map = RelMap::new();
        for rel in rels {
            ctx.ids().observe(IdKind::Relationship, &rel.id);
            if rel.rel_type == RelationshipTable::TYPE_IMAGE {
                if rel.is_external() {
                    warn!("skipping linked image {} -> {}", rel.id, rel.target);
                    continue;
                }
                if !self.register_media(ctx, dir, &rel.target)? {
                    continue;
                }
            } else if rel.rel_type != RelationshipTable::TYPE_HYPERLINK {
                continue;
            }

            let id = match table.get(&rel.id) {
                Ok(existing) if existing.rel_type == rel.rel_type && existing.target == rel.target => {
                    existing.id
                }
                Ok(_) => table.add(&rel.rel_type, &rel.target, rel.mode)?,
                Err(_) => {
                    table.register_existing(&rel.id, &rel.rel_type, &rel.target, rel.mode)?;
                    rel.id.clone()
                }
            };
            if id != rel.id {
                debug!("relationship {} re-keyed as {id}", rel.id);
                map.insert(rel.id.clone(), id);
            }
        }
        Ok(map)
    }

    /// Store an image part; false when the part is missing
    fn register_media(&self, ctx: &DocumentContext, dir: &str, target: &str) -> Result<bool> {
        let path = resolve_target(dir, target);
        let media = ctx.media();
        if media.get_by_path(&path).is_ok() {
            return Ok(true);
        }
        let Some(data) = self.archive.get(&path) else {
            warn!("image part {path} is missing");
            return Ok(false);
        };
        let content_type = match self.content_types.content_type_of(&path) {
            Some(ct) => ct.to_string(),
            None => {
                let ext = path.rsplit_once('.').map_or("", |(_, ext)| ext);
                content_type_for_extension(&ext.to_ascii_lowercase()).to_string()
            }
        };
        let file = path.rsplit('/').next().unwrap_or(&path);
        let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
        let id = match numeric_suffix(stem) {
            Some(n) if media.get(&format!("media{n}")).is_err() => format!("media{n}"),
            _ => path.clone(),
        };
        media.register_existing(&id, &path, &content_type, data.to_vec())?;
        Ok(true)
    }

    fn read_body(&self, doc: &mut Document, body: &XmlNode) -> Result<()> {
        for node in body.elements() {
            match node.name.as_str() {
                "w:p" => {
                    let section = node.child("w:pPr").and_then(|ppr| ppr.child("w:sectPr"));
                    let has_content = node.elements().any(|child| !child.is("w:pPr"));
                    if has_content || section.is_none() {
                        let paragraph = doc.add_paragraph();
                        self.fill_paragraph(paragraph, node, &self.rel_map)?;
                    }
                    if let Some(section) = section {
                        self.apply_section(doc.last_section_mut(), section)?;
                        doc.add_section();
                    }
                }
                "w:tbl" => {
                    let ctx = doc.context().clone();
                    let table = self.read_table(&ctx, node, &self.rel_map)?;
                    doc.attach_table(table)?;
                }
                "w:sectPr" => self.apply_section(doc.last_section_mut(), node)?,
                "w:altChunk" => {
                    return Err(OoxmlError::Unsupported("w:altChunk imported content".into()))
                }
                "w:bookmarkStart" | "w:bookmarkEnd" | "w:proofErr" => {}
                other => warn!("skipping body element <{other}>"),
            }
        }
        Ok(())
    }

    fn fill_paragraph(&self, paragraph: &mut Paragraph, node: &XmlNode, rels: &RelMap) -> Result<()> {
        if let Some(ppr) = node.child("w:pPr") {
            paragraph.set_properties(paragraph_properties(ppr, &self.numbering))?;
        }
        let mut field = FieldState::default();
        for child in node.elements() {
            match child.name.as_str() {
                "w:pPr" | "w:bookmarkEnd" | "w:proofErr" => {}
                "w:r" => self.read_run(paragraph, child, rels, &mut field)?,
                "w:hyperlink" => self.read_hyperlink(paragraph, child, rels)?,
                "w:fldSimple" => {
                    let properties = child
                        .children_named("w:r")
                        .find_map(|r| r.child("w:rPr"))
                        .map(run_properties)
                        .unwrap_or_default();
                    let open = OpenField {
                        code: child.attr("w:instr").unwrap_or_default().to_string(),
                        result: child.children_named("w:r").map(run_text).collect(),
                        dirty: matches!(child.attr("w:dirty"), Some("1" | "true")),
                        separated: true,
                        properties,
                    };
                    push_field(paragraph, open)?;
                }
                "w:bookmarkStart" => {
                    if let Some(name) = child.attr("w:name") {
                        if let Err(err) = paragraph.add_bookmark(name) {
                            warn!("skipping bookmark {name:?}: {err}");
                        }
                    }
                }
                other => warn!("skipping paragraph element <{other}>"),
            }
        }
        if let Some(open) = field.open.take() {
            warn!("field {:?} is not terminated", open.code.trim());
            if !open.result.is_empty() {
                paragraph.add_run(open.result).set_properties(open.properties)?;
            }
        }
        Ok(())
    }

    fn read_run(
        &self,
        paragraph: &mut Paragraph,
        node: &XmlNode,
        rels: &RelMap,
        field: &mut FieldState,
    ) -> Result<()> {
        let properties = node.child("w:rPr").map(run_properties).unwrap_or_default();
        for item in node.elements() {
            match item.name.as_str() {
                "w:rPr" | "w:lastRenderedPageBreak" => {}
                "w:fldChar" => match item.attr("w:fldCharType") {
                    Some("begin") => field.begin(
                        matches!(item.attr("w:dirty"), Some("1" | "true")),
                        properties.clone(),
                    ),
                    Some("separate") => field.separate(),
                    Some("end") => {
                        if let Some(open) = field.end() {
                            push_field(paragraph, open)?;
                        }
                    }
                    other => warn!("unknown field character {other:?}"),
                },
                "w:instrText" => field.instruction(&item.text()),
                "w:t" => {
                    let text = item.text();
                    if !field.capture(&text) {
                        paragraph.add_run(text).set_properties(properties.clone())?;
                    }
                }
                "w:tab" => {
                    if !field.capture("\t") {
                        paragraph.add_tab().set_properties(properties.clone())?;
                    }
                }
                "w:br" | "w:cr" => {
                    let kind = match item.attr("w:type") {
                        Some("page") => BreakType::Page,
                        Some("column") => BreakType::Column,
                        _ => BreakType::Line,
                    };
                    paragraph.add_break(kind).set_properties(properties.clone())?;
                }
                "w:drawing" => self.read_drawing(paragraph, item, rels)?,
                other => warn!("skipping run element <{other}>"),
            }
        }
        Ok(())
    }

    fn read_hyperlink(&self, paragraph: &mut Paragraph, node: &XmlNode, rels: &RelMap) -> Result<()> {
        let runs: Vec<(String, RunProperties)> = node
            .children_named("w:r")
            .map(|r| (run_text(r), r.child("w:rPr").map(run_properties).unwrap_or_default()))
            .collect();

        let link = if let Some(original) = node.attr("r:id") {
            let id = rels.get(original).map_or(original, String::as_str);
            if !paragraph.context().relationships().contains(id) {
                warn!("hyperlink {original} has no relationship; keeping its text");
                for (text, props) in runs {
                    paragraph.add_run(text).set_properties(props)?;
                }
                return Ok(());
            }
            let link = paragraph.link_existing_hyperlink(id)?;
            for (text, props) in runs {
                link.add_run(text).set_properties(props)?;
            }
            link
        } else if let Some(anchor) = node.attr("w:anchor") {
            let mut runs = runs.into_iter();
            let (first_text, first_props) = runs.next().unwrap_or_default();
            let link = paragraph.add_internal_link(anchor, &first_text)?;
            if let Some(run) = link.runs_mut().first_mut() {
                run.set_properties(first_props)?;
            }
            for (text, props) in runs {
                link.add_run(text).set_properties(props)?;
            }
            link
        } else {
            warn!("hyperlink without target; keeping its text");
            for (text, props) in runs {
                paragraph.add_run(text).set_properties(props)?;
            }
            return Ok(());
        };
        if let Some(tooltip) = node.attr("w:tooltip") {
            link.set_tooltip(tooltip);
        }
        Ok(())
    }

    fn read_drawing(&self, paragraph: &mut Paragraph, drawing: &XmlNode, rels: &RelMap) -> Result<()> {
        let (container, position) = if let Some(inline) = drawing.child("wp:inline") {
            (inline, ImagePosition::Inline)
        } else if let Some(anchor) = drawing.child("wp:anchor") {
            (anchor, ImagePosition::Floating(floating_position(anchor)))
        } else {
            warn!("skipping drawing without inline or anchor placement");
            return Ok(());
        };

        let Some(embed) = descendant(container, "a:blip").and_then(|blip| blip.attr("r:embed")) else {
            warn!("skipping drawing that is not an embedded picture");
            return Ok(());
        };
        let id = rels.get(embed).map_or(embed, String::as_str);
        if !paragraph.context().relationships().contains(id) {
            warn!("skipping image {embed}: relationship or media part missing");
            return Ok(());
        }

        let extent = container.child("wp:extent");
        let cx = extent.and_then(|e| e.attr_num::<i64>("cx")).unwrap_or(0);
        let cy = extent.and_then(|e| e.attr_num::<i64>("cy")).unwrap_or(0);
        let run = paragraph.link_existing_image(id, ImageSize::from_emu(cx, cy), position)?;

        let description = container
            .child("wp:docPr")
            .and_then(|pr| pr.attr("descr"))
            .filter(|d| !d.is_empty());
        if let (Some(description), Some(image)) = (description, run.image_mut()) {
            image.set_description(description);
        }
        Ok(())
    }

    fn read_table(&self, ctx: &DocumentContext, node: &XmlNode, rels: &RelMap) -> Result<Table> {
        let mut table = ctx.new_empty_table();

        if let Some(tbl_pr) = node.child("w:tblPr") {
            if let Some(style) = tbl_pr.val("w:tblStyle") {
                table.set_style(Some(style))?;
            }
            if let Some(width) = tbl_pr.child("w:tblW").and_then(table_width) {
                table.set_width(width)?;
            }
            if let Some(alignment) = tbl_pr.val("w:jc").and_then(Alignment::from_token) {
                table.set_alignment(alignment);
            }
            if let Some(container) = tbl_pr.child("w:tblBorders") {
                table.set_borders(borders(container))?;
            }
        }

        for tr in node.children_named("w:tr") {
            let row = table.append_empty_row()?;
            if let Some(tr_pr) = tr.child("w:trPr") {
                if let Some(height) = tr_pr.child("w:trHeight") {
                    let rule = match height.attr("w:hRule") {
                        Some("exact") => HeightRule::Exact,
                        _ => HeightRule::AtLeast,
                    };
                    row.set_height(height.attr_num("w:val").unwrap_or(0), rule)?;
                }
                row.set_header(tr_pr.flag("w:tblHeader"));
                row.set_cant_split(tr_pr.flag("w:cantSplit"));
            }

            for tc in tr.children_named("w:tc") {
                let cell = row.append_cell()?;
                if let Some(tc_pr) = tc.child("w:tcPr") {
                    let span = tc_pr
                        .child("w:gridSpan")
                        .and_then(|s| s.attr_num("w:val"))
                        .unwrap_or(1);
                    let merge = match tc_pr.child("w:vMerge") {
                        Some(v) if v.attr("w:val") == Some("restart") => VerticalMerge::Restart,
                        Some(_) => VerticalMerge::Continue,
                        None => VerticalMerge::None,
                    };
                    cell.set_merge_state(span, merge)?;
                    if let Some(width) = tc_pr.child("w:tcW").and_then(table_width) {
                        cell.set_width(width)?;
                    }
                    if let Some(container) = tc_pr.child("w:tcBorders") {
                        cell.set_borders(borders(container))?;
                    }
                    if let Some(shd) = tc_pr.child("w:shd").and_then(shading) {
                        cell.set_shading(shd);
                    }
                    if let Some(v) = tc_pr.val("w:vAlign").and_then(VerticalAlignment::from_token) {
                        cell.set_vertical_alignment(v);
                    }
                }

                cell.clear();
                for block in tc.elements() {
                    match block.name.as_str() {
                        "w:tcPr" => {}
                        "w:p" => self.fill_paragraph(cell.add_paragraph(), block, rels)?,
                        "w:tbl" => {
                            let nested = self.read_table(ctx, block, rels)?;
                            cell.attach_table(nested)?;
                        }
                        other => warn!("skipping cell element <{other}>"),
                    }
                }
            }
        }

        let grid: Vec<i32> = node
            .child("w:tblGrid")
            .map(|g| g.children_named("w:gridCol").filter_map(|c| c.attr_num("w:w")).collect())
            .unwrap_or_default();
        if !grid.is_empty() {
            table.set_column_widths(&grid)?;
        }
        Ok(table)
    }

    fn apply_section(&self, section: &mut Section, node: &XmlNode) -> Result<()> {
        if let Some(pg) = node.child("w:pgSz") {
            let current = section.page_size();
            let size = PageSize {
                width: pg.attr_num("w:w").unwrap_or(current.width),
                height: pg.attr_num("w:h").unwrap_or(current.height),
            };
            let orientation = pg
                .attr("w:orient")
                .and_then(Orientation::from_token)
                .unwrap_or(Orientation::Portrait);
            section.set_layout(size, orientation)?;
        }
        if let Some(mar) = node.child("w:pgMar") {
            let m = section.margins();
            section.set_margins(Margins {
                top: mar.attr_num("w:top").unwrap_or(m.top),
                right: mar.attr_num("w:right").unwrap_or(m.right),
                bottom: mar.attr_num("w:bottom").unwrap_or(m.bottom),
                left: mar.attr_num("w:left").unwrap_or(m.left),
                header: mar.attr_num("w:header").unwrap_or(m.header),
                footer: mar.attr_num("w:footer").unwrap_or(m.footer),
                gutter: mar.attr_num("w:gutter").unwrap_or(m.gutter),
            })?;
        }
        if let Some(cols) = node.child("w:cols") {
            section.set_columns(
                cols.attr_num("w:num").unwrap_or(1),
                cols.attr_num("w:space").unwrap_or(section.column_spacing()),
            )?;
        }

        for reference in node.elements() {
            let kind = match reference.name.as_str() {
                "w:headerReference" => PartKind::Header,
                "w:footerReference" => PartKind::Footer,
                _ => continue,
            };
            let Some(scope) = reference.attr("w:type").and_then(HeaderFooterType::from_token) else {
                warn!("skipping {} reference without a known type", kind.as_str());
                continue;
            };
            let Some(rel) = reference.attr("r:id").and_then(|id| self.parts.get(id)) else {
                warn!("skipping {} reference without a relationship", kind.as_str());
                continue;
            };
            let path = resolve_target(&self.base_dir, &rel.target);
            let xml = self.archive.require(&path)?;
            let part = match kind {
                PartKind::Header => section.header(scope)?,
                PartKind::Footer => section.footer(scope)?,
            };
            self.fill_part(part, &path, xml)?;
        }
        section.set_title_page(node.flag("w:titlePg"));
        Ok(())
    }

    fn fill_part(&self, part: &mut HeaderFooter, path: &str, xml: &[u8]) -> Result<()> {
        let dir = path.rsplit_once('/').map_or("", |(dir, _)| dir);
        let rels = match self.archive.get(&rels_path_for(path)) {
            Some(rels_xml) => {
                let ctx = part.context().clone();
                self.register_rels(&ctx, dir, &relationships::parse(rels_xml)?)?
            }
            None => RelMap::new(),
        };
        let root = XmlNode::parse(xml)?;
        for node in root.elements() {
            match node.name.as_str() {
                "w:p" => self.fill_paragraph(part.add_paragraph(), node, &rels)?,
                "w:tbl" => warn!("skipping table in {path}: header and footer tables are not supported"),
                other => warn!("skipping <{other}> in {path}"),
            }
        }
        Ok(())
    }
}

/// Complex field being collected across runs
#[derive(Debug, Default)]
struct OpenField {
    code: String,
    result: String,
    dirty: bool,
    separated: bool,
    properties: RunProperties,
}

/// `begin` / `instrText` / `separate` / result / `end` tracking
///
/// Nested fields are folded into the outer one: their code is dropped and
/// their displayed text becomes part of the outer result.
#[derive(Debug, Default)]
struct FieldState {
    open: Option<OpenField>,
    depth: u32,
}

impl FieldState {
    fn begin(&mut self, dirty: bool, properties: RunProperties) {
        if self.open.is_some() {
            self.depth += 1;
        } else {
            self.open = Some(OpenField {
                dirty,
                properties,
                ..OpenField::default()
            });
        }
    }

    fn instruction(&mut self, text: &str) {
        if let Some(open) = &mut self.open {
            if self.depth == 0 && !open.separated {
                open.code.push_str(text);
            }
        }
    }

    fn separate(&mut self) {
        if let Some(open) = &mut self.open {
            if self.depth == 0 {
                open.separated = true;
            }
        }
    }

    /// Take displayed text while a field is open
    fn capture(&mut self, text: &str) -> bool {
        match &mut self.open {
            Some(open) => {
                if open.separated {
                    open.result.push_str(text);
                }
                true
            }
            None => false,
        }
    }

    fn end(&mut self) -> Option<OpenField> {
        if self.depth > 0 {
            self.depth -= 1;
            return None;
        }
        self.open.take()
    }
}

fn push_field(paragraph: &mut Paragraph, open: OpenField) -> Result<()> {
    let code = open.code.trim();
    if code.is_empty() {
        warn!("field without instruction; keeping its result as text");
        if !open.result.is_empty() {
            paragraph.add_run(open.result).set_properties(open.properties)?;
        }
        return Ok(());
    }
    let mut field = Field::new(code)?;
    field.set_result(open.result);
    field.set_dirty(open.dirty);
    if open.properties.is_empty() {
        paragraph.add_field(field);
    } else {
        let run = paragraph.add_run("");
        run.set_properties(open.properties)?;
        run.add_field(field);
    }
    Ok(())
}

/// Text of a run with tabs and breaks flattened
fn run_text(run: &XmlNode) -> String {
    run.elements()
        .filter_map(|item| match item.name.as_str() {
            "w:t" => Some(item.text()),
            "w:tab" => Some("\t".to_string()),
            "w:br" | "w:cr" => Some("\n".to_string()),
            _ => None,
        })
        .collect()
}

fn descendant<'a>(node: &'a XmlNode, name: &str) -> Option<&'a XmlNode> {
    node.elements()
        .find_map(|child| if child.is(name) { Some(child) } else { descendant(child, name) })
}

/// Part name of `target` relative to the folder `dir`
fn resolve_target(dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn color(value: Option<&str>) -> Option<Color> {
    value
        .filter(|v| !v.eq_ignore_ascii_case("auto"))
        .and_then(|v| Color::from_hex(v).ok())
}

fn border(node: &XmlNode) -> Option<Border> {
    Some(Border {
        style: node.attr("w:val").and_then(BorderStyle::from_token)?,
        size: node.attr_num("w:sz").unwrap_or(4),
        space: node.attr_num("w:space").unwrap_or(0),
        color: color(node.attr("w:color")).unwrap_or(Color::BLACK),
    })
}

fn borders(container: &XmlNode) -> Borders {
    let mut borders = Borders::default();
    for edge in container.elements() {
        let Some(b) = border(edge) else { continue };
        match edge.local_name() {
            "top" => borders.top = Some(b),
            "left" | "start" => borders.left = Some(b),
            "bottom" => borders.bottom = Some(b),
            "right" | "end" => borders.right = Some(b),
            "between" => borders.between = Some(b),
            "insideH" => borders.inside_h = Some(b),
            "insideV" => borders.inside_v = Some(b),
            _ => {}
        }
    }
    borders
}

fn shading(node: &XmlNode) -> Option<Shading> {
    Some(Shading {
        fill: color(node.attr("w:fill"))?,
        pattern: node
            .attr("w:val")
            .and_then(ShadingPattern::from_token)
            .unwrap_or(ShadingPattern::Clear),
        color: color(node.attr("w:color")),
    })
}

fn table_width(node: &XmlNode) -> Option<TableWidth> {
    let kind = node.attr("w:type").unwrap_or("auto");
    Some(TableWidth::from_attrs(node.attr_num("w:w").unwrap_or(0), kind))
}

/// `w:pPr`; list references are translated through `numbering`
fn paragraph_properties(ppr: &XmlNode, numbering: &HashMap<u32, u32>) -> ParagraphProperties {
    let mut props = ParagraphProperties {
        style: ppr.val("w:pStyle").map(str::to_string),
        alignment: ppr.val("w:jc").and_then(Alignment::from_token),
        keep_next: ppr.flag("w:keepNext"),
        keep_lines: ppr.flag("w:keepLines"),
        page_break_before: ppr.flag("w:pageBreakBefore"),
        outline_level: ppr.child("w:outlineLvl").and_then(|n| n.attr_num("w:val")),
        shading: ppr.child("w:shd").and_then(shading),
        borders: ppr.child("w:pBdr").map(borders).unwrap_or_default(),
        ..ParagraphProperties::default()
    };

    if let Some(num_pr) = ppr.child("w:numPr") {
        let level = num_pr.child("w:ilvl").and_then(|n| n.attr_num("w:val")).unwrap_or(0);
        let num_id: u32 = num_pr.child("w:numId").and_then(|n| n.attr_num("w:val")).unwrap_or(0);
        match numbering.get(&num_id) {
            Some(&num_id) => props.numbering = Some(NumberingRef { num_id, level }),
            None if num_id == 0 => {}
            None => warn!("dropping reference to unknown list {num_id}"),
        }
    }

    if let Some(spacing) = ppr.child("w:spacing") {
        props.spacing_before = spacing.attr_num("w:before");
        props.spacing_after = spacing.attr_num("w:after");
        props.line_spacing = spacing.attr_num("w:line").map(|value| LineSpacing {
            rule: spacing
                .attr("w:lineRule")
                .and_then(LineSpacingRule::from_token)
                .unwrap_or(LineSpacingRule::Auto),
            value,
        });
    }

    if let Some(ind) = ppr.child("w:ind") {
        let value = |names: &[&str]| names.iter().find_map(|n| ind.attr_num(n)).unwrap_or(0);
        props.indentation.left = value(&["w:left", "w:start"]);
        props.indentation.right = value(&["w:right", "w:end"]);
        props.indentation.first_line = value(&["w:firstLine"]);
        props.indentation.hanging = value(&["w:hanging"]);
    }
    props
}

fn run_properties(rpr: &XmlNode) -> RunProperties {
    let font = rpr.child("w:rFonts").and_then(|fonts| {
        let name = fonts.attr("w:ascii").or_else(|| fonts.attr("w:hAnsi"))?;
        let mut font = Font::new(name);
        font.east_asia = fonts.attr("w:eastAsia").map(str::to_string);
        font.complex_script = fonts.attr("w:cs").map(str::to_string);
        Some(font)
    });
    let underline = match rpr.child("w:u") {
        Some(u) => match u.attr("w:val") {
            Some(token) => UnderlineStyle::from_token(token).unwrap_or(UnderlineStyle::None),
            None => UnderlineStyle::Single,
        },
        None => UnderlineStyle::None,
    };
    RunProperties {
        style: rpr.val("w:rStyle").map(str::to_string),
        font,
        color: color(rpr.val("w:color")),
        size: rpr.child("w:sz").and_then(|n| n.attr_num("w:val")),
        bold: rpr.flag("w:b"),
        italic: rpr.flag("w:i"),
        strike: rpr.flag("w:strike"),
        underline,
        highlight: rpr
            .val("w:highlight")
            .and_then(HighlightColor::from_token)
            .unwrap_or(HighlightColor::None),
        vertical_position: rpr.val("w:vertAlign").and_then(VerticalPosition::from_token),
    }
}

fn axis_position(node: &XmlNode) -> Option<AxisPosition> {
    if let Some(align) = node.child("wp:align") {
        return PositionAlign::from_token(align.text().trim()).map(AxisPosition::Align);
    }
    node.child("wp:posOffset")
        .and_then(|offset| offset.text().trim().parse().ok())
        .map(AxisPosition::Offset)
}

fn floating_position(anchor: &XmlNode) -> FloatingPosition {
    let mut position = FloatingPosition {
        behind_text: matches!(anchor.attr("behindDoc"), Some("1" | "true")),
        z_order: anchor.attr_num("relativeHeight").unwrap_or(0),
        wrap: anchor
            .elements()
            .find_map(|child| {
                child
                    .name
                    .strip_prefix("wp:")
                    .and_then(WrapType::from_element_name)
            })
            .unwrap_or(WrapType::None),
        ..FloatingPosition::default()
    };
    if let Some(h) = anchor.child("wp:positionH") {
        if let Some(from) = h.attr("relativeFrom").and_then(RelativeFrom::from_token) {
            position.horizontal_from = from;
        }
        if let Some(axis) = axis_position(h) {
            position.horizontal = axis;
        }
    }
    if let Some(v) = anchor.child("wp:positionV") {
        if let Some(from) = v.attr("relativeFrom").and_then(RelativeFrom::from_token) {
            position.vertical_from = from;
        }
        if let Some(axis) = axis_position(v) {
            position.vertical = axis;
        }
    }
    position
}

/// Custom styles from `word/styles.xml`; built-in IDs are left untouched
fn read_styles(registry: &StyleRegistry, xml: &[u8]) -> Result<usize> {
    let root = XmlNode::parse(xml)?;
    let no_lists = HashMap::new();
    let mut added = 0;
    for node in root.children_named("w:style") {
        let Some(id) = node.attr("w:styleId") else {
            continue;
        };
        if registry.has_style(id) {
            continue;
        }
        let style_type = node
            .attr("w:type")
            .and_then(StyleType::from_token)
            .unwrap_or(StyleType::Paragraph);
        let mut style = Style::new(id, node.val("w:name").unwrap_or(id), style_type);
        style.based_on = node.val("w:basedOn").map(str::to_string);
        style.next = node.val("w:next").map(str::to_string);
        style.ui_priority = node.child("w:uiPriority").and_then(|n| n.attr_num("w:val"));
        style.quick_format = node.flag("w:qFormat");
        if let Some(ppr) = node.child("w:pPr") {
            style.paragraph = paragraph_properties(ppr, &no_lists);
        }
        if let Some(rpr) = node.child("w:rPr") {
            style.run = run_properties(rpr);
        }
        style.table_borders = node
            .child("w:tblPr")
            .and_then(|t| t.child("w:tblBorders"))
            .map(borders);
        registry.add_style(style)?;
        if matches!(node.attr("w:default"), Some("1" | "true")) {
            registry.set_default_style(style_type, id)?;
        }
        added += 1;
    }
    Ok(added)
}

/// Rebuild lists; returns package `w:numId` -> rebuilt num id
fn read_numbering(doc: &mut Document, xml: &[u8]) -> Result<HashMap<u32, u32>> {
    let root = XmlNode::parse(xml)?;
    let mut abstracts: HashMap<u32, Vec<ListLevel>> = HashMap::new();
    for node in root.children_named("w:abstractNum") {
        let Some(abstract_id) = node.attr_num("w:abstractNumId") else {
            continue;
        };
        let levels = node
            .children_named("w:lvl")
            .filter_map(|lvl| {
                let ind = lvl.child("w:pPr").and_then(|p| p.child("w:ind"));
                Some(ListLevel {
                    level: lvl.attr_num("w:ilvl")?,
                    format: lvl
                        .val("w:numFmt")
                        .and_then(NumberFormat::from_token)
                        .unwrap_or(NumberFormat::Decimal),
                    text: lvl.val("w:lvlText").unwrap_or_default().to_string(),
                    start: lvl.child("w:start").and_then(|s| s.attr_num("w:val")).unwrap_or(1),
                    indent: ind.and_then(|i| i.attr_num("w:left")).unwrap_or(0),
                    hanging: ind.and_then(|i| i.attr_num("w:hanging")).unwrap_or(0),
                })
            })
            .collect();
        abstracts.insert(abstract_id, levels);
    }

    let mut map = HashMap::new();
    for num in root.children_named("w:num") {
        let Some(num_id) = num.attr_num::<u32>("w:numId") else {
            continue;
        };
        let levels = num
            .child("w:abstractNumId")
            .and_then(|a| a.attr_num::<u32>("w:val"))
            .and_then(|id| abstracts.get(&id))
            .filter(|levels| !levels.is_empty());
        match levels {
            Some(levels) => {
                let rebuilt = doc.add_custom_list(levels.clone())?;
                map.insert(num_id, rebuilt);
            }
            None => warn!("skipping list {num_id} without levels"),
        }
    }
    debug!("re-created {} lists", map.len());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::Packager;
    use docxkit_model::{ErrorKind, TargetMode};

    fn package(doc: &Document) -> PackageArchive {
        Packager::default().package(doc).unwrap()
    }

    fn with_body(mut archive: PackageArchive, body: &str) -> PackageArchive {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
        );
        archive.set(DOCUMENT_PART, xml.into_bytes());
        archive
    }

    fn simple_doc() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph().add_run("x");
        doc
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word", "/word/styles.xml"), "word/styles.xml");
        assert_eq!(resolve_target("word", "../docProps/app.xml"), "docProps/app.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_field_sequence_is_rebuilt() {
        let archive = with_body(
            package(&simple_doc()),
            r#"<w:p><w:r><w:t xml:space="preserve">Page </w:t></w:r>
<w:r><w:rPr><w:b/></w:rPr><w:fldChar w:fldCharType="begin" w:dirty="true"/></w:r>
<w:r><w:rPr><w:b/></w:rPr><w:instrText xml:space="preserve"> PAGE </w:instrText></w:r>
<w:r><w:rPr><w:b/></w:rPr><w:fldChar w:fldCharType="separate"/></w:r>
<w:r><w:rPr><w:b/></w:rPr><w:t>7</w:t></w:r>
<w:r><w:rPr><w:b/></w:rPr><w:fldChar w:fldCharType="end"/></w:r></w:p>"#,
        );
        let doc = DocxReader::from_archive(archive).read().unwrap();
        let paragraph = doc.paragraphs().next().unwrap();
        let runs: Vec<_> = paragraph.runs().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text(), "Page ");
        assert!(runs[1].properties().bold);
        let field = &runs[1].fields()[0];
        assert_eq!(field.code(), "PAGE");
        assert_eq!(field.result(), "7");
        assert!(field.is_dirty());
    }

    #[test]
    fn test_conflicting_relationship_is_rekeyed() {
        let mut doc = Document::new();
        doc.add_paragraph()
            .add_hyperlink("https://example.com", "site")
            .unwrap();
        let mut archive = package(&doc);

        // claim rId1, which a fresh document gives to styles.xml
        let rels = vec![Relationship {
            id: "rId1".into(),
            rel_type: RelationshipTable::TYPE_HYPERLINK.into(),
            target: "https://example.com".into(),
            mode: TargetMode::External,
        }];
        archive.set(
            rels_path_for(DOCUMENT_PART),
            relationships::to_xml(&rels).unwrap(),
        );
        let archive = with_body(
            archive,
            r#"<w:p><w:hyperlink r:id="rId1" w:tooltip="go"><w:r><w:t>site</w:t></w:r></w:hyperlink></w:p>"#,
        );

        let doc = DocxReader::from_archive(archive).read().unwrap();
        let link = doc.paragraphs().next().unwrap().hyperlinks().next().unwrap();
        let docxkit_model::HyperlinkTarget::External { relationship_id, url } = link.target() else {
            panic!("expected an external link");
        };
        assert_ne!(relationship_id, "rId1");
        assert_eq!(url, "https://example.com");
        assert_eq!(link.tooltip(), Some("go"));
        assert_eq!(doc.relationships().get("rId1").unwrap().target, "styles.xml");
        doc.validate().unwrap();
    }

    #[test]
    fn test_alt_chunk_is_unsupported() {
        let archive = with_body(package(&simple_doc()), r#"<w:altChunk r:id="rId9"/>"#);
        let err = DocxReader::from_archive(archive).read().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let archive = with_body(
            package(&simple_doc()),
            r#"<w:customXml/><w:p><w:ins><w:r><w:t>gone</w:t></w:r></w:ins><w:r><w:t>kept</w:t></w:r></w:p>"#,
        );
        let doc = DocxReader::from_archive(archive).read().unwrap();
        assert_eq!(doc.text().trim(), "kept");
    }

    #[test]
    fn test_missing_document_part() {
        let mut archive = PackageArchive::new();
        archive.set("docProps/core.xml", b"<cp:coreProperties/>".to_vec());
        let err = DocxReader::from_archive(archive).read().unwrap_err();
        assert!(matches!(err, OoxmlError::MissingFile(_)));
    }
}
