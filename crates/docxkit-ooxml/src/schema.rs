//! Intermediate XML structures for WordprocessingML parts
//!
//! One structure per element family. They hold already-resolved OOXML tokens
//! and know how to write themselves; building them from the entity graph is
//! the serializer's job.

use crate::error::Result;
use crate::xml::{XmlWriter, NS_R, NS_W};

/// Something that writes itself as XML
pub trait WriteXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()>;
}

/// Serialize a part root with the XML declaration
pub fn part_bytes<T: WriteXml>(part: &T) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new();
    w.declaration()?;
    part.write_xml(&mut w)?;
    Ok(w.into_bytes())
}

fn on_off(w: &mut XmlWriter, name: &str, value: bool) -> Result<()> {
    if value {
        w.empty(name, &[])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared property elements
// ---------------------------------------------------------------------------

/// `w:top`, `w:left`, ... inside a borders container
#[derive(Debug, Clone, PartialEq)]
pub struct BorderXml {
    pub edge: &'static str,
    pub style: &'static str,
    pub size: u32,
    pub space: u32,
    pub color: String,
}

fn write_borders(w: &mut XmlWriter, container: &str, borders: &[BorderXml]) -> Result<()> {
    if borders.is_empty() {
        return Ok(());
    }
    w.start(container, &[])?;
    for border in borders {
        w.empty(
            &format!("w:{}", border.edge),
            &[
                ("w:val", border.style),
                ("w:sz", &border.size.to_string()),
                ("w:space", &border.space.to_string()),
                ("w:color", &border.color),
            ],
        )?;
    }
    w.end(container)
}

/// `w:shd`
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingXml {
    pub pattern: &'static str,
    pub color: String,
    pub fill: String,
}

impl WriteXml for ShadingXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.empty(
            "w:shd",
            &[
                ("w:val", self.pattern),
                ("w:color", &self.color),
                ("w:fill", &self.fill),
            ],
        )
    }
}

/// `w:spacing`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpacingXml {
    pub before: Option<i32>,
    pub after: Option<i32>,
    /// Line value and `w:lineRule`
    pub line: Option<(i32, &'static str)>,
}

impl WriteXml for SpacingXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let before = self.before.map(|v| v.to_string());
        let after = self.after.map(|v| v.to_string());
        let line = self.line.map(|(v, _)| v.to_string());
        let mut attrs = Vec::new();
        if let Some(before) = &before {
            attrs.push(("w:before", before.as_str()));
        }
        if let Some(after) = &after {
            attrs.push(("w:after", after.as_str()));
        }
        if let (Some(line), Some((_, rule))) = (&line, self.line) {
            attrs.push(("w:line", line.as_str()));
            attrs.push(("w:lineRule", rule));
        }
        w.empty("w:spacing", &attrs)
    }
}

/// `w:ind`; zero values are omitted
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndentXml {
    pub left: i32,
    pub right: i32,
    pub first_line: i32,
    pub hanging: i32,
}

impl WriteXml for IndentXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let values = [
            ("w:left", self.left),
            ("w:right", self.right),
            ("w:firstLine", self.first_line),
            ("w:hanging", self.hanging),
        ];
        let rendered: Vec<(&str, String)> = values
            .iter()
            .filter(|(_, v)| *v != 0)
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        let attrs: Vec<(&str, &str)> = rendered.iter().map(|(k, v)| (*k, v.as_str())).collect();
        w.empty("w:ind", &attrs)
    }
}

// ---------------------------------------------------------------------------
// Paragraphs
// ---------------------------------------------------------------------------

/// `w:pPr`, children in schema order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PPrXml {
    pub style: Option<String>,
    pub keep_next: bool,
    pub keep_lines: bool,
    pub page_break_before: bool,
    /// `(w:numId, w:ilvl)`
    pub numbering: Option<(u32, u8)>,
    pub borders: Vec<BorderXml>,
    pub shading: Option<ShadingXml>,
    pub spacing: Option<SpacingXml>,
    pub indent: Option<IndentXml>,
    pub justification: Option<&'static str>,
    pub outline_level: Option<u8>,
    pub section: Option<Box<SectPrXml>>,
}

impl PPrXml {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl WriteXml for PPrXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        w.start("w:pPr", &[])?;
        if let Some(style) = &self.style {
            w.val("w:pStyle", style)?;
        }
        on_off(w, "w:keepNext", self.keep_next)?;
        on_off(w, "w:keepLines", self.keep_lines)?;
        on_off(w, "w:pageBreakBefore", self.page_break_before)?;
        if let Some((num_id, level)) = self.numbering {
            w.start("w:numPr", &[])?;
            w.val("w:ilvl", &level.to_string())?;
            w.val("w:numId", &num_id.to_string())?;
            w.end("w:numPr")?;
        }
        write_borders(w, "w:pBdr", &self.borders)?;
        if let Some(shading) = &self.shading {
            shading.write_xml(w)?;
        }
        if let Some(spacing) = &self.spacing {
            spacing.write_xml(w)?;
        }
        if let Some(indent) = &self.indent {
            indent.write_xml(w)?;
        }
        if let Some(jc) = self.justification {
            w.val("w:jc", jc)?;
        }
        if let Some(level) = self.outline_level {
            w.val("w:outlineLvl", &level.to_string())?;
        }
        if let Some(section) = &self.section {
            section.write_xml(w)?;
        }
        w.end("w:pPr")
    }
}

/// `w:p`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphXml {
    pub properties: PPrXml,
    pub content: Vec<InlineXml>,
}

impl WriteXml for ParagraphXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:p", &[])?;
        self.properties.write_xml(w)?;
        for item in &self.content {
            item.write_xml(w)?;
        }
        w.end("w:p")
    }
}

/// Paragraph-level inline content
#[derive(Debug, Clone, PartialEq)]
pub enum InlineXml {
    Run(RunXml),
    Hyperlink(HyperlinkXml),
    BookmarkStart { id: u64, name: String },
    BookmarkEnd { id: u64 },
}

impl WriteXml for InlineXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        match self {
            Self::Run(run) => run.write_xml(w),
            Self::Hyperlink(link) => link.write_xml(w),
            Self::BookmarkStart { id, name } => {
                w.empty("w:bookmarkStart", &[("w:id", &id.to_string()), ("w:name", name)])
            }
            Self::BookmarkEnd { id } => w.empty("w:bookmarkEnd", &[("w:id", &id.to_string())]),
        }
    }
}

/// `w:hyperlink`, external through `r:id` or internal through `w:anchor`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HyperlinkXml {
    pub relationship_id: Option<String>,
    pub anchor: Option<String>,
    pub tooltip: Option<String>,
    pub runs: Vec<RunXml>,
}

impl WriteXml for HyperlinkXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let mut attrs = Vec::new();
        if let Some(id) = &self.relationship_id {
            attrs.push(("r:id", id.as_str()));
        }
        if let Some(anchor) = &self.anchor {
            attrs.push(("w:anchor", anchor.as_str()));
        }
        if let Some(tooltip) = &self.tooltip {
            attrs.push(("w:tooltip", tooltip.as_str()));
        }
        attrs.push(("w:history", "1"));
        w.start("w:hyperlink", &attrs)?;
        for run in &self.runs {
            run.write_xml(w)?;
        }
        w.end("w:hyperlink")
    }
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// `w:rFonts`
#[derive(Debug, Clone, PartialEq)]
pub struct FontsXml {
    pub ascii: String,
    pub east_asia: Option<String>,
    pub complex_script: Option<String>,
}

/// `w:rPr`, children in schema order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RPrXml {
    pub style: Option<String>,
    pub fonts: Option<FontsXml>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub color: Option<String>,
    /// Half-points, written to `w:sz` and `w:szCs`
    pub size: Option<u16>,
    pub highlight: Option<&'static str>,
    pub underline: Option<&'static str>,
    pub vertical_align: Option<&'static str>,
}

impl RPrXml {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl WriteXml for RPrXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        w.start("w:rPr", &[])?;
        if let Some(style) = &self.style {
            w.val("w:rStyle", style)?;
        }
        if let Some(fonts) = &self.fonts {
            let mut attrs = vec![("w:ascii", fonts.ascii.as_str()), ("w:hAnsi", fonts.ascii.as_str())];
            if let Some(east_asia) = &fonts.east_asia {
                attrs.push(("w:eastAsia", east_asia.as_str()));
            }
            if let Some(cs) = &fonts.complex_script {
                attrs.push(("w:cs", cs.as_str()));
            }
            w.empty("w:rFonts", &attrs)?;
        }
        on_off(w, "w:b", self.bold)?;
        on_off(w, "w:i", self.italic)?;
        on_off(w, "w:strike", self.strike)?;
        if let Some(color) = &self.color {
            w.val("w:color", color)?;
        }
        if let Some(size) = self.size {
            let size = size.to_string();
            w.val("w:sz", &size)?;
            w.val("w:szCs", &size)?;
        }
        if let Some(highlight) = self.highlight {
            w.val("w:highlight", highlight)?;
        }
        if let Some(underline) = self.underline {
            w.val("w:u", underline)?;
        }
        if let Some(position) = self.vertical_align {
            w.val("w:vertAlign", position)?;
        }
        w.end("w:rPr")
    }
}

/// Run content items
#[derive(Debug, Clone, PartialEq)]
pub enum RunItemXml {
    Text(String),
    Tab,
    /// `w:br` with its optional `w:type`
    Break(Option<&'static str>),
    FldChar { kind: &'static str, dirty: bool },
    InstrText(String),
    Drawing(DrawingXml),
}

impl WriteXml for RunItemXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        match self {
            Self::Text(text) => w.text_element("w:t", &preserve_attr(text), text),
            Self::Tab => w.empty("w:tab", &[]),
            Self::Break(None) => w.empty("w:br", &[]),
            Self::Break(Some(kind)) => w.empty("w:br", &[("w:type", kind)]),
            Self::FldChar { kind, dirty } => {
                let mut attrs = vec![("w:fldCharType", *kind)];
                if *dirty {
                    attrs.push(("w:dirty", "true"));
                }
                w.empty("w:fldChar", &attrs)
            }
            Self::InstrText(code) => {
                w.text_element("w:instrText", &[("xml:space", "preserve")], code)
            }
            Self::Drawing(drawing) => drawing.write_xml(w),
        }
    }
}

fn preserve_attr(text: &str) -> Vec<(&'static str, &'static str)> {
    let edge_space = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
    if edge_space {
        vec![("xml:space", "preserve")]
    } else {
        Vec::new()
    }
}

/// `w:r`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunXml {
    pub properties: RPrXml,
    pub items: Vec<RunItemXml>,
}

impl WriteXml for RunXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:r", &[])?;
        self.properties.write_xml(w)?;
        for item in &self.items {
            item.write_xml(w)?;
        }
        w.end("w:r")
    }
}

// ---------------------------------------------------------------------------
// Drawings
// ---------------------------------------------------------------------------

/// One axis of a floating image position
#[derive(Debug, Clone, PartialEq)]
pub enum AxisXml {
    Align(&'static str),
    Offset(i64),
}

/// `wp:anchor` placement attributes
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorXml {
    pub behind_text: bool,
    pub relative_height: u32,
    pub horizontal_from: &'static str,
    pub horizontal: AxisXml,
    pub vertical_from: &'static str,
    pub vertical: AxisXml,
    /// Wrap element name (`wrapSquare`)
    pub wrap: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementXml {
    Inline,
    Anchor(AnchorXml),
}

/// `w:drawing` holding one picture
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingXml {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub relationship_id: String,
    pub cx: i64,
    pub cy: i64,
    pub placement: PlacementXml,
}

const DIST_ZERO: [(&str, &str); 4] = [
    ("distT", "0"),
    ("distB", "0"),
    ("distL", "0"),
    ("distR", "0"),
];

impl WriteXml for DrawingXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let cx = self.cx.to_string();
        let cy = self.cy.to_string();
        w.start("w:drawing", &[])?;
        let root = match &self.placement {
            PlacementXml::Inline => {
                w.start("wp:inline", &DIST_ZERO)?;
                w.empty("wp:extent", &[("cx", &cx), ("cy", &cy)])?;
                "wp:inline"
            }
            PlacementXml::Anchor(anchor) => {
                write_anchor_open(w, anchor, &cx, &cy)?;
                "wp:anchor"
            }
        };
        w.empty(
            "wp:docPr",
            &[
                ("id", &self.id.to_string()),
                ("name", &self.name),
                ("descr", &self.description),
            ],
        )?;
        w.start("wp:cNvGraphicFramePr", &[])?;
        w.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")])?;
        w.end("wp:cNvGraphicFramePr")?;

        w.start("a:graphic", &[])?;
        w.start(
            "a:graphicData",
            &[("uri", "http://schemas.openxmlformats.org/drawingml/2006/picture")],
        )?;
        w.start("pic:pic", &[])?;
        w.start("pic:nvPicPr", &[])?;
        w.empty("pic:cNvPr", &[("id", "0"), ("name", &self.name)])?;
        w.empty("pic:cNvPicPr", &[])?;
        w.end("pic:nvPicPr")?;
        w.start("pic:blipFill", &[])?;
        w.empty("a:blip", &[("r:embed", &self.relationship_id)])?;
        w.start("a:stretch", &[])?;
        w.empty("a:fillRect", &[])?;
        w.end("a:stretch")?;
        w.end("pic:blipFill")?;
        w.start("pic:spPr", &[])?;
        w.start("a:xfrm", &[])?;
        w.empty("a:off", &[("x", "0"), ("y", "0")])?;
        w.empty("a:ext", &[("cx", &cx), ("cy", &cy)])?;
        w.end("a:xfrm")?;
        w.start("a:prstGeom", &[("prst", "rect")])?;
        w.empty("a:avLst", &[])?;
        w.end("a:prstGeom")?;
        w.end("pic:spPr")?;
        w.end("pic:pic")?;
        w.end("a:graphicData")?;
        w.end("a:graphic")?;

        w.end(root)?;
        w.end("w:drawing")
    }
}

fn write_anchor_open(w: &mut XmlWriter, anchor: &AnchorXml, cx: &str, cy: &str) -> Result<()> {
    let height = anchor.relative_height.to_string();
    let mut attrs = DIST_ZERO.to_vec();
    attrs.extend([
        ("simplePos", "0"),
        ("relativeHeight", height.as_str()),
        ("behindDoc", if anchor.behind_text { "1" } else { "0" }),
        ("locked", "0"),
        ("layoutInCell", "1"),
        ("allowOverlap", "1"),
    ]);
    w.start("wp:anchor", &attrs)?;
    w.empty("wp:simplePos", &[("x", "0"), ("y", "0")])?;
    write_axis(w, "wp:positionH", anchor.horizontal_from, &anchor.horizontal)?;
    write_axis(w, "wp:positionV", anchor.vertical_from, &anchor.vertical)?;
    w.empty("wp:extent", &[("cx", cx), ("cy", cy)])?;
    w.empty("wp:effectExtent", &[("l", "0"), ("t", "0"), ("r", "0"), ("b", "0")])?;

    let wrap = format!("wp:{}", anchor.wrap);
    match anchor.wrap {
        "wrapNone" | "wrapTopAndBottom" => w.empty(&wrap, &[])?,
        "wrapSquare" => w.empty(&wrap, &[("wrapText", "bothSides")])?,
        _ => {
            // tight and through wrapping need an outline; use the image bounds
            w.start(&wrap, &[("wrapText", "bothSides")])?;
            w.start("wp:wrapPolygon", &[("edited", "0")])?;
            w.empty("wp:start", &[("x", "0"), ("y", "0")])?;
            for (x, y) in [("0", "21600"), ("21600", "21600"), ("21600", "0"), ("0", "0")] {
                w.empty("wp:lineTo", &[("x", x), ("y", y)])?;
            }
            w.end("wp:wrapPolygon")?;
            w.end(&wrap)?;
        }
    }
    Ok(())
}

fn write_axis(w: &mut XmlWriter, name: &str, from: &str, axis: &AxisXml) -> Result<()> {
    w.start(name, &[("relativeFrom", from)])?;
    match axis {
        AxisXml::Align(align) => w.text_element("wp:align", &[], align)?,
        AxisXml::Offset(offset) => w.text_element("wp:posOffset", &[], &offset.to_string())?,
    }
    w.end(name)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Block-level content: body, cells
#[derive(Debug, Clone, PartialEq)]
pub enum BlockXml {
    Paragraph(ParagraphXml),
    Table(TableXml),
}

impl WriteXml for BlockXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        match self {
            Self::Paragraph(p) => p.write_xml(w),
            Self::Table(t) => t.write_xml(w),
        }
    }
}

/// `w:tbl`
#[derive(Debug, Clone, PartialEq)]
pub struct TableXml {
    pub style: Option<String>,
    /// `(w:w, w:type)`
    pub width: (i64, &'static str),
    pub justification: Option<&'static str>,
    pub borders: Vec<BorderXml>,
    /// `w:gridCol` widths in twips
    pub grid: Vec<i32>,
    pub rows: Vec<RowXml>,
}

impl WriteXml for TableXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:tbl", &[])?;
        w.start("w:tblPr", &[])?;
        if let Some(style) = &self.style {
            w.val("w:tblStyle", style)?;
        }
        w.empty(
            "w:tblW",
            &[("w:w", &self.width.0.to_string()), ("w:type", self.width.1)],
        )?;
        if let Some(jc) = self.justification {
            w.val("w:jc", jc)?;
        }
        write_borders(w, "w:tblBorders", &self.borders)?;
        w.empty("w:tblLook", &[("w:val", "04A0")])?;
        w.end("w:tblPr")?;

        w.start("w:tblGrid", &[])?;
        for width in &self.grid {
            w.empty("w:gridCol", &[("w:w", &width.to_string())])?;
        }
        w.end("w:tblGrid")?;

        for row in &self.rows {
            row.write_xml(w)?;
        }
        w.end("w:tbl")
    }
}

/// `w:tr`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowXml {
    /// `(w:val, w:hRule)`
    pub height: Option<(i32, &'static str)>,
    pub header: bool,
    pub cant_split: bool,
    pub cells: Vec<CellXml>,
}

impl WriteXml for RowXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:tr", &[])?;
        if self.height.is_some() || self.header || self.cant_split {
            w.start("w:trPr", &[])?;
            on_off(w, "w:cantSplit", self.cant_split)?;
            if let Some((height, rule)) = self.height {
                w.empty(
                    "w:trHeight",
                    &[("w:val", &height.to_string()), ("w:hRule", rule)],
                )?;
            }
            on_off(w, "w:tblHeader", self.header)?;
            w.end("w:trPr")?;
        }
        for cell in &self.cells {
            cell.write_xml(w)?;
        }
        w.end("w:tr")
    }
}

/// `w:tc`
#[derive(Debug, Clone, PartialEq)]
pub struct CellXml {
    pub width: Option<(i64, &'static str)>,
    pub grid_span: u32,
    /// `restart`, or `None` inside for a continuation
    pub vertical_merge: Option<Option<&'static str>>,
    pub borders: Vec<BorderXml>,
    pub shading: Option<ShadingXml>,
    pub vertical_alignment: Option<&'static str>,
    /// Never empty and always ends with a paragraph
    pub content: Vec<BlockXml>,
}

impl WriteXml for CellXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:tc", &[])?;
        w.start("w:tcPr", &[])?;
        if let Some((value, kind)) = self.width {
            w.empty("w:tcW", &[("w:w", &value.to_string()), ("w:type", kind)])?;
        }
        if self.grid_span > 1 {
            w.val("w:gridSpan", &self.grid_span.to_string())?;
        }
        match self.vertical_merge {
            Some(Some(val)) => w.val("w:vMerge", val)?,
            Some(None) => w.empty("w:vMerge", &[])?,
            None => {}
        }
        write_borders(w, "w:tcBorders", &self.borders)?;
        if let Some(shading) = &self.shading {
            shading.write_xml(w)?;
        }
        if let Some(v_align) = self.vertical_alignment {
            w.val("w:vAlign", v_align)?;
        }
        w.end("w:tcPr")?;
        for block in &self.content {
            block.write_xml(w)?;
        }
        w.end("w:tc")
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `w:sectPr`
#[derive(Debug, Clone, PartialEq)]
pub struct SectPrXml {
    /// `(w:type, r:id)`
    pub headers: Vec<(&'static str, String)>,
    pub footers: Vec<(&'static str, String)>,
    pub width: i32,
    pub height: i32,
    pub orientation: &'static str,
    /// top, right, bottom, left, header, footer, gutter
    pub margins: [i32; 7],
    pub columns: u8,
    pub column_spacing: i32,
    pub title_page: bool,
}

impl WriteXml for SectPrXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:sectPr", &[])?;
        for (kind, id) in &self.headers {
            w.empty("w:headerReference", &[("w:type", kind), ("r:id", id)])?;
        }
        for (kind, id) in &self.footers {
            w.empty("w:footerReference", &[("w:type", kind), ("r:id", id)])?;
        }
        let mut pg_sz = vec![
            ("w:w", self.width.to_string()),
            ("w:h", self.height.to_string()),
        ];
        if self.orientation != "portrait" {
            pg_sz.push(("w:orient", self.orientation.to_string()));
        }
        let pg_sz: Vec<(&str, &str)> = pg_sz.iter().map(|(k, v)| (*k, v.as_str())).collect();
        w.empty("w:pgSz", &pg_sz)?;

        let names = [
            "w:top", "w:right", "w:bottom", "w:left", "w:header", "w:footer", "w:gutter",
        ];
        let values: Vec<String> = self.margins.iter().map(i32::to_string).collect();
        let pg_mar: Vec<(&str, &str)> = names
            .iter()
            .zip(values.iter())
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        w.empty("w:pgMar", &pg_mar)?;

        w.empty(
            "w:cols",
            &[
                ("w:num", &self.columns.to_string()),
                ("w:space", &self.column_spacing.to_string()),
            ],
        )?;
        on_off(w, "w:titlePg", self.title_page)?;
        w.end("w:sectPr")
    }
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// `word/document.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentXml {
    pub body: Vec<BlockXml>,
    pub section: SectPrXml,
}

impl WriteXml for DocumentXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:document", &crate::xml::PART_NAMESPACES)?;
        w.start("w:body", &[])?;
        for block in &self.body {
            block.write_xml(w)?;
        }
        self.section.write_xml(w)?;
        w.end("w:body")?;
        w.end("w:document")
    }
}

/// `word/headerN.xml` or `word/footerN.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderFooterXml {
    /// `w:hdr` or `w:ftr`
    pub root: &'static str,
    pub paragraphs: Vec<ParagraphXml>,
}

impl WriteXml for HeaderFooterXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start(self.root, &crate::xml::PART_NAMESPACES)?;
        if self.paragraphs.is_empty() {
            ParagraphXml::default().write_xml(w)?;
        }
        for paragraph in &self.paragraphs {
            paragraph.write_xml(w)?;
        }
        w.end(self.root)
    }
}

/// One `w:style`
#[derive(Debug, Clone, PartialEq)]
pub struct StyleXml {
    pub style_type: &'static str,
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub custom: bool,
    pub based_on: Option<String>,
    pub next: Option<String>,
    pub ui_priority: Option<u32>,
    pub quick_format: bool,
    pub paragraph: PPrXml,
    pub run: RPrXml,
    pub table_borders: Vec<BorderXml>,
}

impl WriteXml for StyleXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let mut attrs = vec![("w:type", self.style_type), ("w:styleId", self.id.as_str())];
        if self.is_default {
            attrs.push(("w:default", "1"));
        }
        if self.custom {
            attrs.push(("w:customStyle", "1"));
        }
        w.start("w:style", &attrs)?;
        w.val("w:name", &self.name)?;
        if let Some(parent) = &self.based_on {
            w.val("w:basedOn", parent)?;
        }
        if let Some(next) = &self.next {
            w.val("w:next", next)?;
        }
        if let Some(priority) = self.ui_priority {
            w.val("w:uiPriority", &priority.to_string())?;
        }
        on_off(w, "w:qFormat", self.quick_format)?;
        self.paragraph.write_xml(w)?;
        self.run.write_xml(w)?;
        if !self.table_borders.is_empty() {
            w.start("w:tblPr", &[])?;
            write_borders(w, "w:tblBorders", &self.table_borders)?;
            w.end("w:tblPr")?;
        }
        w.end("w:style")
    }
}

/// `word/styles.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct StylesXml {
    pub default_font: String,
    pub default_size: u16,
    pub styles: Vec<StyleXml>,
}

impl WriteXml for StylesXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:styles", &[("xmlns:w", NS_W), ("xmlns:r", NS_R)])?;
        w.start("w:docDefaults", &[])?;
        w.start("w:rPrDefault", &[])?;
        RPrXml {
            fonts: Some(FontsXml {
                ascii: self.default_font.clone(),
                east_asia: Some(self.default_font.clone()),
                complex_script: Some(self.default_font.clone()),
            }),
            size: Some(self.default_size),
            ..RPrXml::default()
        }
        .write_xml(w)?;
        w.end("w:rPrDefault")?;
        w.start("w:pPrDefault", &[])?;
        PPrXml {
            spacing: Some(SpacingXml {
                after: Some(160),
                line: Some((259, "auto")),
                ..SpacingXml::default()
            }),
            ..PPrXml::default()
        }
        .write_xml(w)?;
        w.end("w:pPrDefault")?;
        w.end("w:docDefaults")?;
        for style in &self.styles {
            style.write_xml(w)?;
        }
        w.end("w:styles")
    }
}

/// One `w:lvl`
#[derive(Debug, Clone, PartialEq)]
pub struct LevelXml {
    pub level: u8,
    pub start: u32,
    pub format: &'static str,
    pub text: String,
    pub indent: i32,
    pub hanging: i32,
}

/// `w:abstractNum` plus its `w:num`
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractNumXml {
    pub abstract_id: u32,
    pub num_id: u32,
    pub levels: Vec<LevelXml>,
}

/// `word/numbering.xml`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberingXml {
    pub lists: Vec<AbstractNumXml>,
}

impl WriteXml for NumberingXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:numbering", &[("xmlns:w", NS_W)])?;
        // every w:abstractNum must precede the first w:num
        for list in &self.lists {
            w.start("w:abstractNum", &[("w:abstractNumId", &list.abstract_id.to_string())])?;
            w.val("w:multiLevelType", "hybridMultilevel")?;
            for level in &list.levels {
                w.start("w:lvl", &[("w:ilvl", &level.level.to_string())])?;
                w.val("w:start", &level.start.to_string())?;
                w.val("w:numFmt", level.format)?;
                w.val("w:lvlText", &level.text)?;
                w.val("w:lvlJc", "left")?;
                PPrXml {
                    indent: Some(IndentXml {
                        left: level.indent,
                        hanging: level.hanging,
                        ..IndentXml::default()
                    }),
                    ..PPrXml::default()
                }
                .write_xml(w)?;
                w.end("w:lvl")?;
            }
            w.end("w:abstractNum")?;
        }
        for list in &self.lists {
            w.start("w:num", &[("w:numId", &list.num_id.to_string())])?;
            w.val("w:abstractNumId", &list.abstract_id.to_string())?;
            w.end("w:num")?;
        }
        w.end("w:numbering")
    }
}

/// `word/settings.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsXml {
    pub update_fields: bool,
    pub even_and_odd_headers: bool,
    pub default_tab_stop: i32,
}

impl WriteXml for SettingsXml {
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:settings", &[("xmlns:w", NS_W)])?;
        w.val("w:defaultTabStop", &self.default_tab_stop.to_string())?;
        on_off(w, "w:evenAndOddHeaders", self.even_and_odd_headers)?;
        if self.update_fields {
            w.val("w:updateFields", "true")?;
        }
        w.end("w:settings")
    }
}
