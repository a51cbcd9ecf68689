//! Entity graph to XML structures
//!
//! Every function here is a pure read of the model. Style references are
//! written as they are; inheritance is left to the consumer.

use docxkit_model::{
    AxisPosition, BodyElement, Border, Borders, CellContent, Document, Field, FloatingPosition,
    HeaderFooter, HighlightColor, HyperlinkTarget, Image, ImagePosition, NumberingCatalog,
    PartKind, Paragraph, ParagraphChild, ParagraphProperties, Run, RunContent, RunProperties,
    Section, Shading, StyleRegistry, Table, TableCell, UnderlineStyle, VerticalMerge,
};

use crate::config::PackageOptions;
use crate::schema::{
    AbstractNumXml, AnchorXml, AxisXml, BlockXml, BorderXml, CellXml, DocumentXml, DrawingXml,
    FontsXml, HeaderFooterXml, HyperlinkXml, IndentXml, InlineXml, LevelXml, NumberingXml,
    PPrXml, ParagraphXml, PlacementXml, RPrXml, RowXml, RunItemXml, RunXml, SectPrXml,
    SettingsXml, ShadingXml, SpacingXml, StyleXml, StylesXml, TableXml,
};

/// `word/document.xml`
pub fn document_xml(doc: &Document) -> DocumentXml {
    let body = doc
        .body()
        .iter()
        .map(|element| match element {
            BodyElement::Paragraph(p) => BlockXml::Paragraph(paragraph_xml(p)),
            BodyElement::Table(t) => BlockXml::Table(table_xml(t)),
            BodyElement::SectionBreak(section) => BlockXml::Paragraph(ParagraphXml {
                properties: PPrXml {
                    section: Some(Box::new(section_xml(section))),
                    ..PPrXml::default()
                },
                content: Vec::new(),
            }),
        })
        .collect();
    DocumentXml {
        body,
        section: section_xml(doc.last_section()),
    }
}

pub fn paragraph_xml(paragraph: &Paragraph) -> ParagraphXml {
    let mut content = Vec::new();
    for child in paragraph.children() {
        match child {
            ParagraphChild::Run(run) => {
                let mut runs = Vec::new();
                push_run(run, &mut runs);
                content.extend(runs.into_iter().map(InlineXml::Run));
            }
            ParagraphChild::Field(field) => {
                let mut runs = Vec::new();
                push_field(field, &RPrXml::default(), &mut runs);
                content.extend(runs.into_iter().map(InlineXml::Run));
            }
            ParagraphChild::Hyperlink(link) => {
                let mut runs = Vec::new();
                for run in link.runs() {
                    push_run(run, &mut runs);
                }
                let (relationship_id, anchor) = match link.target() {
                    HyperlinkTarget::External {
                        relationship_id, ..
                    } => (Some(relationship_id.clone()), None),
                    HyperlinkTarget::Anchor(name) => (None, Some(name.clone())),
                };
                content.push(InlineXml::Hyperlink(HyperlinkXml {
                    relationship_id,
                    anchor,
                    tooltip: link.tooltip().map(str::to_string),
                    runs,
                }));
            }
            ParagraphChild::Bookmark(bookmark) => {
                let id = bookmark.numeric_id();
                content.push(InlineXml::BookmarkStart {
                    id,
                    name: bookmark.name().to_string(),
                });
                content.push(InlineXml::BookmarkEnd { id });
            }
        }
    }
    ParagraphXml {
        properties: ppr_xml(paragraph.properties()),
        content,
    }
}

pub fn ppr_xml(props: &ParagraphProperties) -> PPrXml {
    let spacing = (props.spacing_before.is_some()
        || props.spacing_after.is_some()
        || props.line_spacing.is_some())
    .then(|| SpacingXml {
        before: props.spacing_before,
        after: props.spacing_after,
        line: props.line_spacing.map(|l| (l.value, l.rule.as_str())),
    });
    let indent = (!props.indentation.is_empty()).then(|| IndentXml {
        left: props.indentation.left,
        right: props.indentation.right,
        first_line: props.indentation.first_line,
        hanging: props.indentation.hanging,
    });
    PPrXml {
        style: props.style.clone(),
        keep_next: props.keep_next,
        keep_lines: props.keep_lines,
        page_break_before: props.page_break_before,
        numbering: props.numbering.map(|n| (n.num_id, n.level)),
        borders: borders_xml(&props.borders),
        shading: props.shading.as_ref().map(shading_xml),
        spacing,
        indent,
        justification: props.alignment.map(|a| a.as_str()),
        outline_level: props.outline_level,
        section: None,
    }
}

pub fn rpr_xml(props: &RunProperties) -> RPrXml {
    RPrXml {
        style: props.style.clone(),
        fonts: props.font.as_ref().map(|font| FontsXml {
            ascii: font.name.clone(),
            east_asia: font.east_asia.clone(),
            complex_script: font.complex_script.clone(),
        }),
        bold: props.bold,
        italic: props.italic,
        strike: props.strike,
        color: props.color.map(|c| c.to_hex()),
        size: props.size,
        highlight: (props.highlight != HighlightColor::None).then(|| props.highlight.as_str()),
        underline: (props.underline != UnderlineStyle::None).then(|| props.underline.as_str()),
        vertical_align: props.vertical_position.map(|p| p.as_str()),
    }
}

/// A run followed by the runs of its embedded fields
fn push_run(run: &Run, out: &mut Vec<RunXml>) {
    let properties = rpr_xml(run.properties());
    let item = match run.content() {
        RunContent::Text(text) if text.is_empty() && !run.fields().is_empty() => None,
        RunContent::Text(text) => Some(RunItemXml::Text(text.clone())),
        RunContent::Tab => Some(RunItemXml::Tab),
        RunContent::Break(kind) => Some(RunItemXml::Break(kind.as_attr())),
        RunContent::Image(image) => Some(RunItemXml::Drawing(drawing_xml(image))),
    };
    if let Some(item) = item {
        out.push(RunXml {
            properties: properties.clone(),
            items: vec![item],
        });
    }
    for field in run.fields() {
        push_field(field, &properties, out);
    }
}

/// begin, instruction, separate, cached result, end
fn push_field(field: &Field, properties: &RPrXml, out: &mut Vec<RunXml>) {
    let mut single = |item| {
        out.push(RunXml {
            properties: properties.clone(),
            items: vec![item],
        })
    };
    single(RunItemXml::FldChar {
        kind: "begin",
        dirty: field.is_dirty(),
    });
    single(RunItemXml::InstrText(format!(" {} ", field.code())));
    single(RunItemXml::FldChar {
        kind: "separate",
        dirty: false,
    });
    if !field.result().is_empty() {
        single(RunItemXml::Text(field.result().to_string()));
    }
    single(RunItemXml::FldChar {
        kind: "end",
        dirty: false,
    });
}

fn drawing_xml(image: &Image) -> DrawingXml {
    let size = image.size();
    let placement = match image.position() {
        ImagePosition::Inline => PlacementXml::Inline,
        ImagePosition::Floating(floating) => PlacementXml::Anchor(anchor_xml(&floating)),
    };
    DrawingXml {
        id: image.drawing_id(),
        name: format!("Picture {}", image.drawing_id()),
        description: image.description().to_string(),
        relationship_id: image.relationship_id().unwrap_or_default().to_string(),
        cx: size.width_emu,
        cy: size.height_emu,
        placement,
    }
}

fn anchor_xml(floating: &FloatingPosition) -> AnchorXml {
    let axis = |position: AxisPosition| match position {
        AxisPosition::Align(align) => AxisXml::Align(align.as_str()),
        AxisPosition::Offset(emu) => AxisXml::Offset(emu),
    };
    AnchorXml {
        behind_text: floating.behind_text,
        relative_height: floating.z_order,
        horizontal_from: floating.horizontal_from.as_str(),
        horizontal: axis(floating.horizontal),
        vertical_from: floating.vertical_from.as_str(),
        vertical: axis(floating.vertical),
        wrap: floating.wrap.element_name(),
    }
}

fn border_xml(edge: &'static str, border: &Border) -> BorderXml {
    BorderXml {
        edge,
        style: border.style.as_str(),
        size: border.size,
        space: border.space,
        color: border.color.to_hex(),
    }
}

fn borders_xml(borders: &Borders) -> Vec<BorderXml> {
    borders
        .edges()
        .map(|(edge, border)| border_xml(edge, border))
        .collect()
}

fn shading_xml(shading: &Shading) -> ShadingXml {
    ShadingXml {
        pattern: shading.pattern.as_str(),
        color: shading
            .color
            .map_or_else(|| "auto".to_string(), |c| c.to_hex()),
        fill: shading.fill.to_hex(),
    }
}

/// `w:tbl` with its grid sized to the widest row
pub fn table_xml(table: &Table) -> TableXml {
    let rows = table
        .rows()
        .iter()
        .map(|row| RowXml {
            height: row.height().map(|(twips, rule)| (twips, rule.as_str())),
            header: row.is_header(),
            cant_split: row.cant_split(),
            cells: row.cells().iter().map(cell_xml).collect(),
        })
        .collect();
    TableXml {
        style: table.style().map(str::to_string),
        width: table.width().attrs(),
        justification: table.alignment().map(|a| a.as_str()),
        borders: borders_xml(table.borders()),
        grid: table.grid_columns(),
        rows,
    }
}

fn cell_xml(cell: &TableCell) -> CellXml {
    let mut content: Vec<BlockXml> = cell
        .content()
        .iter()
        .map(|item| match item {
            CellContent::Paragraph(p) => BlockXml::Paragraph(paragraph_xml(p)),
            CellContent::Table(t) => BlockXml::Table(table_xml(t)),
        })
        .collect();
    // a cell must end with a paragraph
    if !matches!(content.last(), Some(BlockXml::Paragraph(_))) {
        content.push(BlockXml::Paragraph(ParagraphXml::default()));
    }
    CellXml {
        width: cell.width().map(|w| w.attrs()),
        grid_span: cell.grid_span(),
        vertical_merge: match cell.vertical_merge() {
            VerticalMerge::None => None,
            VerticalMerge::Restart => Some(Some("restart")),
            VerticalMerge::Continue => Some(None),
        },
        borders: borders_xml(cell.borders()),
        shading: cell.shading().map(shading_xml),
        vertical_alignment: cell.vertical_alignment().map(|v| v.as_str()),
        content,
    }
}

pub fn section_xml(section: &Section) -> SectPrXml {
    let size = section.page_size();
    let m = section.margins();
    SectPrXml {
        headers: references(section.headers()),
        footers: references(section.footers()),
        width: size.width,
        height: size.height,
        orientation: section.orientation().as_str(),
        margins: [m.top, m.right, m.bottom, m.left, m.header, m.footer, m.gutter],
        columns: section.columns(),
        column_spacing: section.column_spacing(),
        title_page: section.title_page(),
    }
}

fn references<'a>(parts: impl Iterator<Item = &'a HeaderFooter>) -> Vec<(&'static str, String)> {
    parts
        .map(|part| (part.scope().as_str(), part.relationship_id().to_string()))
        .collect()
}

pub fn header_footer_xml(part: &HeaderFooter) -> HeaderFooterXml {
    HeaderFooterXml {
        root: match part.kind() {
            PartKind::Header => "w:hdr",
            PartKind::Footer => "w:ftr",
        },
        paragraphs: part.paragraphs().iter().map(paragraph_xml).collect(),
    }
}

/// `word/styles.xml` from every registered style, built-ins first
pub fn styles_xml(registry: &StyleRegistry, options: &PackageOptions) -> StylesXml {
    let styles = registry
        .all()
        .into_iter()
        .map(|style| StyleXml {
            style_type: style.style_type.as_str(),
            is_default: registry.is_default(&style.id),
            custom: !style.is_builtin(),
            id: style.id,
            name: style.name,
            based_on: style.based_on,
            next: style.next,
            ui_priority: style.ui_priority,
            quick_format: style.quick_format,
            paragraph: ppr_xml(&style.paragraph),
            run: rpr_xml(&style.run),
            table_borders: style.table_borders.as_ref().map(borders_xml).unwrap_or_default(),
        })
        .collect();
    StylesXml {
        default_font: options.default_font.clone(),
        default_size: options.default_font_size,
        styles,
    }
}

pub fn numbering_xml(catalog: &NumberingCatalog) -> NumberingXml {
    NumberingXml {
        lists: catalog
            .definitions()
            .iter()
            .map(|def| AbstractNumXml {
                abstract_id: def.abstract_id,
                num_id: def.num_id,
                levels: def
                    .levels
                    .iter()
                    .map(|level| LevelXml {
                        level: level.level,
                        start: level.start,
                        format: level.format.as_str(),
                        text: level.text.clone(),
                        indent: level.indent,
                        hanging: level.hanging,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn settings_xml(doc: &Document, options: &PackageOptions) -> SettingsXml {
    let even_and_odd_headers = doc.sections().iter().any(|section| {
        section
            .headers()
            .chain(section.footers())
            .any(|part| part.scope() == docxkit_model::HeaderFooterType::Even)
    });
    SettingsXml {
        update_fields: options.update_fields_on_open,
        even_and_odd_headers,
        default_tab_stop: 720,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docxkit_model::{Alignment, Field, FooterType, Style};

    #[test]
    fn test_sample_run_mapping() {
        let mut doc = Document::new();
        doc.add_paragraph()
            .set_alignment(Alignment::Justify)
            .add_run("Welcome")
            .set_bold(true)
            .set_size(32)
            .unwrap();
        let xml = document_xml(&doc);
        let BlockXml::Paragraph(p) = &xml.body[0] else {
            panic!("expected a paragraph");
        };
        assert_eq!(p.properties.justification, Some("both"));
        let InlineXml::Run(run) = &p.content[0] else {
            panic!("expected a run");
        };
        assert!(run.properties.bold);
        assert_eq!(run.properties.size, Some(32));
        assert_eq!(run.items, vec![RunItemXml::Text("Welcome".into())]);
    }

    #[test]
    fn test_field_sequence() {
        let mut doc = Document::new();
        let mut field = Field::page_number();
        field.set_dirty(true);
        doc.add_paragraph().add_field(field);
        let xml = document_xml(&doc);
        let BlockXml::Paragraph(p) = &xml.body[0] else {
            panic!("expected a paragraph");
        };
        let items: Vec<_> = p
            .content
            .iter()
            .map(|c| match c {
                InlineXml::Run(r) => r.items[0].clone(),
                _ => panic!("fields are plain runs"),
            })
            .collect();
        assert_eq!(
            items,
            vec![
                RunItemXml::FldChar { kind: "begin", dirty: true },
                RunItemXml::InstrText(" PAGE ".into()),
                RunItemXml::FldChar { kind: "separate", dirty: false },
                RunItemXml::Text("1".into()),
                RunItemXml::FldChar { kind: "end", dirty: false },
            ]
        );
    }

    #[test]
    fn test_grid_and_merges() {
        let mut doc = Document::new();
        let table = doc.add_table(3, 4).unwrap();
        table.merge_cells(0, 1, 2, 2).unwrap();
        let t = table_xml(doc.tables().next().unwrap());
        assert_eq!(t.grid, vec![2340; 4]);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[0].cells.len(), 3);
        assert_eq!(t.rows[0].cells[1].grid_span, 2);
        assert_eq!(t.rows[0].cells[1].vertical_merge, Some(Some("restart")));
        assert_eq!(t.rows[1].cells[1].vertical_merge, Some(None));
        assert_eq!(t.rows[2].cells[1].vertical_merge, None);
    }

    #[test]
    fn test_cell_ending_in_table_gets_paragraph() {
        let mut doc = Document::new();
        let table = doc.add_table(1, 1).unwrap();
        let cell = table.cell_mut(0, 0).unwrap();
        cell.clear();
        cell.add_table(1, 1).unwrap();
        let t = table_xml(doc.tables().next().unwrap());
        let content = &t.rows[0].cells[0].content;
        assert!(matches!(content[0], BlockXml::Table(_)));
        assert!(matches!(content[1], BlockXml::Paragraph(_)));
        // serializing did not touch the model
        let cell = doc.tables().next().unwrap().cell(0, 0).unwrap();
        assert_eq!(cell.content().len(), 1);
    }

    #[test]
    fn test_section_breaks_and_references() {
        let mut doc = Document::new();
        doc.add_paragraph().add_run("one");
        doc.add_section();
        doc.add_paragraph().add_run("two");
        doc.last_section_mut()
            .footer(FooterType::First)
            .unwrap()
            .add_text("cover");
        let xml = document_xml(&doc);
        assert_eq!(xml.body.len(), 3);
        let BlockXml::Paragraph(brk) = &xml.body[1] else {
            panic!("section break is a paragraph");
        };
        assert!(brk.properties.section.is_some());
        assert_eq!(xml.section.footers.len(), 1);
        assert_eq!(xml.section.footers[0].0, "first");
        assert!(xml.section.title_page);
    }

    #[test]
    fn test_styles_mark_custom_and_default() {
        let doc = Document::new();
        doc.styles()
            .add_style(Style::paragraph_style("Quote2", "Quote 2").based_on("Normal"))
            .unwrap();
        let styles = styles_xml(doc.styles(), &PackageOptions::default());
        let normal = styles.styles.iter().find(|s| s.id == "Normal").unwrap();
        assert!(normal.is_default && !normal.custom);
        let custom = styles.styles.iter().find(|s| s.id == "Quote2").unwrap();
        assert!(custom.custom);
        assert_eq!(custom.based_on.as_deref(), Some("Normal"));
        assert_eq!(styles.default_font, "Calibri");
    }
}
