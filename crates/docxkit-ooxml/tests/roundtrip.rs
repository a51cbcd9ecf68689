//! Package structure and write/read fidelity
//!
//! The document is built through the model API, packaged, and inspected both
//! as raw parts and after re-reading it with `DocxReader`.

use docxkit_model::{
    Alignment, Border, BorderStyle, Borders, Color, Document, Font, HeaderFooterType,
    HighlightColor, Indentation, LineSpacing, LineSpacingRule, ListKind, Metadata, NumberingRef,
    ParagraphProperties, RunProperties, Shading, ShadingPattern, UnderlineStyle,
    VerticalPosition,
};
use docxkit_ooxml::xml::XmlNode;
use docxkit_ooxml::{Compression, Config, DocumentPackageExt, DocxReader, PackageArchive, Packager};

const CORE_PARTS: [&str; 6] = [
    "[Content_Types].xml",
    "_rels/.rels",
    "word/document.xml",
    "word/_rels/document.xml.rels",
    "word/styles.xml",
    "word/settings.xml",
];

fn sample_document() -> Document {
    let mut doc = Document::new();
    doc.set_metadata(
        Metadata::new()
            .with_title("Sample Document")
            .with_creator("go-docx v2"),
    );

    doc.add_paragraph()
        .add_run("Welcome to go-docx v2")
        .set_bold(true)
        .set_size(32)
        .unwrap();

    let table = doc.add_table(3, 4).unwrap();
    for col in 0..4 {
        let header = format!("Header {}", col + 1);
        let paragraph = table.cell_mut(0, col).unwrap().set_text(&header);
        paragraph.set_alignment(Alignment::Center);
        paragraph.runs_mut().for_each(|run| {
            run.set_bold(true);
        });
    }
    doc
}

fn archive_of(doc: &Document) -> PackageArchive {
    PackageArchive::from_bytes(&doc.to_bytes().unwrap()).unwrap()
}

fn part(archive: &PackageArchive, name: &str) -> XmlNode {
    XmlNode::parse(archive.get(name).unwrap()).unwrap()
}

/// Every child of `node` is listed in `order`, and the children appear in
/// that order. Names sharing a group may interleave.
fn assert_schema_order(node: &XmlNode, order: &[&[&str]]) -> usize {
    let names: Vec<&str> = node.elements().map(|child| child.name.as_str()).collect();
    let ranks: Vec<usize> = names
        .iter()
        .map(|name| {
            order
                .iter()
                .position(|group| group.contains(name))
                .unwrap_or_else(|| panic!("unexpected <{name}> in <{}>", node.name))
        })
        .collect();
    assert!(
        ranks.windows(2).all(|pair| pair[0] <= pair[1]),
        "<{}> children out of order: {names:?}",
        node.name
    );
    let mut groups = ranks;
    groups.dedup();
    groups.len()
}

/// Paragraph, run and section with every property the serializer knows
fn fully_formatted_document() -> Document {
    let mut doc = Document::new();
    let list = doc.add_list(ListKind::Decimal);
    let rule = Border {
        style: BorderStyle::Single,
        size: 6,
        color: Color::BLACK,
        space: 1,
    };

    let paragraph = doc.add_paragraph();
    paragraph
        .set_properties(ParagraphProperties {
            style: Some("Heading1".into()),
            alignment: Some(Alignment::Justify),
            indentation: Indentation::hanging(720, 360),
            spacing_before: Some(120),
            spacing_after: Some(240),
            line_spacing: Some(LineSpacing {
                rule: LineSpacingRule::Auto,
                value: 276,
            }),
            numbering: Some(NumberingRef { num_id: list, level: 0 }),
            outline_level: Some(0),
            borders: Borders {
                bottom: Some(rule),
                ..Borders::default()
            },
            shading: Some(Shading {
                fill: Color::from_hex("EEEEEE").unwrap(),
                pattern: ShadingPattern::Clear,
                color: None,
            }),
            keep_next: true,
            keep_lines: true,
            page_break_before: true,
        })
        .unwrap();
    paragraph
        .add_run("formatted")
        .set_properties(RunProperties {
            style: Some("Strong".into()),
            font: Some(Font::new("Cambria")),
            color: Some(Color::from_hex("1F4E79").unwrap()),
            size: Some(28),
            bold: true,
            italic: true,
            strike: true,
            underline: UnderlineStyle::Single,
            highlight: HighlightColor::Yellow,
            vertical_position: Some(VerticalPosition::Superscript),
        })
        .unwrap();

    let section = doc.last_section_mut();
    section.header(HeaderFooterType::Default).unwrap().add_text("head");
    section.header(HeaderFooterType::Even).unwrap().add_text("even head");
    section.footer(HeaderFooterType::First).unwrap().add_text("first foot");
    section.set_columns(2, 720).unwrap();
    doc
}

// =============================================================================
// PACKAGE STRUCTURE
// =============================================================================

mod structure {
    use super::*;

    #[test]
    fn test_core_parts_present_and_well_formed() {
        let doc = sample_document();
        doc.validate().unwrap();
        let archive = archive_of(&doc);

        for name in CORE_PARTS {
            assert!(archive.contains(name), "missing {name}");
        }
        for name in archive.file_list() {
            if name.ends_with(".xml") || name.ends_with(".rels") {
                XmlNode::parse(archive.get(name).unwrap())
                    .unwrap_or_else(|err| panic!("{name} is not well-formed: {err}"));
            }
        }
        assert_eq!(archive.file_list().next(), Some("[Content_Types].xml"));
    }

    #[test]
    fn test_table_grid_matches_shape() {
        let archive = archive_of(&sample_document());
        let root = part(&archive, "word/document.xml");
        let table = root.child("w:body").unwrap().child("w:tbl").unwrap();

        let grid = table.child("w:tblGrid").unwrap();
        assert_eq!(grid.children_named("w:gridCol").count(), 4);
        let rows: Vec<_> = table.children_named("w:tr").collect();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.children_named("w:tc").count(), 4);
        }
    }

    #[test]
    fn test_package_relationships_point_at_parts() {
        let archive = archive_of(&sample_document());
        let rels = part(&archive, "_rels/.rels");
        let targets: Vec<_> = rels
            .children_named("Relationship")
            .map(|rel| rel.attr("Target").unwrap().to_string())
            .collect();
        assert_eq!(targets, ["word/document.xml", "docProps/core.xml", "docProps/app.xml"]);
        for target in targets {
            assert!(archive.contains(&target));
        }
    }

    #[test]
    fn test_settings_children_in_schema_order() {
        let archive = archive_of(&fully_formatted_document());
        let settings = part(&archive, "word/settings.xml");
        let present = assert_schema_order(
            &settings,
            &[&["w:defaultTabStop"], &["w:evenAndOddHeaders"], &["w:updateFields"]],
        );
        assert_eq!(present, 3);
    }

    #[test]
    fn test_property_children_in_schema_order() {
        let archive = archive_of(&fully_formatted_document());
        let root = part(&archive, "word/document.xml");
        let body = root.child("w:body").unwrap();
        let paragraph = body.child("w:p").unwrap();

        let ppr_order: &[&[&str]] = &[
            &["w:pStyle"],
            &["w:keepNext"],
            &["w:keepLines"],
            &["w:pageBreakBefore"],
            &["w:numPr"],
            &["w:pBdr"],
            &["w:shd"],
            &["w:spacing"],
            &["w:ind"],
            &["w:jc"],
            &["w:outlineLvl"],
            &["w:sectPr"],
        ];
        let present = assert_schema_order(paragraph.child("w:pPr").unwrap(), ppr_order);
        assert_eq!(present, ppr_order.len() - 1);

        let rpr_order: &[&[&str]] = &[
            &["w:rStyle"],
            &["w:rFonts"],
            &["w:b"],
            &["w:i"],
            &["w:strike"],
            &["w:color"],
            &["w:sz"],
            &["w:szCs"],
            &["w:highlight"],
            &["w:u"],
            &["w:vertAlign"],
        ];
        let rpr = paragraph.child("w:r").unwrap().child("w:rPr").unwrap();
        assert_eq!(assert_schema_order(rpr, rpr_order), rpr_order.len());

        let sect_order: &[&[&str]] = &[
            &["w:headerReference", "w:footerReference"],
            &["w:pgSz"],
            &["w:pgMar"],
            &["w:cols"],
            &["w:titlePg"],
        ];
        let sect_pr = body.elements().last().unwrap();
        assert!(sect_pr.is("w:sectPr"));
        assert_eq!(assert_schema_order(sect_pr, sect_order), sect_order.len());
    }

    #[test]
    fn test_stored_compression_from_config() {
        let config = Config::from_toml_str("[package]\ncompression = \"stored\"\n").unwrap();
        assert_eq!(config.package.compression, Compression::Stored);

        let bytes = Packager::new(config.package).to_bytes(&sample_document()).unwrap();
        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        for i in 0..zip.len() {
            let entry = zip.by_index(i).unwrap();
            assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
        }
    }
}

// =============================================================================
// WRITE THEN READ
// =============================================================================

mod fidelity {
    use super::*;

    #[test]
    fn test_sample_document_reopens() {
        let reopened = DocxReader::from_bytes(&sample_document().to_bytes().unwrap())
            .unwrap()
            .read()
            .unwrap();

        let first = reopened.paragraphs().next().unwrap();
        assert_eq!(first.text(), "Welcome to go-docx v2");
        let run = first.runs().next().unwrap();
        assert!(run.properties().bold);
        assert_eq!(run.properties().size, Some(32));

        assert_eq!(reopened.metadata().title.as_deref(), Some("Sample Document"));
        assert_eq!(reopened.metadata().creator.as_deref(), Some("go-docx v2"));

        let table = reopened.tables().next().unwrap();
        assert_eq!((table.row_count(), table.column_count()), (3, 4));
        let header = table.cell(0, 3).unwrap().paragraphs().next().unwrap();
        assert_eq!(header.text(), "Header 4");
        assert_eq!(header.properties().alignment, Some(Alignment::Center));
        assert!(header.runs().all(|run| run.properties().bold));
        reopened.validate().unwrap();
    }

    #[test]
    fn test_second_write_is_stable() {
        let first = sample_document().to_bytes().unwrap();
        let reopened = DocxReader::from_bytes(&first).unwrap().read().unwrap();
        let second = PackageArchive::from_bytes(&reopened.to_bytes().unwrap()).unwrap();
        let first = PackageArchive::from_bytes(&first).unwrap();

        let names: Vec<_> = first.file_list().collect();
        assert_eq!(second.file_list().collect::<Vec<_>>(), names);
        for name in ["word/document.xml", "word/_rels/document.xml.rels", "word/styles.xml"] {
            assert_eq!(first.get(name), second.get(name), "{name} changed");
        }
    }

    #[test]
    fn test_reads_of_one_package_are_independent() {
        let bytes = sample_document().to_bytes().unwrap();
        let original = DocxReader::from_bytes(&bytes).unwrap().read().unwrap();
        let mut copy = DocxReader::from_bytes(&bytes).unwrap().read().unwrap();
        let rel_count = original.relationships().len();

        let pixel = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        pixel.write_to(&mut png, image::ImageFormat::Png).unwrap();
        copy.add_paragraph().add_image(png.into_inner(), "copy.png").unwrap();

        assert_eq!(copy.context().media().count(), 1);
        assert_eq!(original.context().media().count(), 0);
        assert_eq!(original.relationships().len(), rel_count);
        assert!(copy.relationships().len() > rel_count);
        let repackaged = PackageArchive::from_bytes(&original.to_bytes().unwrap()).unwrap();
        assert!(!repackaged.file_list().any(|name| name.starts_with("word/media/")));
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.docx");
        sample_document().save(&path).unwrap();

        let reopened = DocxReader::open(&path).unwrap().read().unwrap();
        assert!(reopened.text().starts_with("Welcome to go-docx v2"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
