//! Entity graph behaviour across modules

use std::io::Cursor;

use docxkit_model::{
    Alignment, CellContent, Document, DocumentOptions, ErrorKind, Field, FooterType, HeaderType,
    ImageSize, Indentation, MediaDedup, Metadata, RelationshipTable, Style, StyleType,
    VerticalMerge,
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[test]
fn test_sample_document_graph() {
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
        let cell = table.cell_mut(0, col).unwrap();
        cell.set_text(&format!("Header {}", col + 1))
            .set_alignment(Alignment::Center)
            .runs_mut()
            .for_each(|run| {
                run.set_bold(true);
            });
    }

    doc.validate().unwrap();
    assert_eq!(doc.metadata().title.as_deref(), Some("Sample Document"));
    assert_eq!(doc.paragraphs().next().unwrap().text(), "Welcome to go-docx v2");
    let table = doc.tables().next().unwrap();
    assert_eq!((table.row_count(), table.column_count()), (3, 4));
    assert_eq!(table.cell(0, 3).unwrap().text(), "Header 4");
}

#[test]
fn test_style_registry_protection() {
    let doc = Document::new();
    let styles = doc.styles();
    let err = styles.add_style(Style::paragraph_style("Normal", "Mine")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(styles.remove_style("Heading1").is_err());
    assert!(styles.update_style(Style::paragraph_style("Title", "Title")).is_err());
    assert!(styles.remove_style("NoSuchStyle").is_err());

    styles
        .add_style(Style::paragraph_style("Callout", "Callout").based_on("Normal"))
        .unwrap();
    assert!(styles.add_style(Style::paragraph_style("Callout", "Again")).is_err());
    assert!(styles.set_default_style(StyleType::Character, "Callout").is_err());
    styles.set_default_style(StyleType::Paragraph, "Callout").unwrap();
    assert_eq!(styles.default_style(StyleType::Paragraph).as_deref(), Some("Callout"));
    assert!(styles.has_style("Callout"));
    assert!(!styles.is_builtin("Callout"));
}

#[test]
fn test_indent_and_merge_invariants_through_document() {
    let mut doc = Document::new();
    let paragraph = doc.add_paragraph();
    let bad = Indentation {
        first_line: 10,
        hanging: 10,
        ..Indentation::default()
    };
    assert!(paragraph.set_indent(bad).is_err());
    assert!(paragraph.indent().is_empty());

    let table = doc.add_table(2, 2).unwrap();
    let cell = table.cell_mut(0, 0).unwrap();
    assert!(cell.merge(0, 1).is_err());
    cell.merge(1, 2).unwrap();
    assert_eq!(cell.vertical_merge(), VerticalMerge::Restart);
    assert_eq!(cell.grid_span(), 1);
}

#[test]
fn test_font_size_and_table_bounds() {
    let mut doc = Document::new();
    let run = doc.add_paragraph().add_run("x");
    assert!(run.set_size(1).is_err());
    assert!(run.set_size(3277).is_err());
    run.set_size(2).unwrap();
    run.set_size(3276).unwrap();

    for (rows, cols) in [(0, 1), (1, 0), (1001, 1), (1, 64)] {
        let err = doc.add_table(rows, cols).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{rows}x{cols}");
    }
    assert_eq!(doc.tables().count(), 0);
    doc.add_table(1000, 63).unwrap();
}

#[test]
fn test_images_in_document_and_header() {
    let mut doc = Document::with_options(DocumentOptions {
        media_dedup: MediaDedup::ContentHash,
        ..DocumentOptions::default()
    });
    let logo = png(40, 20);
    doc.add_paragraph().add_image(logo.clone(), "logo.png").unwrap();
    doc.add_paragraph()
        .add_image_with_size(logo.clone(), "logo-again.png", ImageSize::new(80, 40))
        .unwrap();
    let header = doc.last_section_mut().header(HeaderType::Default).unwrap();
    header.add_paragraph().add_image(logo, "logo.png").unwrap();

    assert_eq!(doc.context().media().count(), 1);
    let image_rels = doc
        .relationships()
        .all()
        .into_iter()
        .filter(|r| r.rel_type == RelationshipTable::TYPE_IMAGE)
        .count();
    assert_eq!(image_rels, 1);
    let header = doc.last_section().get_header(HeaderType::Default).unwrap();
    assert_eq!(header.relationships().len(), 1);
    doc.validate().unwrap();
}

#[test]
fn test_nested_cells_and_footer_fields() {
    let mut doc = Document::new();
    let table = doc.add_table(1, 2).unwrap();
    let inner = table.cell_mut(0, 1).unwrap().add_table(2, 2).unwrap();
    inner.cell_mut(0, 0).unwrap().set_text("inner");
    doc.last_section_mut()
        .footer(FooterType::Default)
        .unwrap()
        .add_paragraph()
        .add_field(Field::page_number());
    doc.add_paragraph().add_run("after");

    let outer = doc.tables().next().unwrap();
    let nested = outer
        .cell(0, 1)
        .unwrap()
        .content()
        .iter()
        .filter(|c| matches!(c, CellContent::Table(_)))
        .count();
    assert_eq!(nested, 1);
    // 2 outer cells + 4 inner cells + trailing body paragraph
    assert_eq!(doc.all_paragraphs().len(), 7);
    doc.validate().unwrap();
}
