//! Reader coverage
//!
//! Each feature is written through the model API and checked again after the
//! package has been read back.

use docxkit_model::{
    Alignment, Document, FloatingPosition, HeaderFooterType, HyperlinkTarget, ImagePosition,
    ListKind, NumberFormat, Orientation, PageSize, PositionAlign, RelationshipTable,
    VerticalMerge, WrapType,
};
use docxkit_ooxml::{DocumentPackageExt, DocxReader};

fn reopen(doc: &Document) -> Document {
    let bytes = doc.to_bytes().unwrap();
    DocxReader::from_bytes(&bytes).unwrap().read().unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

// =============================================================================
// IMAGES
// =============================================================================

mod images {
    use super::*;

    #[test]
    fn test_inline_image() {
        let data = png(4, 2);
        let mut doc = Document::new();
        let run = doc.add_paragraph().add_image(data.clone(), "logo.png").unwrap();
        run.image_mut().unwrap().set_description("Company logo");

        let reopened = reopen(&doc);
        let paragraph = reopened.paragraphs().next().unwrap();
        let image = paragraph.images().next().unwrap();
        assert_eq!((image.size().width_px, image.size().height_px), (4, 2));
        assert_eq!(image.data(), &data[..]);
        assert_eq!(image.description(), "Company logo");
        assert!(image.position().is_inline());

        let rel = reopened
            .relationships()
            .get(image.relationship_id().unwrap())
            .unwrap();
        assert_eq!(rel.rel_type, RelationshipTable::TYPE_IMAGE);
        assert_eq!(reopened.context().media().count(), 1);
        reopened.validate().unwrap();
    }

    #[test]
    fn test_floating_image() {
        let position = FloatingPosition::aligned(PositionAlign::Center)
            .with_wrap(WrapType::TopAndBottom)
            .with_z_order(3)
            .behind_text(true);
        let mut doc = Document::new();
        doc.add_paragraph()
            .add_image_with_position(png(8, 8), "float.png", None, ImagePosition::Floating(position))
            .unwrap();

        let reopened = reopen(&doc);
        let image = reopened.paragraphs().next().unwrap().images().next().unwrap();
        assert_eq!(image.position(), ImagePosition::Floating(position));
    }

    #[test]
    fn test_new_image_after_reopen_gets_fresh_ids() {
        let mut doc = Document::new();
        doc.add_paragraph().add_image(png(2, 2), "a.png").unwrap();

        let mut reopened = reopen(&doc);
        let first = reopened.paragraphs().next().unwrap().images().next().unwrap();
        let (first_rel, first_target) = (
            first.relationship_id().unwrap().to_string(),
            first.target().unwrap().to_string(),
        );

        let run = reopened.add_paragraph().add_image(png(3, 3), "b.png").unwrap();
        let second = run.image().unwrap();
        assert_ne!(second.relationship_id().unwrap(), first_rel);
        assert_ne!(second.target().unwrap(), first_target);
        assert_eq!(reopened.context().media().count(), 2);
        reopened.to_bytes().unwrap();
    }
}

// =============================================================================
// HEADERS, FOOTERS AND SECTIONS
// =============================================================================

mod sections {
    use super::*;

    #[test]
    fn test_headers_and_footers() {
        let mut doc = Document::new();
        doc.add_paragraph().add_run("Body");
        let section = doc.last_section_mut();
        section.header(HeaderFooterType::Default).unwrap().add_text("Running head");
        section.header(HeaderFooterType::First).unwrap().add_text("Cover");
        section
            .footer(HeaderFooterType::Default)
            .unwrap()
            .add_page_number(Alignment::Center);

        let reopened = reopen(&doc);
        let section = reopened.last_section();
        assert!(section.title_page());
        assert_eq!(
            section.get_header(HeaderFooterType::Default).unwrap().text(),
            "Running head"
        );
        assert_eq!(section.get_header(HeaderFooterType::First).unwrap().text(), "Cover");

        let footer = section.get_footer(HeaderFooterType::Default).unwrap();
        let line = &footer.paragraphs()[0];
        assert_eq!(line.properties().alignment, Some(Alignment::Center));
        let codes: Vec<_> = line.fields().map(|f| f.code().to_string()).collect();
        assert_eq!(codes, ["PAGE", "NUMPAGES"]);
        reopened.validate().unwrap();
    }

    #[test]
    fn test_section_layouts() {
        let mut doc = Document::new();
        doc.add_paragraph().add_run("Portrait");
        doc.add_section()
            .set_layout(
                PageSize {
                    width: PageSize::A4.height,
                    height: PageSize::A4.width,
                },
                Orientation::Landscape,
            )
            .unwrap()
            .set_columns(2, 708)
            .unwrap();
        doc.add_paragraph().add_run("Landscape");

        let reopened = reopen(&doc);
        let sections = reopened.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].orientation(), Orientation::Portrait);
        assert_eq!(sections[1].orientation(), Orientation::Landscape);
        assert_eq!(sections[1].page_size().width, PageSize::A4.height);
        assert_eq!((sections[1].columns(), sections[1].column_spacing()), (2, 708));
        assert_eq!(reopened.text(), "Portrait\nLandscape");
    }
}

// =============================================================================
// TABLES, LISTS AND LINKS
// =============================================================================

mod content {
    use super::*;

    #[test]
    fn test_merged_cells() {
        let mut doc = Document::new();
        let table = doc.add_table(3, 3).unwrap();
        table.merge_cells(0, 0, 2, 1).unwrap();
        table.merge_cells(1, 2, 1, 2).unwrap();

        let reopened = reopen(&doc);
        let table = reopened.tables().next().unwrap();
        assert_eq!(table.row(0).unwrap().cells().len(), 2);
        assert_eq!(table.cell(0, 0).unwrap().grid_span(), 2);
        assert_eq!(table.cell(1, 2).unwrap().vertical_merge(), VerticalMerge::Restart);
        assert_eq!(table.cell(2, 2).unwrap().vertical_merge(), VerticalMerge::Continue);
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_lists() {
        let mut doc = Document::new();
        let bullets = doc.add_list(ListKind::Bullet);
        let steps = doc.add_list(ListKind::Decimal);
        doc.add_list_item(bullets, 0, "apples").unwrap();
        doc.add_list_item(bullets, 1, "green").unwrap();
        doc.add_list_item(steps, 0, "first").unwrap();

        let reopened = reopen(&doc);
        let numbering = reopened.numbering();
        assert_eq!(numbering.len(), 2);

        let refs: Vec<_> = reopened
            .paragraphs()
            .map(|p| p.properties().numbering.map(|n| (n.num_id, n.level)))
            .collect();
        assert_eq!(refs, [Some((bullets, 0)), Some((bullets, 1)), Some((steps, 0))]);
        let level = numbering.get(steps).unwrap().level(0).unwrap();
        assert_eq!(level.format, NumberFormat::Decimal);
        reopened.validate().unwrap();
    }

    #[test]
    fn test_hyperlinks_and_bookmarks() {
        let mut doc = Document::new();
        doc.add_paragraph().add_bookmark("intro").unwrap();
        let paragraph = doc.add_paragraph();
        paragraph
            .add_hyperlink("https://example.com/docs", "docs")
            .unwrap()
            .set_tooltip("Read the docs");
        paragraph.add_internal_link("intro", "back to top").unwrap();

        let reopened = reopen(&doc);
        let links: Vec<_> = reopened.paragraphs().nth(1).unwrap().hyperlinks().collect();
        assert_eq!(links.len(), 2);

        match links[0].target() {
            HyperlinkTarget::External { relationship_id, url } => {
                assert_eq!(url, "https://example.com/docs");
                assert!(reopened.relationships().get(relationship_id).unwrap().is_external());
            }
            other => panic!("unexpected target {other:?}"),
        }
        assert_eq!(links[0].tooltip(), Some("Read the docs"));
        assert_eq!(links[1].target(), &HyperlinkTarget::Anchor("intro".into()));
        assert_eq!(links[1].text(), "back to top");
        reopened.validate().unwrap();
    }
}
