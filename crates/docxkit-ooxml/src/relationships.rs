//! `.rels` part codec
//!
//! Relationship bookkeeping lives in the model ([`RelationshipTable`]); this
//! module only reads and writes the XML form, in table order.

use docxkit_model::{Relationship, RelationshipTable, TargetMode};
use log::warn;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;
use crate::xml::XmlWriter;

/// Package relationships namespace
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Part name of the `.rels` file belonging to `part` (`word/document.xml`)
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Serialize relationships
pub fn to_xml(relationships: &[Relationship]) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new();
    w.declaration()?;
    w.start("Relationships", &[("xmlns", RELATIONSHIPS_NS)])?;
    for rel in relationships {
        let mut attrs = vec![
            ("Id", rel.id.as_str()),
            ("Type", rel.rel_type.as_str()),
            ("Target", rel.target.as_str()),
        ];
        if let Some(mode) = rel.mode.as_attr() {
            attrs.push(("TargetMode", mode));
        }
        w.empty("Relationship", &attrs)?;
    }
    w.end("Relationships")?;
    Ok(w.into_bytes())
}

/// `_rels/.rels`: document, core and extended properties
pub fn package_relationships() -> Vec<Relationship> {
    let rel = |id: &str, rel_type: &str, target: &str| Relationship {
        id: id.to_string(),
        rel_type: rel_type.to_string(),
        target: target.to_string(),
        mode: TargetMode::Internal,
    };
    vec![
        rel("rId1", RelationshipTable::TYPE_OFFICE_DOCUMENT, "word/document.xml"),
        rel("rId2", RelationshipTable::TYPE_CORE_PROPERTIES, "docProps/core.xml"),
        rel("rId3", RelationshipTable::TYPE_EXTENDED_PROPERTIES, "docProps/app.xml"),
    ]
}

/// Parse relationships in document order
///
/// Entries without an `Id` or `Target` are skipped.
pub fn parse(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut relationships = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut mode = TargetMode::Internal;

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            b"Type" => rel_type = Some(value),
                            b"TargetMode" if value == "External" => mode = TargetMode::External,
                            _ => {}
                        }
                    }

                    match (id, target) {
                        (Some(id), Some(target)) => relationships.push(Relationship {
                            id,
                            rel_type: rel_type.unwrap_or_default(),
                            target,
                            mode,
                        }),
                        _ => warn!("skipping relationship without Id or Target"),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relationships() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
  <Relationship Type="broken"/>
</Relationships>"#;

        let rels = parse(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].target, "styles.xml");
        assert_eq!(rels[0].mode, TargetMode::Internal);
        assert_eq!(rels[1].target, "https://example.com/?a=1&b=2");
        assert!(rels[1].is_external());
    }

    #[test]
    fn test_to_xml_keeps_order_and_mode() {
        let rels = vec![
            Relationship {
                id: "rId7".into(),
                rel_type: RelationshipTable::TYPE_HYPERLINK.into(),
                target: "https://example.com/a&b".into(),
                mode: TargetMode::External,
            },
            Relationship {
                id: "rId2".into(),
                rel_type: RelationshipTable::TYPE_IMAGE.into(),
                target: "media/image1.png".into(),
                mode: TargetMode::Internal,
            },
        ];
        let xml = String::from_utf8(to_xml(&rels).unwrap()).unwrap();
        assert!(xml.contains(r#"Target="https://example.com/a&amp;b" TargetMode="External""#));
        assert!(xml.find("rId7").unwrap() < xml.find("rId2").unwrap());
        assert_eq!(parse(xml.as_bytes()).unwrap(), rels);
    }

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for("word/header1.xml"), "word/_rels/header1.xml.rels");
    }
}
